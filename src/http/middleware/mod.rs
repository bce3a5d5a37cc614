pub mod access_log;
pub mod layer_errors;

pub use access_log::track_requests;
pub use layer_errors::json_layer_errors;
