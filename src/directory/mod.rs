//! Charity directory subsystem.
//!
//! # Data Flow
//! ```text
//! GET /charities?category=..
//!     → filter.rs (CharityQuery → CharityFilter)
//!     → catalog.rs (Directory::search, catalog order)
//!     → JSON list + meta
//!
//! POST /charities
//!     → submission.rs (validate, receipt; nothing stored)
//! ```

pub mod catalog;
pub mod filter;
pub mod record;
pub mod submission;

pub use catalog::{CatalogError, Directory};
pub use filter::{CharityFilter, CharityQuery, FilterError};
pub use record::CharityRecord;
pub use submission::{CharitySubmission, SubmissionError, SubmissionReceipt, ValidSubmission};
