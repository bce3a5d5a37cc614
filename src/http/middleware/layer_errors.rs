//! JSON bodies for rejections produced by tower layers.
//!
//! The timeout and body limit layers answer with an empty or plain-text
//! body. Those responses are replaced with the matching [`ApiError`].

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::response::ApiError;

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

pub async fn json_layer_errors(response: Response) -> Response {
    if is_json(&response) {
        return response;
    }
    match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge.into_response(),
        StatusCode::REQUEST_TIMEOUT => ApiError::Timeout.into_response(),
        _ => response,
    }
}
