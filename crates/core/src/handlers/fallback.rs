use super::message;

use axum::http::StatusCode;
use axum::response::Response;

pub(crate) async fn not_found_handler() -> Response {
    message(StatusCode::NOT_FOUND, "Page not found.")
}

pub(crate) async fn method_not_allowed_handler() -> Response {
    message(StatusCode::METHOD_NOT_ALLOWED, "Unsupported HTTP method.")
}
