mod fallback;
mod read;

pub(crate) use fallback::{method_not_allowed_handler, not_found_handler};
pub(crate) use read::read_handler;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// A `{"msg": ...}` response, the body of every non-success answer.
fn message(status: StatusCode, msg: &'static str) -> Response {
    (status, Json(json!({ "msg": msg }))).into_response()
}
