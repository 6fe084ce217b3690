//! Handler for `GET /log/read`.

use super::message;
use crate::params::{ReadMode, ReadParams};
use crate::state::ReadContext;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header::HeaderName;
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use logtail_reader::{Error, LogEvent, LogReader, LogResolver, ReadRequest};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

#[derive(Serialize)]
struct LineData {
    line: String,
}

#[derive(Serialize)]
struct ErrorData {
    msg: &'static str,
}

pub(crate) async fn read_handler<R>(
    State(ctx): State<ReadContext<R>>,
    uri: Uri,
    Query(params): Query<ReadParams>,
) -> Response
where
    R: LogResolver,
{
    let (mode, request) = match params.into_request(&ctx.limits) {
        Ok(resolved) => resolved,
        Err(e) => {
            debug!(%uri, "rejected read: {e}");
            return message(StatusCode::BAD_REQUEST, "Unsupported read mode.");
        }
    };

    let token = ctx.request_token();
    match mode {
        ReadMode::Batch => batch_response(&ctx.reader, token, &uri, &request).await,
        ReadMode::Stream => stream_response(&ctx.reader, token, uri, request),
    }
}

async fn batch_response<R>(
    reader: &LogReader<R>,
    token: CancellationToken,
    uri: &Uri,
    request: &ReadRequest,
) -> Response
where
    R: LogResolver,
{
    // Dropping the handler future (client gone) cancels the read.
    let _guard = token.clone().drop_guard();

    match reader.read_batch(&token, request).await {
        Ok(batch) => Json(batch).into_response(),
        Err(e) => {
            let (status, msg) = failure(&e, uri);
            message(status, msg)
        }
    }
}

fn stream_response<R>(
    reader: &LogReader<R>,
    token: CancellationToken,
    uri: Uri,
    request: ReadRequest,
) -> Response
where
    R: LogResolver,
{
    let guard = token.clone().drop_guard();
    let events = reader.read_stream(token, request);

    let stream = async_stream::stream! {
        let _guard = guard;

        for await event in events {
            yield encode(event, &uri);
        }
    };

    (
        [(X_ACCEL_BUFFERING, HeaderValue::from_static("no"))],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

fn encode(event: LogEvent, uri: &Uri) -> Result<Event, axum::Error> {
    match event {
        LogEvent::Log(line) => Event::default().event("log").json_data(LineData { line }),
        LogEvent::Pagination(pagination) => {
            Event::default().event("pagination").json_data(pagination)
        }
        LogEvent::Error(e) => {
            let (_, msg) = failure(&e, uri);
            Event::default().event("error").json_data(ErrorData { msg })
        }
    }
}

/// Status and client-facing message for a failed read.
fn failure(e: &Error, uri: &Uri) -> (StatusCode, &'static str) {
    match e {
        Error::NotFound(_) => (StatusCode::BAD_REQUEST, "Log file does not exist."),
        Error::InvalidCursor { .. } => (StatusCode::BAD_REQUEST, "Invalid cursor."),
        Error::Io(..) => {
            error!(%uri, "failed to read log: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.")
        }
    }
}
