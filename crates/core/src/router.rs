use crate::handlers::{method_not_allowed_handler, not_found_handler, read_handler};
use crate::state::ReadContext;

use axum::Router;
use axum::http::Method;
use axum::routing::get;
use logtail_reader::LogResolver;
use tower_http::cors::{Any, CorsLayer};

/// Path of the read endpoint.
pub const READ_PATH: &str = "/log/read";

pub(crate) fn create_router<R>(ctx: ReadContext<R>) -> Router
where
    R: LogResolver,
{
    Router::new()
        .route(
            READ_PATH,
            get(read_handler::<R>).fallback(method_not_allowed_handler),
        )
        .fallback(not_found_handler)
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET])
                .allow_origin(Any),
        )
        .with_state(ctx)
}
