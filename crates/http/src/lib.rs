//! HTTP server abstraction and a plain-HTTP implementation for serving routers.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;
mod insecure;

pub use error::Error;
pub use insecure::InsecureHttpServer;

use std::error::Error as StdError;
use std::fmt::Debug;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Router;
use tokio::task::JoinHandle;

/// Marker trait for `HttpServer` errors
pub trait HttpServerError: Debug + StdError + Send + Sync + 'static {}

/// A server that can serve a single axum router until shut down.
#[async_trait]
pub trait HttpServer: Send + Sync + 'static {
    /// The error type for this server.
    type Error: HttpServerError;

    /// Binds the listener and starts serving `router` in the background.
    async fn start(&self, router: Router) -> Result<JoinHandle<()>, Self::Error>;

    /// Stops accepting connections and waits for in-flight ones to drain.
    async fn shutdown(&self);

    /// The bound address, once started.
    fn local_addr(&self) -> Option<SocketAddr>;
}
