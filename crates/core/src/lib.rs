//! HTTP transport for reverse log reads: the `GET /log/read` endpoint and the
//! service that mounts it on an [`HttpServer`].
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;
mod handlers;
mod params;
mod router;
mod state;

pub use error::{Error, Result};
pub use params::{ReadLimits, ReadMode, ReadParams, UnsupportedMode};
pub use router::READ_PATH;

use router::create_router;
use state::ReadContext;

use std::time::Duration;

use axum::Router;
use logtail_http::HttpServer;
use logtail_reader::{LogReader, LogResolver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

/// Options for creating a new core.
pub struct CoreOptions<HS, R>
where
    HS: HttpServer,
    R: LogResolver,
{
    /// The HTTP server the read endpoint is mounted on.
    pub http_server: HS,

    /// Reader used to serve every request.
    pub reader: LogReader<R>,

    /// Default and maximum line counts.
    pub limits: ReadLimits,

    /// Cancel reads still running after this long.
    pub read_timeout: Option<Duration>,
}

/// Serves log reads over HTTP.
pub struct Core<HS, R>
where
    HS: HttpServer,
    R: LogResolver,
{
    http_server: HS,
    reader: LogReader<R>,
    limits: ReadLimits,
    read_timeout: Option<Duration>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl<HS, R> Core<HS, R>
where
    HS: HttpServer,
    R: LogResolver,
{
    /// Create new core.
    pub fn new(
        CoreOptions {
            http_server,
            reader,
            limits,
            read_timeout,
        }: CoreOptions<HS, R>,
    ) -> Self {
        Self {
            http_server,
            reader,
            limits,
            read_timeout,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// The HTTP server this core mounts its router on.
    pub const fn http_server(&self) -> &HS {
        &self.http_server
    }

    /// Builds the router without serving it. Reads started through it are
    /// cancelled by [`Core::shutdown`].
    pub fn router(&self) -> Router {
        create_router(ReadContext {
            reader: self.reader.clone(),
            limits: self.limits,
            read_timeout: self.read_timeout,
            shutdown_token: self.shutdown_token.clone(),
        })
    }

    /// Start the core.
    ///
    /// The returned handle resolves once the core is shut down, or with an
    /// error if the HTTP server stops on its own.
    ///
    /// # Errors
    ///
    /// This function will return an error if the core has already been started or if the HTTP server fails to start.
    pub async fn start(&self) -> Result<JoinHandle<Result<()>>> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let http_handle = self
            .http_server
            .start(self.router())
            .await
            .map_err(|e| Error::HttpServer(e.to_string()))?;

        let shutdown_token = self.shutdown_token.clone();
        let handle = self.task_tracker.spawn(async move {
            tokio::select! {
                biased;

                () = shutdown_token.cancelled() => {
                    info!("shutdown command received");

                    Ok(())
                }
                _ = http_handle => {
                    error!("http server stopped unexpectedly");

                    Err(Error::HttpServerStopped)
                }
            }
        });

        self.task_tracker.close();

        Ok(handle)
    }

    /// Shutdown the core: cancel in-flight reads, then drain the HTTP server.
    pub async fn shutdown(&self) {
        info!("core shutting down...");

        self.shutdown_token.cancel();
        self.http_server.shutdown().await;

        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("core shutdown");
    }
}
