//! CLI binary serving reverse, paginated reads of log files over HTTP.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

use std::net::{Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use logtail_core::{Core, CoreOptions, ReadLimits};
use logtail_http::InsecureHttpServer;
use logtail_reader::{DEFAULT_CHUNK_SIZE, DirResolver, LogReader};
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};

const CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap();

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Core error
    #[error(transparent)]
    Core(#[from] logtail_core::Error),

    /// Signal handler setup error
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8080, env = "LOGTAIL_PORT")]
    port: u16,

    /// Directory holding the served log files
    #[arg(long, default_value = "/var/log", env = "LOGTAIL_LOG_DIR")]
    log_dir: PathBuf,

    /// Bytes read from disk per window
    #[arg(long, default_value_t = CHUNK_SIZE, env = "LOGTAIL_CHUNK_SIZE")]
    chunk_size: NonZeroUsize,

    /// Lines returned by a batch read without a limit
    #[arg(long, default_value_t = ReadLimits::default().batch_default, env = "LOGTAIL_BATCH_DEFAULT_LIMIT")]
    batch_default_limit: NonZeroUsize,

    /// Largest limit a batch read may request
    #[arg(long, default_value_t = ReadLimits::default().batch_max, env = "LOGTAIL_BATCH_MAX_LIMIT")]
    batch_max_limit: NonZeroUsize,

    /// Lines sent by a stream read without a limit
    #[arg(long, default_value_t = ReadLimits::default().stream_default, env = "LOGTAIL_STREAM_DEFAULT_LIMIT")]
    stream_default_limit: NonZeroUsize,

    /// Cancel reads still running after this many seconds
    #[arg(long, env = "LOGTAIL_READ_TIMEOUT_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    read_timeout_secs: Option<u64>,

    /// Maximum level of emitted logs
    #[arg(long, default_value_t = Level::INFO, env = "LOGTAIL_LOG_LEVEL")]
    log_level: Level,
}

async fn wait_for_signal() -> Result<(), Error> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).map_err(Error::Signal)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(Error::Signal)?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        // Fall back to just ctrl-c on non-unix platforms
        tokio::signal::ctrl_c().await.map_err(Error::Signal)?;
        info!("Received interrupt signal");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let listen_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port));
    info!(%listen_addr, log_dir = %args.log_dir.display(), "starting logtail");

    let core = Core::new(CoreOptions {
        http_server: InsecureHttpServer::new(listen_addr),
        reader: LogReader::new(DirResolver::new(args.log_dir))
            .with_chunk_size(args.chunk_size.get()),
        limits: ReadLimits {
            batch_default: args.batch_default_limit,
            batch_max: args.batch_max_limit,
            stream_default: args.stream_default_limit,
        },
        read_timeout: args.read_timeout_secs.map(Duration::from_secs),
    });

    // Create shared shutdown token
    let shutdown_token = CancellationToken::new();

    // Set up signal handlers
    let signal_shutdown_token = shutdown_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            error!("{e}");
        }

        info!("Shutting down");
        signal_shutdown_token.cancel();
    });

    let mut handle = core.start().await?;

    let result = tokio::select! {
        () = shutdown_token.cancelled() => Ok(()),
        result = &mut handle => match result {
            Ok(result) => result.map_err(Error::Core),
            Err(e) => {
                error!("core task failed: {e}");
                Ok(())
            }
        },
    };

    core.shutdown().await;

    result
}
