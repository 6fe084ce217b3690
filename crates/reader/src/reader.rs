use crate::error::Result;
use crate::resolver::LogResolver;
use crate::scanner::{DEFAULT_CHUNK_SIZE, LineScanner};

use std::num::NonZeroUsize;

use tracing::debug;

/// Parameters of a single read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadRequest {
    /// Identifier handed to the [`LogResolver`].
    pub file: String,

    /// Only lines containing these bytes are returned. Empty matches every line.
    pub keyword: String,

    /// Exclusive upper bound of the read: the file size or a cursor returned by
    /// an earlier read. `None` starts at the end of the file.
    pub cursor: Option<u64>,

    /// Maximum number of lines to return.
    pub limit: NonZeroUsize,
}

/// Reads recent lines of log files newest-first, either collected into a
/// [`LogBatch`](crate::LogBatch) or emitted as a stream of
/// [`LogEvent`](crate::LogEvent)s.
#[derive(Clone, Debug)]
pub struct LogReader<R> {
    pub(crate) resolver: R,
    pub(crate) chunk_size: usize,
}

impl<R> LogReader<R>
where
    R: LogResolver,
{
    /// Creates a reader over the files of `resolver`.
    pub const fn new(resolver: R) -> Self {
        Self {
            resolver,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets how many bytes are read from disk per window. Zero is treated as
    /// one by [`LineScanner::open`].
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// The resolver files are opened through.
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    pub(crate) async fn open_scanner(
        &self,
        request: &ReadRequest,
    ) -> Result<LineScanner<R::Handle>> {
        debug!(
            file = %request.file,
            cursor = ?request.cursor,
            limit = request.limit.get(),
            "opening log file"
        );

        let handle = self.resolver.open(&request.file).await?;

        LineScanner::open(
            handle,
            request.keyword.as_bytes(),
            request.cursor,
            self.chunk_size,
        )
        .await
    }
}
