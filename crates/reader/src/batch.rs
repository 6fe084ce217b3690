use crate::cursor::{PageTracker, Pagination};
use crate::error::Result;
use crate::reader::{LogReader, ReadRequest};
use crate::resolver::LogResolver;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Lines collected by [`LogReader::read_batch`], newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatch {
    /// Whether lines may remain before `cursor`.
    pub has_more: bool,

    /// Matching lines, newest first.
    pub lines: Vec<String>,

    /// Start offset of the last entry of `lines`, present iff `has_more`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
}

impl LogBatch {
    /// The `{has_more, cursor}` part of the batch.
    #[must_use]
    pub const fn pagination(&self) -> Pagination {
        Pagination {
            has_more: self.has_more,
            cursor: self.cursor,
        }
    }
}

impl<R> LogReader<R>
where
    R: LogResolver,
{
    /// Collects up to `request.limit` matching lines preceding the cursor.
    ///
    /// `cancel` is checked before each candidate line; once it fires the lines
    /// gathered so far are returned with a cursor that resumes right after them.
    ///
    /// # Errors
    ///
    /// Fails as a whole when the file cannot be opened or read; no partial
    /// result is returned in that case.
    pub async fn read_batch(
        &self,
        cancel: &CancellationToken,
        request: &ReadRequest,
    ) -> Result<LogBatch> {
        let mut scanner = self.open_scanner(request).await?;
        let mut page = PageTracker::new(scanner.end(), request.limit);
        let mut lines = Vec::new();

        let pagination = loop {
            let Some(line) = scanner.next_line().await? else {
                break Pagination::exhausted();
            };

            if cancel.is_cancelled() {
                debug!(file = %request.file, delivered = lines.len(), "batch read cancelled");
                break page.interrupted();
            }

            lines.push(line.text);
            if page.accept(line.start) {
                break page.interrupted();
            }
        };

        Ok(LogBatch {
            has_more: pagination.has_more,
            lines,
            cursor: pagination.cursor,
        })
    }
}
