use crate::cursor::{PageTracker, Pagination};
use crate::error::Error;
use crate::reader::{LogReader, ReadRequest};
use crate::resolver::LogResolver;

use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// An item of [`LogReader::read_stream`].
#[derive(Debug)]
pub enum LogEvent {
    /// A matching line.
    Log(String),

    /// Final event of a read that did not fail.
    Pagination(Pagination),

    /// Final event of a read that failed. Lines already emitted stay valid.
    Error(Error),
}

impl<R> LogReader<R>
where
    R: LogResolver,
{
    /// Emits up to `request.limit` matching lines preceding the cursor as soon
    /// as each one is found, followed by exactly one [`LogEvent::Pagination`],
    /// or by one [`LogEvent::Error`] if the file cannot be opened or read.
    ///
    /// Nothing is opened until the stream is first polled. `cancel` is checked
    /// before each candidate line; the candidate that observes it is not
    /// emitted. Dropping the stream releases the file.
    pub fn read_stream(
        &self,
        cancel: CancellationToken,
        request: ReadRequest,
    ) -> impl Stream<Item = LogEvent> + Send + use<R> {
        let reader = self.clone();

        async_stream::stream! {
            let mut scanner = match reader.open_scanner(&request).await {
                Ok(scanner) => scanner,
                Err(e) => {
                    yield LogEvent::Error(e);
                    return;
                }
            };
            let mut page = PageTracker::new(scanner.end(), request.limit);

            let pagination = loop {
                let line = match scanner.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break Pagination::exhausted(),
                    Err(e) => {
                        yield LogEvent::Error(e);
                        return;
                    }
                };

                if cancel.is_cancelled() {
                    debug!(file = %request.file, "stream read cancelled");
                    break page.interrupted();
                }

                yield LogEvent::Log(line.text);
                if page.accept(line.start) {
                    break page.interrupted();
                }
            };

            drop(scanner);
            yield LogEvent::Pagination(pagination);
        }
    }
}
