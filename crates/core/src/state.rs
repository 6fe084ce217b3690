use crate::params::ReadLimits;

use std::time::Duration;

use logtail_reader::{LogReader, LogResolver};
use tokio_util::sync::CancellationToken;

/// State shared by every read request.
#[derive(Clone, Debug)]
pub(crate) struct ReadContext<R>
where
    R: LogResolver,
{
    pub reader: LogReader<R>,
    pub limits: ReadLimits,
    pub read_timeout: Option<Duration>,
    pub shutdown_token: CancellationToken,
}

impl<R> ReadContext<R>
where
    R: LogResolver,
{
    /// A token for one request: cancelled on shutdown or once the read timeout
    /// elapses. Callers cancel it when the request goes away.
    pub fn request_token(&self) -> CancellationToken {
        let token = self.shutdown_token.child_token();

        if let Some(timeout) = self.read_timeout {
            let timer = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    () = tokio::time::sleep(timeout) => timer.cancel(),
                    () = timer.cancelled() => {}
                }
            });
        }

        token
    }
}
