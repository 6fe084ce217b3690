//! Newest-first reads of append-only log files with keyword filtering and
//! resumable byte-offset pagination.
//!
//! A [`LineScanner`] walks a file backward in fixed-size windows. A
//! [`LogReader`] drives it either into a single [`LogBatch`] or into a stream
//! of [`LogEvent`]s; both report the same [`Pagination`] for the same request.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod batch;
mod cursor;
mod error;
mod reader;
mod resolver;
mod scanner;
mod stream;

pub use batch::LogBatch;
pub use cursor::Pagination;
pub use error::{Error, Result};
pub use reader::{LogReader, ReadRequest};
pub use resolver::{DirResolver, LogResolver, MemoryResolver};
pub use scanner::{DEFAULT_CHUNK_SIZE, Line, LineScanner};
pub use stream::LogEvent;
