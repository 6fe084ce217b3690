//! Pagination cursors shared by the batch and streaming readers.

use std::num::NonZeroUsize;

use serde::Serialize;

/// Where the next page of a read resumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Whether lines may remain before `cursor`.
    pub has_more: bool,

    /// Start offset of the oldest line delivered. Pass it back as the next
    /// request's cursor to continue without gaps or repeats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
}

impl Pagination {
    /// The scan reached the start of the file.
    #[must_use]
    pub const fn exhausted() -> Self {
        Self {
            has_more: false,
            cursor: None,
        }
    }

    /// The scan stopped with `[0, offset)` left unread.
    #[must_use]
    pub const fn resume_at(offset: u64) -> Self {
        if offset > 0 {
            Self {
                has_more: true,
                cursor: Some(offset),
            }
        } else {
            Self::exhausted()
        }
    }
}

/// Counts accepted lines against a limit and remembers where to resume.
#[derive(Debug)]
pub(crate) struct PageTracker {
    limit: NonZeroUsize,
    accepted: usize,
    resume: u64,
}

impl PageTracker {
    /// `end` is the scan boundary, used as the resume point until a line has
    /// been accepted.
    pub(crate) const fn new(end: u64, limit: NonZeroUsize) -> Self {
        Self {
            limit,
            accepted: 0,
            resume: end,
        }
    }

    /// Records a delivered line. Returns `true` once the limit is reached.
    pub(crate) const fn accept(&mut self, start: u64) -> bool {
        self.accepted += 1;
        self.resume = start;
        self.accepted >= self.limit.get()
    }

    /// Pagination for a read that stopped before reaching offset 0.
    pub(crate) const fn interrupted(&self) -> Pagination {
        Pagination::resume_at(self.resume)
    }
}
