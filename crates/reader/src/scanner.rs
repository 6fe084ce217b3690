//! Backward, chunked scanning of newline-delimited files.

use crate::error::{Error, Result};

use std::io::SeekFrom;

use memchr::memmem;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tracing::trace;

/// Default number of bytes read from the file per window.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

const LF: u8 = b'\n';

/// A line found by [`LineScanner`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// Line content without its terminator, decoded lossily as UTF-8.
    pub text: String,

    /// Absolute offset of the first byte of the line.
    pub start: u64,
}

/// Yields the complete lines of `[0, cursor)` newest-first, skipping lines that
/// do not contain the keyword.
///
/// The file size is sampled once in [`LineScanner::open`]; bytes appended after
/// that are never observed. Only the current window is held in memory and no
/// window is read until [`LineScanner::next_line`] needs one, so abandoning the
/// scanner stops all further I/O.
///
/// An unterminated fragment at the end of the scanned range is a line still
/// being written and is never yielded. The fragment at offset 0 is always a
/// complete line once a terminator follows it.
///
/// The scanner owns `reader`. Pass `&mut handle` to keep ownership of the
/// handle with the caller.
pub struct LineScanner<R> {
    reader: R,
    finder: memmem::Finder<'static>,
    chunk_size: u64,
    end: u64,
    // The window is `buf[head..]`, holding the bytes from `window_start` on.
    // Fresh chunks are read in front of it; the buffer only grows by doubling.
    buf: Vec<u8>,
    head: usize,
    window_start: u64,
    // The first `unscanned` bytes of the window have not been searched for
    // terminators yet.
    unscanned: usize,
    // Exclusive end of the line being assembled.
    tail: u64,
    // Set once the terminator of the newest complete line has been passed.
    terminated: bool,
    done: bool,
}

impl<R> LineScanner<R>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    /// Prepares a scan of `[0, cursor)`, or of the whole file when `cursor` is
    /// `None`. A cursor past the end of the file is clamped to its size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCursor`] when `cursor` lies inside the file but
    /// does not follow a line feed, and [`Error::Io`] when the size or the
    /// cursor cannot be checked.
    pub async fn open(
        mut reader: R,
        keyword: &[u8],
        cursor: Option<u64>,
        chunk_size: usize,
    ) -> Result<Self> {
        let size = reader
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| Error::Io("error reading file size", e))?;
        let end = cursor.map_or(size, |cursor| cursor.min(size));

        if end > 0 && end < size {
            reader
                .seek(SeekFrom::Start(end - 1))
                .await
                .map_err(|e| Error::Io("error seeking file", e))?;
            let preceding = reader
                .read_u8()
                .await
                .map_err(|e| Error::Io("error reading file", e))?;
            if preceding != LF {
                return Err(Error::InvalidCursor { cursor: end, size });
            }
        }

        Ok(Self {
            reader,
            finder: memmem::Finder::new(keyword).into_owned(),
            chunk_size: chunk_size.max(1) as u64,
            end,
            buf: Vec::new(),
            head: 0,
            window_start: end,
            unscanned: 0,
            tail: end,
            terminated: false,
            done: false,
        })
    }

    /// Exclusive upper bound of the scan, fixed at open time.
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Returns the next matching line toward the start of the file, or `None`
    /// once offset 0 has been passed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when a window cannot be read, including when the
    /// file shrank below the size sampled at open time.
    pub async fn next_line(&mut self) -> Result<Option<Line>> {
        loop {
            if self.done {
                return Ok(None);
            }

            while let Some(pos) =
                memchr::memrchr(LF, &self.buf[self.head..self.head + self.unscanned])
            {
                self.unscanned = pos;
                let lf = self.window_start + pos as u64;

                if !self.terminated {
                    self.terminated = true;
                    self.tail = lf;
                    continue;
                }

                let line_end = std::mem::replace(&mut self.tail, lf);
                if let Some(line) = self.accept(lf + 1, line_end) {
                    return Ok(Some(line));
                }
            }
            self.unscanned = 0;

            if self.window_start == 0 {
                self.done = true;
                if self.terminated {
                    return Ok(self.accept(0, self.tail));
                }
                return Ok(None);
            }

            self.slide().await?;
        }
    }

    fn accept(&self, start: u64, end: u64) -> Option<Line> {
        let bytes = &self.buf[self.index(start)..self.index(end)];

        self.finder.find(bytes).map(|_| Line {
            text: String::from_utf8_lossy(bytes).into_owned(),
            start,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn index(&self, offset: u64) -> usize {
        // Offsets handed out are always inside the current window.
        self.head + (offset - self.window_start) as usize
    }

    // Reads the chunk preceding the window. Bytes of a line that is still
    // missing its start are carried over; anything before the first terminator
    // is dropped. Carried bytes are moved only when bytes after them are
    // dropped, so a long line is copied a bounded number of times.
    #[allow(clippy::cast_possible_truncation)]
    async fn slide(&mut self) -> Result<()> {
        let carried = if self.terminated {
            (self.tail - self.window_start) as usize
        } else {
            self.tail = self.window_start;
            0
        };

        let read_end = self.window_start;
        let read_start = read_end.saturating_sub(self.chunk_size);
        let fresh = (read_end - read_start) as usize;
        let needed = fresh + carried;

        let carried_range = self.head..self.head + carried;
        if self.buf.len() < needed {
            let mut buf = vec![0; needed.max(self.buf.len() * 2)];
            let len = buf.len();
            buf[len - carried..].copy_from_slice(&self.buf[carried_range]);
            self.buf = buf;
        } else if carried_range.end != self.buf.len() {
            let len = self.buf.len();
            self.buf.copy_within(carried_range, len - carried);
        }
        let head = self.buf.len() - needed;

        self.reader
            .seek(SeekFrom::Start(read_start))
            .await
            .map_err(|e| Error::Io("error seeking file", e))?;
        self.reader
            .read_exact(&mut self.buf[head..head + fresh])
            .await
            .map_err(|e| Error::Io("error reading file", e))?;

        trace!(read_start, fresh, carried, "read window");

        self.head = head;
        self.window_start = read_start;
        self.unscanned = fresh;

        Ok(())
    }
}
