//! Query parameters of the read endpoint and their defaults.

use std::num::NonZeroUsize;
use std::str::FromStr;

use logtail_reader::ReadRequest;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_BATCH_LIMIT: NonZeroUsize = NonZeroUsize::new(20).unwrap();
const MAX_BATCH_LIMIT: NonZeroUsize = NonZeroUsize::new(100).unwrap();
const DEFAULT_STREAM_LIMIT: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// How the lines of a read are delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// One JSON document holding every line.
    #[default]
    Batch,

    /// Server-sent events, one per line.
    Stream,
}

/// The `mode` parameter named neither `batch` nor `stream`.
#[derive(Debug, Error)]
#[error("unsupported read mode: {0}")]
pub struct UnsupportedMode(pub String);

impl FromStr for ReadMode {
    type Err = UnsupportedMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("batch") {
            Ok(Self::Batch)
        } else if s.eq_ignore_ascii_case("stream") {
            Ok(Self::Stream)
        } else {
            Err(UnsupportedMode(s.to_string()))
        }
    }
}

/// Line limits applied when a request does not pick its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadLimits {
    /// Limit of a batch read without a `limit` parameter.
    pub batch_default: NonZeroUsize,

    /// Largest limit a batch read may ask for.
    pub batch_max: NonZeroUsize,

    /// Limit of a stream read without a `limit` parameter. Stream reads are not capped.
    pub stream_default: NonZeroUsize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            batch_default: DEFAULT_BATCH_LIMIT,
            batch_max: MAX_BATCH_LIMIT,
            stream_default: DEFAULT_STREAM_LIMIT,
        }
    }
}

/// Raw query string of `GET /log/read`.
///
/// Values are kept as strings so that malformed numbers fall back to their
/// defaults instead of rejecting the request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReadParams {
    /// Log file identifier.
    pub file: Option<String>,

    /// Substring every returned line must contain.
    pub keyword: Option<String>,

    /// Byte offset to resume before.
    pub cursor: Option<String>,

    /// Maximum number of lines.
    pub limit: Option<String>,

    /// `batch` or `stream`, case-insensitive.
    pub mode: Option<String>,
}

impl ReadParams {
    /// Resolves defaults and limits into a reader request.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedMode`] when `mode` is present but unknown.
    pub fn into_request(self, limits: &ReadLimits) -> Result<(ReadMode, ReadRequest), UnsupportedMode> {
        let mode = self
            .mode
            .as_deref()
            .map_or(Ok(ReadMode::Batch), str::parse)?;

        let requested = positive(self.limit.as_deref())
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .and_then(NonZeroUsize::new);
        let limit = match mode {
            ReadMode::Batch => requested
                .unwrap_or(limits.batch_default)
                .min(limits.batch_max),
            ReadMode::Stream => requested.unwrap_or(limits.stream_default),
        };

        let request = ReadRequest {
            file: self.file.unwrap_or_default(),
            keyword: self.keyword.unwrap_or_default(),
            cursor: positive(self.cursor.as_deref()),
            limit,
        };

        Ok((mode, request))
    }
}

/// Parses a strictly positive integer; anything else counts as absent.
fn positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ReadParams {
        let mut params = ReadParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "file" => params.file = value,
                "keyword" => params.keyword = value,
                "cursor" => params.cursor = value,
                "limit" => params.limit = value,
                "mode" => params.mode = value,
                _ => unreachable!(),
            }
        }
        params
    }

    fn resolve(pairs: &[(&str, &str)]) -> (ReadMode, ReadRequest) {
        params(pairs).into_request(&ReadLimits::default()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let (mode, request) = resolve(&[]);

        assert_eq!(mode, ReadMode::Batch);
        assert_eq!(request.file, "");
        assert_eq!(request.keyword, "");
        assert_eq!(request.cursor, None);
        assert_eq!(request.limit.get(), 20);

        let (mode, request) = resolve(&[("mode", "stream")]);
        assert_eq!(mode, ReadMode::Stream);
        assert_eq!(request.limit.get(), 100);
    }

    #[test]
    fn test_mode_is_case_insensitive() {
        assert_eq!(resolve(&[("mode", "STREAM")]).0, ReadMode::Stream);
        assert_eq!(resolve(&[("mode", "Batch")]).0, ReadMode::Batch);

        let result = params(&[("mode", "tail")]).into_request(&ReadLimits::default());
        assert!(matches!(result, Err(UnsupportedMode(mode)) if mode == "tail"));
    }

    #[test]
    fn test_batch_limit_is_capped() {
        assert_eq!(resolve(&[("limit", "500")]).1.limit.get(), 100);
        assert_eq!(resolve(&[("limit", "7")]).1.limit.get(), 7);
        assert_eq!(
            resolve(&[("limit", "500"), ("mode", "stream")]).1.limit.get(),
            500
        );
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        for value in ["0", "-3", "abc", "", "1.5"] {
            let (_, request) = resolve(&[("cursor", value), ("limit", value)]);
            assert_eq!(request.cursor, None, "{value:?}");
            assert_eq!(request.limit.get(), 20, "{value:?}");
        }

        assert_eq!(resolve(&[("cursor", " 42 ")]).1.cursor, Some(42));
    }

    #[test]
    fn test_custom_limits() {
        let limits = ReadLimits {
            batch_default: NonZeroUsize::new(50).unwrap(),
            batch_max: NonZeroUsize::new(10).unwrap(),
            stream_default: NonZeroUsize::new(3).unwrap(),
        };

        let (_, request) = ReadParams::default().into_request(&limits).unwrap();
        assert_eq!(request.limit.get(), 10);

        let (_, request) = params(&[("mode", "stream")]).into_request(&limits).unwrap();
        assert_eq!(request.limit.get(), 3);
    }
}
