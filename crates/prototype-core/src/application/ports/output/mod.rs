//! Driven (output) ports - implemented by infrastructure.
//!
//! The engine needs exactly one thing from the outside world: a way to turn
//! timestamps into numbers and text and back. The `prototype-adapters` crate
//! provides alternative implementations.

use chrono::{DateTime, SecondsFormat};

use crate::domain::{BoxError, Time};

/// Port for timestamp conversions.
///
/// Implemented by:
/// - [`DefaultTimeCodec`] (Unix seconds, RFC3339)
/// - `prototype_adapters::time_codec::UnixMillisCodec`
/// - `prototype_adapters::time_codec::UnixNanosCodec`
/// - `prototype_adapters::time_codec::LayoutCodec` (chrono format strings)
/// - `prototype_adapters::time_codec::FnTimeCodec` (closures)
///
/// ## Design Notes
///
/// - Decoding is fallible; failures surface as `Callback` errors for
///   numbers and `StringParse` errors for text
/// - Encoding to an integer is total
#[cfg_attr(test, mockall::automock)]
pub trait TimeCodec: Send + Sync {
    /// Time to integer (`TimeToInt`).
    fn to_int(&self, t: &Time) -> i64;

    /// Integer to time (`IntToTime`).
    fn from_int(&self, n: i64) -> Result<Time, BoxError>;

    /// Time to text (`TimeToString`).
    fn format(&self, t: &Time) -> String;

    /// Text to time (`StringToTime`).
    fn parse(&self, s: &str) -> Result<Time, BoxError>;
}

/// Unix seconds and RFC3339 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTimeCodec;

impl TimeCodec for DefaultTimeCodec {
    fn to_int(&self, t: &Time) -> i64 {
        t.timestamp()
    }

    fn from_int(&self, n: i64) -> Result<Time, BoxError> {
        DateTime::from_timestamp(n, 0)
            .map(|t| t.fixed_offset())
            .ok_or_else(|| format!("timestamp {n} is out of range").into())
    }

    fn format(&self, t: &Time) -> String {
        t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn parse(&self, s: &str) -> Result<Time, BoxError> {
        Ok(DateTime::parse_from_rfc3339(s)?)
    }
}
