//! Alternative [`TimeCodec`] implementations.
//!
//! The engine defaults to Unix seconds and RFC3339 text. These adapters
//! cover the other common encodings, plus closures for anything else.

use std::fmt;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use tracing::debug;

use prototype_core::application::{DefaultTimeCodec, TimeCodec};
use prototype_core::domain::{BoxError, Time};

use crate::error::{AdapterError, AdapterResult};

fn rfc3339(t: &Time) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_rfc3339(s: &str) -> Result<Time, BoxError> {
    Ok(DateTime::parse_from_rfc3339(s)?)
}

/// Unix milliseconds and RFC3339 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixMillisCodec;

impl TimeCodec for UnixMillisCodec {
    fn to_int(&self, t: &Time) -> i64 {
        t.timestamp_millis()
    }

    fn from_int(&self, n: i64) -> Result<Time, BoxError> {
        DateTime::from_timestamp_millis(n)
            .map(|t| t.fixed_offset())
            .ok_or_else(|| format!("{n}ms is out of range").into())
    }

    fn format(&self, t: &Time) -> String {
        rfc3339(t)
    }

    fn parse(&self, s: &str) -> Result<Time, BoxError> {
        parse_rfc3339(s)
    }
}

/// Unix nanoseconds and RFC3339 text.
///
/// Times outside the ±292-year nanosecond range saturate.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixNanosCodec;

impl TimeCodec for UnixNanosCodec {
    fn to_int(&self, t: &Time) -> i64 {
        t.timestamp_nanos_opt().unwrap_or(if t.timestamp() < 0 {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    fn from_int(&self, n: i64) -> Result<Time, BoxError> {
        Ok(DateTime::from_timestamp_nanos(n).fixed_offset())
    }

    fn format(&self, t: &Time) -> String {
        rfc3339(t)
    }

    fn parse(&self, s: &str) -> Result<Time, BoxError> {
        parse_rfc3339(s)
    }
}

/// Text in a chrono `strftime` layout; integers are Unix seconds.
///
/// Layouts without an offset parse as UTC, and date-only layouts parse as
/// midnight UTC.
#[derive(Debug, Clone)]
pub struct LayoutCodec {
    layout: String,
}

impl LayoutCodec {
    pub fn new(layout: impl Into<String>) -> AdapterResult<Self> {
        let layout = layout.into();
        if StrftimeItems::new(&layout).any(|item| matches!(item, Item::Error)) {
            return Err(AdapterError::InvalidLayout { layout });
        }
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }
}

impl TimeCodec for LayoutCodec {
    fn to_int(&self, t: &Time) -> i64 {
        DefaultTimeCodec.to_int(t)
    }

    fn from_int(&self, n: i64) -> Result<Time, BoxError> {
        DefaultTimeCodec.from_int(n)
    }

    fn format(&self, t: &Time) -> String {
        t.format_with_items(StrftimeItems::new(&self.layout)).to_string()
    }

    fn parse(&self, s: &str) -> Result<Time, BoxError> {
        let zoned = match DateTime::parse_from_str(s, &self.layout) {
            Ok(t) => return Ok(t),
            Err(e) => e,
        };
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, &self.layout) {
            return Ok(naive.and_utc().fixed_offset());
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, &self.layout) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight.and_utc().fixed_offset());
            }
        }
        Err(Box::new(zoned))
    }
}

type ToIntFn = Arc<dyn Fn(&Time) -> i64 + Send + Sync>;
type FromIntFn = Arc<dyn Fn(i64) -> Result<Time, BoxError> + Send + Sync>;
type FormatFn = Arc<dyn Fn(&Time) -> String + Send + Sync>;
type ParseFn = Arc<dyn Fn(&str) -> Result<Time, BoxError> + Send + Sync>;

/// A codec assembled from four closures.
#[derive(Clone)]
pub struct FnTimeCodec {
    to_int: ToIntFn,
    from_int: FromIntFn,
    format: FormatFn,
    parse: ParseFn,
}

impl FnTimeCodec {
    pub fn new<A, B, C, D>(to_int: A, from_int: B, format: C, parse: D) -> Self
    where
        A: Fn(&Time) -> i64 + Send + Sync + 'static,
        B: Fn(i64) -> Result<Time, BoxError> + Send + Sync + 'static,
        C: Fn(&Time) -> String + Send + Sync + 'static,
        D: Fn(&str) -> Result<Time, BoxError> + Send + Sync + 'static,
    {
        Self {
            to_int: Arc::new(to_int),
            from_int: Arc::new(from_int),
            format: Arc::new(format),
            parse: Arc::new(parse),
        }
    }
}

impl fmt::Debug for FnTimeCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTimeCodec").finish_non_exhaustive()
    }
}

impl TimeCodec for FnTimeCodec {
    fn to_int(&self, t: &Time) -> i64 {
        (self.to_int)(t)
    }

    fn from_int(&self, n: i64) -> Result<Time, BoxError> {
        (self.from_int)(n)
    }

    fn format(&self, t: &Time) -> String {
        (self.format)(t)
    }

    fn parse(&self, s: &str) -> Result<Time, BoxError> {
        (self.parse)(s)
    }
}

/// The codec for a `time_format` setting: `rfc3339`, `unix`,
/// `unix-millis`, `unix-nanos`, or a chrono layout.
pub fn codec_by_name(name: &str) -> AdapterResult<Arc<dyn TimeCodec>> {
    let codec: Arc<dyn TimeCodec> = match name.trim().to_ascii_lowercase().as_str() {
        "" | "rfc3339" | "unix" => Arc::new(DefaultTimeCodec),
        "unix-millis" => Arc::new(UnixMillisCodec),
        "unix-nanos" => Arc::new(UnixNanosCodec),
        _ => Arc::new(LayoutCodec::new(name)?),
    };
    debug!(time_format = name, "time codec selected");
    Ok(codec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Time {
        DateTime::parse_from_rfc3339("2024-02-29T12:30:45.5+02:00").unwrap()
    }

    #[test]
    fn millis_and_nanos() {
        let t = sample();
        assert_eq!(UnixMillisCodec.to_int(&t), 1_709_202_645_500);
        assert_eq!(UnixMillisCodec.from_int(1_709_202_645_500).unwrap(), t);
        assert_eq!(UnixNanosCodec.to_int(&t), 1_709_202_645_500_000_000);
        assert_eq!(UnixNanosCodec.from_int(1_709_202_645_500_000_000).unwrap(), t);
        assert!(UnixMillisCodec.from_int(i64::MAX).is_err());
    }

    #[test]
    fn nanos_saturate_out_of_range() {
        let far = DateTime::parse_from_rfc3339("3000-01-01T00:00:00Z").unwrap();
        assert_eq!(UnixNanosCodec.to_int(&far), i64::MAX);
    }

    #[test]
    fn layout_formats_and_parses() {
        let codec = LayoutCodec::new("%Y-%m-%d %H:%M:%S").unwrap();
        let t = sample();
        assert_eq!(codec.format(&t), "2024-02-29 12:30:45");
        let parsed = codec.parse("2024-02-29 10:30:45").unwrap();
        assert_eq!(parsed.timestamp(), 1_709_202_645);

        let dates = LayoutCodec::new("%d/%m/%Y").unwrap();
        assert_eq!(dates.parse("01/01/1970").unwrap().timestamp(), 0);
        assert!(dates.parse("tomorrow").is_err());
    }

    #[test]
    fn layout_rejects_bad_specifiers() {
        assert!(matches!(
            LayoutCodec::new("%Y-%"),
            Err(AdapterError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn closures_drive_the_codec() {
        let codec = FnTimeCodec::new(
            |_| 7,
            |_| Err("no".into()),
            |_| "t".to_string(),
            |_| Ok(prototype_core::domain::epoch()),
        );
        assert_eq!(codec.to_int(&sample()), 7);
        assert!(codec.from_int(0).is_err());
        assert_eq!(codec.format(&sample()), "t");
        assert_eq!(codec.parse("x").unwrap(), prototype_core::domain::epoch());
    }

    #[test]
    fn names_resolve() {
        let t = sample();
        assert_eq!(codec_by_name("unix-millis").unwrap().to_int(&t), 1_709_202_645_500);
        assert_eq!(codec_by_name("RFC3339").unwrap().to_int(&t), 1_709_202_645);
        assert_eq!(codec_by_name("%Y").unwrap().format(&t), "2024");
        assert!(codec_by_name("%").is_err());
    }
}
