//! Capture timestamps and the clock that hands them out.
//!
//! A timestamp is also the item's on-disk sort key, so it is kept at
//! microsecond precision and rendered with fixed-width fields:
//! `YYYYMMDD_HHMMSS_ffffff`. Lexical order of the rendering equals
//! chronological order.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// Local wall-clock time of a capture, truncated to microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureTimestamp(NaiveDateTime);

impl CaptureTimestamp {
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let micros = (dt.nanosecond() / 1_000).min(999_999);
        // with_nanosecond only fails above 1_999_999_999
        Self(dt.with_nanosecond(micros * 1_000).unwrap_or(dt))
    }

    /// Fixed-width key, e.g. `20260114_093015_004217`.
    pub fn to_key(&self) -> String {
        self.0.format("%Y%m%d_%H%M%S_%6f").to_string()
    }

    /// Inverse of [`to_key`](Self::to_key). Rejects anything that is not
    /// exactly 8+6+6 digits or does not name a real date and time.
    pub fn parse_key(key: &str) -> Option<Self> {
        let bytes = key.as_bytes();
        if bytes.len() != 22 || bytes[8] != b'_' || bytes[15] != b'_' {
            return None;
        }
        let digits_ok = bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 8 || i == 15 || b.is_ascii_digit());
        if !digits_ok {
            return None;
        }

        let field = |from: usize, to: usize| key[from..to].parse::<u32>().ok();
        let date = NaiveDate::from_ymd_opt(field(0, 4)? as i32, field(4, 6)?, field(6, 8)?)?;
        let time = NaiveTime::from_hms_micro_opt(
            field(9, 11)?,
            field(11, 13)?,
            field(13, 15)?,
            field(16, 22)?,
        )?;
        Some(Self(NaiveDateTime::new(date, time)))
    }

    fn next_micro(self) -> Self {
        Self(self.0 + Duration::microseconds(1))
    }
}

impl fmt::Display for CaptureTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S%.6f"))
    }
}

/// Issues strictly increasing timestamps.
///
/// If the wall clock has not moved past the last issued value (same
/// microsecond, or a backwards jump), the previous value plus one
/// microsecond is issued instead.
pub(crate) struct CaptureClock {
    last: Option<CaptureTimestamp>,
    source: fn() -> CaptureTimestamp,
}

impl CaptureClock {
    pub(crate) fn new() -> Self {
        Self::with_source(CaptureTimestamp::now)
    }

    pub(crate) fn with_source(source: fn() -> CaptureTimestamp) -> Self {
        Self { last: None, source }
    }

    /// Makes every later timestamp sort after `seen`.
    pub(crate) fn observe(&mut self, seen: CaptureTimestamp) {
        if self.last.map_or(true, |last| seen > last) {
            self.last = Some(seen);
        }
    }

    pub(crate) fn next(&mut self) -> CaptureTimestamp {
        let now = (self.source)();
        let ts = match self.last {
            Some(last) if now <= last => last.next_micro(),
            _ => now,
        };
        self.last = Some(ts);
        ts
    }
}
