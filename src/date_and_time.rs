//! Time zone handling and the generation window. All instants handed
//! around outside this module are epoch milliseconds (`i64`), the
//! representation used in the generated tables.

use std::fmt::Display;

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::MockDataError;

pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

/// Parse an IANA time zone id like "Europe/Zurich".
pub fn parse_timezone(s: &str) -> Result<Tz, MockDataError> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| MockDataError::InvalidTimezone(s.into()))
}

/// Map a local wall-clock time to an instant in `tz`. Ambiguous
/// times (clocks turned back) resolve to the earlier instant. Times
/// that fall into a gap (clocks turned forward) are moved later by
/// the length of the gap, i.e. interpreted with the offset in effect
/// before the transition. Returns None only if out of range.
pub fn resolve_local(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earlier, _later) => Some(earlier),
        LocalResult::None => {
            // Gaps are at most a few hours; half a day back is safely
            // before the transition.
            let before = naive.checked_sub_signed(Duration::hours(12))?;
            let offset = tz.offset_from_utc_datetime(&before).fix();
            let utc = naive.checked_sub_signed(Duration::seconds(
                offset.local_minus_utc().into(),
            ))?;
            Some(tz.from_utc_datetime(&utc))
        }
    }
}

/// Midnight of the calendar day containing `t`, as wall-clock time in
/// `t`'s time zone. Not resolved to an instant, since midnight may
/// fall into a DST gap.
pub fn local_midnight(t: &DateTime<Tz>) -> NaiveDateTime {
    t.date_naive().and_time(NaiveTime::MIN)
}

pub fn millis_to_datetime(tz: &Tz, millis: i64) -> Option<DateTime<Tz>> {
    match tz.timestamp_millis_opt(millis) {
        LocalResult::Single(t) => Some(t),
        _ => None,
    }
}

pub const DEFAULT_LOOKBACK_DAYS: u32 = 28;

/// The half-open interval `[start, end)` that series are generated
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, MockDataError> {
        if end < start {
            return Err(MockDataError::malformed(
                "window",
                format!(
                    "end {} is before start {}",
                    end.to_rfc3339(),
                    start.to_rfc3339()
                ),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn from_millis(start: i64, end: i64) -> Result<Self, MockDataError> {
        let to_utc = |millis: i64| {
            millis_to_datetime(&Tz::UTC, millis)
                .map(|t| t.with_timezone(&Utc))
                .ok_or_else(|| {
                    MockDataError::malformed("window", format!("time out of range: {millis}"))
                })
        };
        Self::new(to_utc(start)?, to_utc(end)?)
    }

    /// The `days` days before `now`, as used when no explicit window
    /// is given.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Result<Self, MockDataError> {
        let start = now
            .checked_sub_signed(Duration::days(days.into()))
            .ok_or_else(|| {
                MockDataError::malformed("lookback_days", format!("out of range: {days}"))
            })?;
        Self::new(start, now)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    pub fn contains_millis(&self, millis: i64) -> bool {
        self.start_millis() <= millis && millis < self.end_millis()
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { start, end } = self;
        write!(f, "{} - {}", start.to_rfc3339(), end.to_rfc3339())
    }
}
