//! Granularity periods like "1hour" or "15 minutes", and the
//! timestamps of the steps of a series.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Days, Duration, Months, NaiveDateTime};
use chrono_tz::Tz;

use crate::{date_and_time::resolve_local, error::MockDataError};

pub const DEFAULT_GRANULARITY: &str = "1hour";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeriodUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl PeriodUnit {
    /// Matched by prefix, case-insensitively, so that "h", "hour" and
    /// "hours" all work. Order of the checks matters: "ms" and "mo"
    /// before plain "m".
    fn from_unit_str(s: &str) -> Option<Self> {
        let s = s.to_ascii_lowercase();
        let unit = if s.is_empty() {
            return None;
        } else if s == "ms" || s.starts_with("milli") {
            PeriodUnit::Milliseconds
        } else if s.starts_with("mo") {
            PeriodUnit::Months
        } else if s == "m" || s.starts_with("mi") {
            PeriodUnit::Minutes
        } else if s.starts_with('s') {
            PeriodUnit::Seconds
        } else if s.starts_with('h') {
            PeriodUnit::Hours
        } else if s.starts_with('d') {
            PeriodUnit::Days
        } else if s.starts_with('w') {
            PeriodUnit::Weeks
        } else if s.starts_with('y') {
            PeriodUnit::Years
        } else {
            return None;
        };
        Some(unit)
    }

    fn name(self) -> &'static str {
        match self {
            PeriodUnit::Milliseconds => "milliseconds",
            PeriodUnit::Seconds => "seconds",
            PeriodUnit::Minutes => "minutes",
            PeriodUnit::Hours => "hours",
            PeriodUnit::Days => "days",
            PeriodUnit::Weeks => "weeks",
            PeriodUnit::Months => "months",
            PeriodUnit::Years => "years",
        }
    }

    /// Sub-day units are exact durations, the others follow the
    /// calendar of the time zone (a day across a DST switch is 23 or
    /// 25 hours long).
    pub fn is_calendar_based(self) -> bool {
        match self {
            PeriodUnit::Milliseconds
            | PeriodUnit::Seconds
            | PeriodUnit::Minutes
            | PeriodUnit::Hours => false,
            PeriodUnit::Days | PeriodUnit::Weeks | PeriodUnit::Months | PeriodUnit::Years => true,
        }
    }
}

/// A positive number of some unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    count: u32,
    unit: PeriodUnit,
}

impl Period {
    pub fn new(count: u32, unit: PeriodUnit) -> Option<Self> {
        if count == 0 {
            None
        } else {
            Some(Self { count, unit })
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn unit(&self) -> PeriodUnit {
        self.unit
    }

    /// The `n`-th step from the local wall-clock time `origin` in
    /// `tz`. Sub-day units step by exact durations from the resolved
    /// origin. Calendar units add `n` periods to the wall-clock time
    /// and resolve each step on its own, so a DST gap at the origin
    /// does not shift the later steps. Returns None when out of the
    /// representable range.
    pub fn nth_step(&self, origin: &NaiveDateTime, tz: &Tz, n: u64) -> Option<DateTime<Tz>> {
        let Self { count, unit } = *self;
        let steps = u64::from(count).checked_mul(n)?;
        if unit.is_calendar_based() {
            let local = match unit {
                PeriodUnit::Days => origin.checked_add_days(Days::new(steps)),
                PeriodUnit::Weeks => origin.checked_add_days(Days::new(steps.checked_mul(7)?)),
                PeriodUnit::Months => {
                    origin.checked_add_months(Months::new(u32::try_from(steps).ok()?))
                }
                PeriodUnit::Years => origin.checked_add_months(Months::new(
                    u32::try_from(steps.checked_mul(12)?).ok()?,
                )),
                _ => unreachable!("sub-day units are not calendar based"),
            }?;
            resolve_local(tz, &local)
        } else {
            let unit_millis: i64 = match unit {
                PeriodUnit::Milliseconds => 1,
                PeriodUnit::Seconds => 1000,
                PeriodUnit::Minutes => 60 * 1000,
                PeriodUnit::Hours => 3600 * 1000,
                _ => unreachable!("calendar units are handled above"),
            };
            let millis = i64::try_from(steps).ok()?.checked_mul(unit_millis)?;
            let duration = Duration::milliseconds(millis);
            resolve_local(tz, origin)?.checked_add_signed(duration)
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { count, unit } = self;
        write!(f, "{count} {}", unit.name())
    }
}

impl FromStr for Period {
    type Err = MockDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| MockDataError::InvalidPeriod {
            period: s.into(),
            reason: reason.into(),
        };
        let trimmed = s.trim();
        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (count, unit) = trimmed.split_at(digits_end);
        if count.is_empty() {
            return Err(err("expecting a number followed by a unit, e.g. \"1hour\""));
        }
        let count: u32 = count.parse().map_err(|_| err("count out of range"))?;
        let unit = unit.trim();
        let unit = PeriodUnit::from_unit_str(unit)
            .ok_or_else(|| err(&format!("unknown unit {unit:?}")))?;
        Period::new(count, unit).ok_or_else(|| err("count must be positive"))
    }
}
