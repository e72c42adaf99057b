//! Civil calendar anchored to one fixed timezone
//!
//! Every "today" and "yesterday" in the engine comes from a [`TimeAnchor`].
//! The anchor reads an injected [`Clock`] and projects the instant into a
//! fixed UTC offset (IST, +05:30, unless configured otherwise), so the day
//! boundary never depends on the server's local timezone.

use crate::DomainError;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// Canonical serialization format for civil dates
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar day with no time component
///
/// Serializes as `YYYY-MM-DD`. Ordering is chronological and matches the
/// lexicographic order of the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CivilDate(NaiveDate);

impl CivilDate {
    /// Build a date from year, month and day
    ///
    /// # Examples
    ///
    /// ```
    /// use kindle_domain::CivilDate;
    ///
    /// let d = CivilDate::from_ymd(2024, 1, 6).unwrap();
    /// assert_eq!(d.to_string(), "2024-01-06");
    /// ```
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DomainError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidDate(format!("{:04}-{:02}-{:02}", year, month, day)))
    }

    /// Wrap an existing `NaiveDate`
    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The underlying `NaiveDate`
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day
    pub fn pred(&self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// The next calendar day
    pub fn succ(&self) -> Self {
        Self(self.0.succ_opt().unwrap_or(self.0))
    }

    /// Day of week as 1 (Monday) through 7 (Sunday)
    pub fn weekday_number(&self) -> u8 {
        self.0.weekday().number_from_monday() as u8
    }

    /// Signed number of days from `other` to `self`
    pub fn days_since(&self, other: CivilDate) -> i64 {
        (self.0 - other.0).num_days()
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for CivilDate {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Strict shape check: chrono alone accepts unpadded fields
        if trimmed.len() != 10 {
            return Err(DomainError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(Self)
            .map_err(|_| DomainError::InvalidDate(s.to_string()))
    }
}

impl Serialize for CivilDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CivilDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    /// The current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Used by tests and by tooling that replays a specific day.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Create a clock at noon of `day` in the given offset
    pub fn at_civil_noon(day: CivilDate, offset_minutes: i32) -> Self {
        let local_noon = day.as_naive().and_hms_opt(12, 0, 0).unwrap_or_default();
        let utc = local_noon - chrono::Duration::minutes(i64::from(offset_minutes));
        Self::new(DateTime::from_naive_utc_and_offset(utc, Utc))
    }

    /// Move the clock to `now`
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Advance the clock by whole days
    pub fn advance_days(&self, days: i64) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += chrono::Duration::days(days);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Produces canonical civil dates in one fixed timezone
#[derive(Clone)]
pub struct TimeAnchor {
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl TimeAnchor {
    /// India Standard Time, +05:30
    pub const IST_OFFSET_MINUTES: i32 = 330;

    /// Create an anchor for a fixed offset east of UTC, in minutes
    pub fn new(offset_minutes: i32, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        if !(-14 * 60..=14 * 60).contains(&offset_minutes) {
            return Err(DomainError::InvalidOffset(offset_minutes));
        }
        let offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or(DomainError::InvalidOffset(offset_minutes))?;
        Ok(Self { offset, clock })
    }

    /// Anchor in IST reading the given clock
    pub fn ist(clock: Arc<dyn Clock>) -> Self {
        Self {
            offset: FixedOffset::east_opt(Self::IST_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
            clock,
        }
    }

    /// The current instant
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today's civil date
    pub fn today(&self) -> CivilDate {
        self.civil_date_of(self.clock.now())
    }

    /// The civil day before `day`
    pub fn yesterday(&self, day: CivilDate) -> CivilDate {
        day.pred()
    }

    /// Project an instant into the anchored calendar
    pub fn civil_date_of(&self, instant: DateTime<Utc>) -> CivilDate {
        CivilDate(instant.with_timezone(&self.offset).date_naive())
    }

    /// The configured offset
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl fmt::Debug for TimeAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeAnchor")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
