//! Time source and canonical timezone handling.
//!
//! Every lifecycle or tally decision takes its notion of "now" from an
//! injected [`Clock`] rather than calling the ambient system time, and all
//! stored timestamps are UTC. Wall-clock strings cross into UTC exactly
//! once, through [`parse_local_datetime`] with the configured canonical
//! timezone.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{AppError, AppResult};

/// Accepted wall-clock input formats: HTML `datetime-local` and SQL-style.
const WALL_CLOCK_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a preset instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    /// Create a clock that always reports `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("Invalid timezone: {name}")))
}

/// Parse a wall-clock string in the given timezone into a UTC instant.
///
/// Malformed input is a validation error, never treated as an absent
/// timestamp.
pub fn parse_local_datetime(value: &str, tz: Tz) -> AppResult<DateTime<Utc>> {
    let trimmed = value.trim();
    let naive = WALL_CLOCK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| AppError::Validation(format!("Invalid datetime: {value}")))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // Repeated hour during a DST fall-back: take the earlier offset.
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(AppError::Validation(format!(
            "Datetime does not exist in timezone {tz}: {value}"
        ))),
    }
}

/// Format a UTC instant as a `datetime-local` string in the given timezone.
#[must_use]
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format("%Y-%m-%dT%H:%M")
        .to_string()
}
