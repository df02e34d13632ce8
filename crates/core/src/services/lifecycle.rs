//! Event lifecycle: derived status and the edit policy that hangs off it.
//!
//! Status is never stored. Every read derives it from the event's start/end
//! timestamps and an explicit `now`, so two reads with the same inputs always
//! agree and tests can pin any boundary with a fixed clock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use votehall_common::{AppError, AppResult};
use votehall_db::entities::event;

/// Where an event sits in its voting window.
///
/// `Waiting -> Open -> Closed` is monotonic in time. `Unknown` covers events
/// with neither timestamp set; they accept no ballots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Waiting,
    Open,
    Closed,
    Unknown,
}

impl EventStatus {
    /// Lowercase name used in messages and rendered pages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which event fields the current status still allows to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditableFields {
    pub title: bool,
    pub description: bool,
    pub start_time: bool,
    pub end_time: bool,
}

/// Derive the status of an event at `now`.
///
/// An absent start means the event is open-ended on that side; an absent end
/// means it never closes on its own. The event counts as `Closed` from the
/// exact end instant (`now >= end`).
#[must_use]
pub fn compute_status(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> EventStatus {
    match (start, end) {
        (None, None) => EventStatus::Unknown,
        (Some(start), Some(end)) => {
            if now < start {
                EventStatus::Waiting
            } else if now >= end {
                EventStatus::Closed
            } else {
                EventStatus::Open
            }
        }
        (Some(start), None) => {
            if now < start {
                EventStatus::Waiting
            } else {
                EventStatus::Open
            }
        }
        (None, Some(end)) => {
            if now >= end {
                EventStatus::Closed
            } else {
                EventStatus::Open
            }
        }
    }
}

/// Derive the status of a stored event row at `now`.
#[must_use]
pub fn event_status(event: &event::Model, now: DateTime<Utc>) -> EventStatus {
    compute_status(
        event.start_time.map(|t| t.with_timezone(&Utc)),
        event.end_time.map(|t| t.with_timezone(&Utc)),
        now,
    )
}

/// The field-editability table for each status.
///
/// Once voting has opened the start time is frozen; once the event has closed
/// only the description may still change (typo fixes in the archive). Events
/// without any schedule keep their text editable but cannot gain times here.
#[must_use]
pub const fn editable_fields(status: EventStatus) -> EditableFields {
    match status {
        EventStatus::Waiting => EditableFields {
            title: true,
            description: true,
            start_time: true,
            end_time: true,
        },
        EventStatus::Open => EditableFields {
            title: true,
            description: true,
            start_time: false,
            end_time: true,
        },
        EventStatus::Closed => EditableFields {
            title: false,
            description: true,
            start_time: false,
            end_time: false,
        },
        EventStatus::Unknown => EditableFields {
            title: true,
            description: true,
            start_time: false,
            end_time: false,
        },
    }
}

/// Check a proposed schedule change against the status-specific rules.
///
/// Callers coerce non-editable fields back to their original values first
/// (per [`editable_fields`]), so the proposed values here are the effective
/// ones. While `Waiting` the start may move anywhere except into the past;
/// while `Open` only the end may move, and the new end must stay after the
/// original start and strictly after `now`. `Closed` and `Unknown` edits
/// reach here fully coerced and have nothing left to check.
pub fn validate_edit(
    status: EventStatus,
    proposed_start: Option<DateTime<Utc>>,
    proposed_end: Option<DateTime<Utc>>,
    original_start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    match status {
        EventStatus::Waiting => {
            if let Some(start) = proposed_start
                && start < now
            {
                return Err(AppError::Validation(
                    "Start time cannot be in the past".to_string(),
                ));
            }
        }
        EventStatus::Open => {
            if let Some(end) = proposed_end {
                if end <= now {
                    return Err(AppError::Validation(
                        "End time must be in the future".to_string(),
                    ));
                }
                if let Some(start) = original_start
                    && end <= start
                {
                    return Err(AppError::Validation(
                        "End time must be after the start time".to_string(),
                    ));
                }
            }
        }
        EventStatus::Closed | EventStatus::Unknown => {}
    }

    if let (Some(start), Some(end)) = (proposed_start, proposed_end)
        && end <= start
    {
        return Err(AppError::Validation(
            "End time must be after the start time".to_string(),
        ));
    }

    Ok(())
}
