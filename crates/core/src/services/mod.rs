//! Business logic services.

#![allow(missing_docs)]

pub mod ballot;
pub mod event;
pub mod lifecycle;
pub mod option_set;
pub mod tally;

pub use ballot::{BallotService, CastOutcome, RecentBallot, RetractOutcome, VotingStats};
pub use event::{CreateEventInput, EventDetail, EventService, EventSummary, UpdateEventInput};
pub use lifecycle::{
    EditableFields, EventStatus, compute_status, editable_fields, event_status, validate_edit,
};
pub use option_set::{ReconcilePlan, SubmittedOption};
pub use tally::{EventResults, TallyRow, TallyService, enrich, total_votes, winners};
