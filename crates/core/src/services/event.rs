//! Event service: creation, status-gated editing, deletion, and listings.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;
use votehall_common::{AppError, AppResult, Clock, IdGenerator};
use votehall_db::{
    entities::{event, event_option},
    repositories::{EventOptionRepository, EventRepository, UserRepository},
};

use crate::services::lifecycle::{self, EventStatus};
use crate::services::option_set::{self, ReconcilePlan, SubmittedOption};

/// Number of upcoming events suggested beside an event page.
const RECOMMENDATION_LIMIT: u64 = 3;

/// Input for creating an event. Both schedule bounds are required here;
/// events without a schedule cannot come into existence through this path.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    #[validate(length(min = 1, max = 45))]
    pub title: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Initial option texts, at least two after trimming.
    pub options: Vec<String>,
}

/// Input for editing an event. `None` fields stay unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    pub event_id: String,
    #[validate(length(min = 1, max = 45))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<Option<String>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// The full option list to reconcile against the stored set.
    pub options: Option<Vec<SubmittedOption>>,
}

/// An event row joined with its creator's username and derived status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub event: event::Model,
    pub creator_username: Option<String>,
    pub status: EventStatus,
}

/// Full event page data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    pub event: event::Model,
    pub creator_username: Option<String>,
    pub options: Vec<event_option::Model>,
    pub status: EventStatus,
}

/// Event service for business logic.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    option_repo: EventOptionRepository,
    user_repo: UserRepository,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
    max_future_years: i32,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(
        event_repo: EventRepository,
        option_repo: EventOptionRepository,
        user_repo: UserRepository,
        clock: Arc<dyn Clock>,
        max_future_years: i32,
    ) -> Self {
        Self {
            event_repo,
            option_repo,
            user_repo,
            clock,
            id_gen: IdGenerator::new(),
            max_future_years,
        }
    }

    /// Create an event together with its initial option set.
    pub async fn create_event(
        &self,
        user_id: &str,
        input: CreateEventInput,
    ) -> AppResult<event::Model> {
        input.validate()?;

        let now = self.clock.now();

        if input.end_time <= input.start_time {
            return Err(AppError::Validation(
                "End time must be after the start time".to_string(),
            ));
        }
        self.check_future_window(input.start_time, now)?;

        let texts = option_set::validate(&input.options)?;

        let event_id = self.id_gen.generate();
        let event = event::ActiveModel {
            id: Set(event_id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            start_time: Set(Some(input.start_time.into())),
            end_time: Set(Some(input.end_time.into())),
            created_by: Set(user_id.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let options = texts
            .into_iter()
            .map(|text| event_option::ActiveModel {
                id: Set(self.id_gen.generate()),
                text: Set(text),
                event_id: Set(event_id.clone()),
                created_at: Set(now.into()),
                updated_at: Set(None),
            })
            .collect();

        self.event_repo.create_with_options(event, options).await
    }

    /// Edit an event under the status policy.
    ///
    /// Fields the current status freezes are silently reset to their stored
    /// values, so a description fix on a closed event does not bounce on the
    /// untouched schedule fields its form resubmits. Option changes are only
    /// accepted while the event is still waiting.
    pub async fn update_event(
        &self,
        user_id: &str,
        is_admin: bool,
        input: UpdateEventInput,
    ) -> AppResult<event::Model> {
        input.validate()?;

        let event = self.event_repo.get_by_id(&input.event_id).await?;
        if event.created_by != user_id && !is_admin {
            return Err(AppError::Forbidden(
                "Only the event creator or an admin can edit this event".to_string(),
            ));
        }

        let now = self.clock.now();
        let original_start = event.start_time.map(|t| t.with_timezone(&Utc));
        let original_end = event.end_time.map(|t| t.with_timezone(&Utc));
        let status = lifecycle::compute_status(original_start, original_end, now);
        let fields = lifecycle::editable_fields(status);

        // Coerce frozen fields back to their stored values.
        let new_title = input
            .title
            .filter(|title| fields.title && *title != event.title);
        let new_description = input
            .description
            .filter(|description| fields.description && *description != event.description);
        let new_start = input
            .start_time
            .filter(|start| fields.start_time && Some(*start) != original_start);
        let new_end = input
            .end_time
            .filter(|end| fields.end_time && Some(*end) != original_end);

        let effective_start = new_start.or(original_start);
        let effective_end = new_end.or(original_end);
        lifecycle::validate_edit(status, effective_start, effective_end, original_start, now)?;
        if let Some(start) = new_start {
            self.check_future_window(start, now)?;
        }

        if let Some(rows) = input.options {
            let rows = option_set::validate_rows(rows)?;
            let existing = self.option_repo.find_by_event(&event.id).await?;
            let plan = option_set::reconcile(&existing, &rows);
            if !plan.is_empty() {
                if status != EventStatus::Waiting {
                    return Err(AppError::PolicyViolation(status.to_string()));
                }
                self.apply_option_plan(&event.id, plan, now).await?;
            }
        }

        if new_title.is_none()
            && new_description.is_none()
            && new_start.is_none()
            && new_end.is_none()
        {
            return Ok(event);
        }

        let mut active: event::ActiveModel = event.into();
        if let Some(title) = new_title {
            active.title = Set(title);
        }
        if let Some(description) = new_description {
            active.description = Set(description);
        }
        if let Some(start) = new_start {
            active.start_time = Set(Some(start.into()));
        }
        if let Some(end) = new_end {
            active.end_time = Set(Some(end.into()));
        }
        active.updated_at = Set(Some(now.into()));

        self.event_repo.update(active).await
    }

    /// Delete an event. Only its creator or an admin may; options and
    /// ballots cascade with it.
    pub async fn delete_event(
        &self,
        user_id: &str,
        is_admin: bool,
        event_id: &str,
    ) -> AppResult<()> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.created_by != user_id && !is_admin {
            return Err(AppError::Forbidden(
                "Only the event creator or an admin can delete this event".to_string(),
            ));
        }

        self.event_repo.delete(event_id).await
    }

    /// One event with its creator, options, and derived status.
    pub async fn get_event(&self, event_id: &str) -> AppResult<EventDetail> {
        let event = self.event_repo.get_by_id(event_id).await?;
        let creator = self.user_repo.find_by_id(&event.created_by).await?;
        let options = self.option_repo.find_by_event(event_id).await?;
        let status = lifecycle::event_status(&event, self.clock.now());

        Ok(EventDetail {
            event,
            creator_username: creator.map(|user| user.username),
            options,
            status,
        })
    }

    /// All events with creators, open ones first, then waiting, then closed.
    pub async fn list_events(&self) -> AppResult<Vec<EventSummary>> {
        let events = self.event_repo.find_all().await?;

        let mut creator_ids: Vec<String> = events
            .iter()
            .map(|event| event.created_by.clone())
            .collect();
        creator_ids.sort_unstable();
        creator_ids.dedup();

        let usernames: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&creator_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user.username))
            .collect();

        let now = self.clock.now();
        let mut summaries: Vec<EventSummary> = events
            .into_iter()
            .map(|event| {
                let status = lifecycle::event_status(&event, now);
                EventSummary {
                    creator_username: usernames.get(&event.created_by).cloned(),
                    event,
                    status,
                }
            })
            .collect();

        // find_all returns start_time ascending; the stable sort keeps that
        // order within each status band.
        summaries.sort_by_key(|summary| status_rank(summary.status));

        Ok(summaries)
    }

    /// Events that have not started yet, soonest first.
    pub async fn upcoming_events(&self, limit: u64) -> AppResult<Vec<event::Model>> {
        self.event_repo
            .find_upcoming(self.clock.now(), None, limit)
            .await
    }

    /// A short list of other upcoming events to show beside an event page.
    pub async fn recommendations(
        &self,
        exclude_event_id: Option<&str>,
    ) -> AppResult<Vec<event::Model>> {
        self.event_repo
            .find_upcoming(self.clock.now(), exclude_event_id, RECOMMENDATION_LIMIT)
            .await
    }

    fn check_future_window(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
        let horizon = now + Duration::days(365 * i64::from(self.max_future_years));
        if start > horizon {
            return Err(AppError::Validation(format!(
                "Start time cannot be more than {} years in the future",
                self.max_future_years
            )));
        }
        Ok(())
    }

    async fn apply_option_plan(
        &self,
        event_id: &str,
        plan: ReconcilePlan,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let to_create = plan
            .to_create
            .into_iter()
            .map(|text| event_option::ActiveModel {
                id: Set(self.id_gen.generate()),
                text: Set(text),
                event_id: Set(event_id.to_string()),
                created_at: Set(now.into()),
                updated_at: Set(None),
            })
            .collect();

        let to_update = plan
            .to_update
            .into_iter()
            .map(|(id, text)| event_option::ActiveModel {
                id: Set(id),
                text: Set(text),
                updated_at: Set(Some(now.into())),
                ..Default::default()
            })
            .collect();

        self.option_repo
            .apply_reconcile(to_create, to_update, plan.to_delete)
            .await
    }
}

/// Listing order: open events first, then waiting, then finished ones.
const fn status_rank(status: EventStatus) -> u8 {
    match status {
        EventStatus::Open => 0,
        EventStatus::Waiting => 1,
        EventStatus::Closed => 2,
        EventStatus::Unknown => 3,
    }
}
