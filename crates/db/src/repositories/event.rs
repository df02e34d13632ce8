//! Event repository.

use std::sync::Arc;

use crate::entities::{Event, event, event_option};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use votehall_common::{AppError, AppResult};

/// Event repository for database operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an event by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<event::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {id} not found")))
    }

    /// Find events by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<event::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Event::find()
            .filter(event::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all events, earliest scheduled first (unscheduled last).
    pub async fn find_all(&self) -> AppResult<Vec<event::Model>> {
        Event::find()
            .order_by_asc(event::Column::StartTime)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find events that have not started yet, soonest first.
    pub async fn find_upcoming(
        &self,
        now: DateTime<Utc>,
        exclude_event_id: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<event::Model>> {
        let mut query = Event::find().filter(event::Column::StartTime.gt(now));

        if let Some(id) = exclude_event_id {
            query = query.filter(event::Column::Id.ne(id));
        }

        query
            .order_by_asc(event::Column::StartTime)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count events already closed at `now`, excluding those the user created.
    ///
    /// Used for the participation-rate denominator.
    pub async fn count_closed_excluding_creator(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        Event::find()
            .filter(event::Column::EndTime.is_not_null())
            .filter(event::Column::EndTime.lte(now))
            .filter(event::Column::CreatedBy.ne(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new event.
    pub async fn create(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an event together with its initial options in one transaction.
    ///
    /// A failed option insert rolls the event back too, so an event is never
    /// visible without its full option set.
    pub async fn create_with_options(
        &self,
        event: event::ActiveModel,
        options: Vec<event_option::ActiveModel>,
    ) -> AppResult<event::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = event
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for option in options {
            option
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Update an event.
    pub async fn update(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an event. Options and ballots cascade at the schema level.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Event::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
