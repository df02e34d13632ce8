//! Ballot repository.

use std::sync::Arc;

use crate::entities::{Ballot, ballot};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};
use votehall_common::{AppError, AppResult};

/// Ballot repository for database operations.
#[derive(Clone)]
pub struct BallotRepository {
    db: Arc<DatabaseConnection>,
}

impl BallotRepository {
    /// Create a new ballot repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's ballot in an event, if any.
    ///
    /// The unique index on (`event_id`, `user_id`) guarantees at most one row.
    pub async fn find_by_user_and_event(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<Option<ballot::Model>> {
        Ballot::find()
            .filter(ballot::Column::UserId.eq(user_id))
            .filter(ballot::Column::EventId.eq(event_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new ballot.
    ///
    /// A concurrent duplicate cast for the same (user, event) pair trips the
    /// unique index and surfaces as a conflict instead of a second row.
    pub async fn create(&self, model: ballot::ActiveModel) -> AppResult<ballot::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("A ballot for this user and event already exists".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Update a ballot.
    pub async fn update(&self, model: ballot::ActiveModel) -> AppResult<ballot::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user's ballot in an event, returning how many rows went away.
    pub async fn delete_by_user_and_event(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<u64> {
        let result = Ballot::delete_many()
            .filter(ballot::Column::UserId.eq(user_id))
            .filter(ballot::Column::EventId.eq(event_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count all ballots cast in an event.
    pub async fn count_by_event(&self, event_id: &str) -> AppResult<u64> {
        Ballot::find()
            .filter(ballot::Column::EventId.eq(event_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count ballots per option for an event.
    ///
    /// Options nobody voted for are absent from the result; callers
    /// zero-fill against the event's option list.
    pub async fn count_grouped_by_option(&self, event_id: &str) -> AppResult<Vec<(String, i64)>> {
        Ballot::find()
            .select_only()
            .column(ballot::Column::OptionId)
            .column_as(ballot::Column::Id.count(), "votes")
            .filter(ballot::Column::EventId.eq(event_id))
            .group_by(ballot::Column::OptionId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's most recent ballots, newest first.
    pub async fn find_recent_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<ballot::Model>> {
        Ballot::find()
            .filter(ballot::Column::UserId.eq(user_id))
            .order_by_desc(ballot::Column::VotedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all ballots a user has cast.
    pub async fn count_for_user(&self, user_id: &str) -> AppResult<u64> {
        Ballot::find()
            .filter(ballot::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// When the user last cast or changed a ballot.
    pub async fn last_voted_at(&self, user_id: &str) -> AppResult<Option<DateTimeWithTimeZone>> {
        let latest = Ballot::find()
            .filter(ballot::Column::UserId.eq(user_id))
            .order_by_desc(ballot::Column::VotedAt)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(latest.map(|b| b.voted_at))
    }
}
