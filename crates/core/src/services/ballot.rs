//! Ballot service: casting, changing, and retracting votes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::Serialize;
use votehall_common::{AppError, AppResult, Clock, IdGenerator};
use votehall_db::{
    entities::ballot,
    repositories::{BallotRepository, EventOptionRepository, EventRepository},
};

use crate::services::lifecycle::{self, EventStatus};

/// Whether a cast created a new ballot or moved an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    Created,
    Updated,
}

/// Whether a retraction found a ballot to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetractOutcome {
    Deleted,
    NotFound,
}

/// A ballot joined with the title of the event it was cast in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentBallot {
    pub ballot: ballot::Model,
    pub event_title: Option<String>,
}

/// Aggregate voting activity for one user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStats {
    pub total_ballots: u64,
    pub last_voted_at: Option<DateTime<Utc>>,
    /// Ballots cast per hundred closed events the user could have voted in.
    pub participation_rate: f64,
}

/// Ballot service for business logic.
#[derive(Clone)]
pub struct BallotService {
    ballot_repo: BallotRepository,
    event_repo: EventRepository,
    option_repo: EventOptionRepository,
    clock: Arc<dyn Clock>,
    id_gen: IdGenerator,
}

impl BallotService {
    /// Create a new ballot service.
    #[must_use]
    pub const fn new(
        ballot_repo: BallotRepository,
        event_repo: EventRepository,
        option_repo: EventOptionRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ballot_repo,
            event_repo,
            option_repo,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast a ballot, or move an existing one to another option.
    ///
    /// Each user holds at most one ballot per event. A repeated cast changes
    /// the chosen option in place rather than adding a second row; the
    /// unique index on (event, user) backstops concurrent first casts.
    pub async fn cast_or_change(
        &self,
        user_id: &str,
        is_admin: bool,
        event_id: &str,
        option_id: &str,
    ) -> AppResult<CastOutcome> {
        if is_admin {
            return Err(AppError::Forbidden(
                "Administrators cannot cast ballots".to_string(),
            ));
        }

        let event = self.event_repo.get_by_id(event_id).await?;
        if event.created_by == user_id {
            return Err(AppError::Forbidden(
                "Event creators cannot vote in their own event".to_string(),
            ));
        }

        let now = self.clock.now();
        let status = lifecycle::event_status(&event, now);
        if status != EventStatus::Open {
            return Err(AppError::PolicyViolation(status.to_string()));
        }

        let option = self.option_repo.get_by_id(option_id).await?;
        if option.event_id != event_id {
            return Err(AppError::Validation(
                "Option does not belong to this event".to_string(),
            ));
        }

        if let Some(existing) = self
            .ballot_repo
            .find_by_user_and_event(user_id, event_id)
            .await?
        {
            let mut active: ballot::ActiveModel = existing.into();
            active.option_id = Set(option_id.to_string());
            active.voted_at = Set(now.into());
            self.ballot_repo.update(active).await?;
            return Ok(CastOutcome::Updated);
        }

        let ballot = ballot::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_id: Set(event_id.to_string()),
            option_id: Set(option_id.to_string()),
            user_id: Set(user_id.to_string()),
            voted_at: Set(now.into()),
            created_at: Set(now.into()),
        };
        self.ballot_repo.create(ballot).await?;
        Ok(CastOutcome::Created)
    }

    /// Withdraw the caller's ballot from an event.
    pub async fn retract(&self, user_id: &str, event_id: &str) -> AppResult<RetractOutcome> {
        let event = self.event_repo.get_by_id(event_id).await?;
        if event.created_by == user_id {
            return Err(AppError::Forbidden(
                "Event creators hold no ballot to retract".to_string(),
            ));
        }

        let status = lifecycle::event_status(&event, self.clock.now());
        if status != EventStatus::Open {
            return Err(AppError::PolicyViolation(status.to_string()));
        }

        let deleted = self
            .ballot_repo
            .delete_by_user_and_event(user_id, event_id)
            .await?;
        if deleted > 0 {
            Ok(RetractOutcome::Deleted)
        } else {
            Ok(RetractOutcome::NotFound)
        }
    }

    /// The caller's ballot in an event, if any.
    pub async fn get_user_ballot(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> AppResult<Option<ballot::Model>> {
        self.ballot_repo
            .find_by_user_and_event(user_id, event_id)
            .await
    }

    /// The user's latest ballots with their event titles.
    pub async fn recent_ballots(&self, user_id: &str, limit: u64) -> AppResult<Vec<RecentBallot>> {
        let ballots = self.ballot_repo.find_recent_for_user(user_id, limit).await?;

        let mut event_ids: Vec<String> = ballots
            .iter()
            .map(|ballot| ballot.event_id.clone())
            .collect();
        event_ids.sort_unstable();
        event_ids.dedup();

        let titles: HashMap<String, String> = self
            .event_repo
            .find_by_ids(&event_ids)
            .await?
            .into_iter()
            .map(|event| (event.id, event.title))
            .collect();

        Ok(ballots
            .into_iter()
            .map(|ballot| RecentBallot {
                event_title: titles.get(&ballot.event_id).cloned(),
                ballot,
            })
            .collect())
    }

    /// Aggregate voting activity for a user.
    pub async fn voting_stats(&self, user_id: &str) -> AppResult<VotingStats> {
        let total_ballots = self.ballot_repo.count_for_user(user_id).await?;
        let last_voted_at = self
            .ballot_repo
            .last_voted_at(user_id)
            .await?
            .map(|t| t.with_timezone(&Utc));

        let closed = self
            .event_repo
            .count_closed_excluding_creator(user_id, self.clock.now())
            .await?;
        let participation_rate = if closed == 0 {
            0.0
        } else {
            let raw = total_ballots as f64 / closed as f64 * 100.0;
            (raw * 10.0).round() / 10.0
        };

        Ok(VotingStats {
            total_ballots,
            last_voted_at,
            participation_rate,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use votehall_common::FixedClock;
    use votehall_db::entities::{event, event_option};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn test_service(db: Arc<DatabaseConnection>, now: DateTime<Utc>) -> BallotService {
        BallotService::new(
            BallotRepository::new(db.clone()),
            EventRepository::new(db.clone()),
            EventOptionRepository::new(db),
            Arc::new(FixedClock::new(now)),
        )
    }

    fn create_test_event(
        id: &str,
        created_by: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> event::Model {
        event::Model {
            id: id.to_string(),
            title: "Board election".to_string(),
            description: None,
            start_time: start.map(Into::into),
            end_time: end.map(Into::into),
            created_by: created_by.to_string(),
            created_at: fixed_now().into(),
            updated_at: None,
        }
    }

    fn open_event(id: &str, created_by: &str) -> event::Model {
        let now = fixed_now();
        create_test_event(
            id,
            created_by,
            Some(now - Duration::hours(1)),
            Some(now + Duration::hours(1)),
        )
    }

    fn create_test_option(id: &str, event_id: &str) -> event_option::Model {
        event_option::Model {
            id: id.to_string(),
            text: "Alice".to_string(),
            event_id: event_id.to_string(),
            created_at: fixed_now().into(),
            updated_at: None,
        }
    }

    fn create_test_ballot(id: &str, event_id: &str, option_id: &str, user_id: &str) -> ballot::Model {
        ballot::Model {
            id: id.to_string(),
            event_id: event_id.to_string(),
            option_id: option_id.to_string(),
            user_id: user_id.to_string(),
            voted_at: fixed_now().into(),
            created_at: fixed_now().into(),
        }
    }

    #[tokio::test]
    async fn test_cast_rejects_admin() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = test_service(db, fixed_now());

        let result = service.cast_or_change("admin1", true, "event1", "opt1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_cast_rejects_creator() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event("event1", "user1")]])
                .into_connection(),
        );
        let service = test_service(db, fixed_now());

        let result = service.cast_or_change("user1", false, "event1", "opt1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_cast_requires_open_event() {
        let now = fixed_now();
        let closed = create_test_event(
            "event1",
            "user1",
            Some(now - Duration::hours(2)),
            Some(now - Duration::hours(1)),
        );
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[closed]])
                .into_connection(),
        );
        let service = test_service(db, now);

        let result = service.cast_or_change("user2", false, "event1", "opt1").await;
        assert!(matches!(result, Err(AppError::PolicyViolation(_))));
    }

    #[tokio::test]
    async fn test_cast_rejects_foreign_option() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event("event1", "user1")]])
                .append_query_results([[create_test_option("opt9", "event2")]])
                .into_connection(),
        );
        let service = test_service(db, fixed_now());

        let result = service.cast_or_change("user2", false, "event1", "opt9").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cast_creates_first_ballot() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event("event1", "user1")]])
                .append_query_results([[create_test_option("opt1", "event1")]])
                .append_query_results([Vec::<ballot::Model>::new()])
                .append_query_results([[create_test_ballot("ballot1", "event1", "opt1", "user2")]])
                .into_connection(),
        );
        let service = test_service(db, fixed_now());

        let outcome = service
            .cast_or_change("user2", false, "event1", "opt1")
            .await
            .unwrap();
        assert_eq!(outcome, CastOutcome::Created);
    }

    #[tokio::test]
    async fn test_cast_moves_existing_ballot() {
        let existing = create_test_ballot("ballot1", "event1", "opt1", "user2");
        let mut moved = existing.clone();
        moved.option_id = "opt2".to_string();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event("event1", "user1")]])
                .append_query_results([[create_test_option("opt2", "event1")]])
                .append_query_results([[existing]])
                .append_query_results([[moved]])
                .into_connection(),
        );
        let service = test_service(db, fixed_now());

        let outcome = service
            .cast_or_change("user2", false, "event1", "opt2")
            .await
            .unwrap();
        assert_eq!(outcome, CastOutcome::Updated);
    }

    #[tokio::test]
    async fn test_get_user_ballot_returns_cast_choice() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_ballot("ballot1", "event1", "opt1", "user2")]])
                .into_connection(),
        );
        let service = test_service(db, fixed_now());

        let ballot = service.get_user_ballot("user2", "event1").await.unwrap();
        assert_eq!(ballot.map(|b| b.option_id).as_deref(), Some("opt1"));
    }

    #[tokio::test]
    async fn test_retract_deletes_present_ballot() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event("event1", "user1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = test_service(db, fixed_now());

        let outcome = service.retract("user2", "event1").await.unwrap();
        assert_eq!(outcome, RetractOutcome::Deleted);
    }

    #[tokio::test]
    async fn test_retract_reports_missing_ballot() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open_event("event1", "user1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let service = test_service(db, fixed_now());

        let outcome = service.retract("user2", "event1").await.unwrap();
        assert_eq!(outcome, RetractOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_retract_requires_open_event() {
        let now = fixed_now();
        let waiting = create_test_event(
            "event1",
            "user1",
            Some(now + Duration::hours(1)),
            Some(now + Duration::hours(2)),
        );
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[waiting]])
                .into_connection(),
        );
        let service = test_service(db, now);

        let result = service.retract("user2", "event1").await;
        assert!(matches!(result, Err(AppError::PolicyViolation(_))));
    }

    #[tokio::test]
    async fn test_voting_stats_computes_rate() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4)),
                }]])
                .append_query_results([[create_test_ballot("ballot1", "event1", "opt1", "user2")]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(8)),
                }]])
                .into_connection(),
        );
        let service = test_service(db, fixed_now());

        let stats = service.voting_stats("user2").await.unwrap();
        assert_eq!(stats.total_ballots, 4);
        assert_eq!(stats.last_voted_at, Some(fixed_now()));
        assert!((stats.participation_rate - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_recent_ballots_merges_event_titles() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_ballot("ballot1", "event1", "opt1", "user2"),
                    create_test_ballot("ballot2", "event2", "opt5", "user2"),
                ]])
                .append_query_results([[
                    create_test_event("event1", "user1", None, None),
                    create_test_event("event2", "user1", None, None),
                ]])
                .into_connection(),
        );
        let service = test_service(db, fixed_now());

        let recent = service.recent_ballots("user2", 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event_title.as_deref(), Some("Board election"));
    }
}
