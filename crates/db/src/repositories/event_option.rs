//! Event option repository.

use std::sync::Arc;

use crate::entities::{EventOption, event_option};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use votehall_common::{AppError, AppResult};

/// Event option repository for database operations.
#[derive(Clone)]
pub struct EventOptionRepository {
    db: Arc<DatabaseConnection>,
}

impl EventOptionRepository {
    /// Create a new event option repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an option by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event_option::Model>> {
        EventOption::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an option by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<event_option::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Option {id} not found")))
    }

    /// Find all options of an event, in insertion order.
    pub async fn find_by_event(&self, event_id: &str) -> AppResult<Vec<event_option::Model>> {
        EventOption::find()
            .filter(event_option::Column::EventId.eq(event_id))
            .order_by_asc(event_option::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count options of an event.
    pub async fn count_by_event(&self, event_id: &str) -> AppResult<u64> {
        EventOption::find()
            .filter(event_option::Column::EventId.eq(event_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new option.
    pub async fn create(&self, model: event_option::ActiveModel) -> AppResult<event_option::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply a reconcile plan in a single transaction.
    ///
    /// A failure at any point rolls the whole batch back, so a concurrent
    /// reader never observes a partially edited option set.
    pub async fn apply_reconcile(
        &self,
        to_create: Vec<event_option::ActiveModel>,
        to_update: Vec<event_option::ActiveModel>,
        to_delete: Vec<String>,
    ) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for model in to_create {
            model
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        for model in to_update {
            model
                .update(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        if !to_delete.is_empty() {
            EventOption::delete_many()
                .filter(event_option::Column::Id.is_in(to_delete))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_option(id: &str, event_id: &str, text: &str) -> event_option::Model {
        event_option::Model {
            id: id.to_string(),
            text: text.to_string(),
            event_id: event_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_event() {
        let options = vec![
            create_test_option("opt1", "event1", "Alice"),
            create_test_option("opt2", "event1", "Bob"),
        ];
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([options])
                .into_connection(),
        );

        let repo = EventOptionRepository::new(db);
        let result = repo.find_by_event("event1").await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "Alice");
    }

    #[tokio::test]
    async fn test_count_by_event() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = EventOptionRepository::new(db);
        let result = repo.count_by_event("event1").await.unwrap();
        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn test_apply_reconcile_runs_in_one_transaction() {
        let created = create_test_option("opt3", "event1", "Carol");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = EventOptionRepository::new(db);
        let to_create = vec![event_option::ActiveModel {
            id: Set("opt3".to_string()),
            text: Set("Carol".to_string()),
            event_id: Set("event1".to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }];

        let result = repo
            .apply_reconcile(to_create, vec![], vec!["opt2".to_string()])
            .await;
        assert!(result.is_ok());
    }
}
