//! Tally service: per-option counts, percentages, and winners.
//!
//! Counting always walks the option list, not the ballots, so options
//! nobody picked still show up as zero-vote rows.

use std::collections::HashMap;

use serde::Serialize;
use votehall_common::AppResult;
use votehall_db::repositories::{BallotRepository, EventOptionRepository};

/// One option's share of the count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyRow {
    pub option_id: String,
    pub option_text: String,
    pub votes: i64,
    /// Share of the total, rounded to one decimal. Zero when nothing was cast.
    pub percentage: f64,
}

/// The full results snapshot for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResults {
    pub rows: Vec<TallyRow>,
    /// Every option sharing the top vote count, empty if nobody voted.
    pub winner_ids: Vec<String>,
    pub total_votes: u64,
}

/// Tally service for counting ballots.
#[derive(Clone)]
pub struct TallyService {
    option_repo: EventOptionRepository,
    ballot_repo: BallotRepository,
}

impl TallyService {
    /// Create a new tally service.
    #[must_use]
    pub const fn new(option_repo: EventOptionRepository, ballot_repo: BallotRepository) -> Self {
        Self {
            option_repo,
            ballot_repo,
        }
    }

    /// Count ballots per option, most votes first, ties by option text.
    pub async fn tally(&self, event_id: &str) -> AppResult<Vec<TallyRow>> {
        let options = self.option_repo.find_by_event(event_id).await?;
        let counts: HashMap<String, i64> = self
            .ballot_repo
            .count_grouped_by_option(event_id)
            .await?
            .into_iter()
            .collect();

        let mut rows: Vec<TallyRow> = options
            .into_iter()
            .map(|option| TallyRow {
                votes: counts.get(&option.id).copied().unwrap_or(0),
                option_text: option.text,
                option_id: option.id,
                percentage: 0.0,
            })
            .collect();

        rows.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| a.option_text.cmp(&b.option_text))
        });

        Ok(rows)
    }

    /// The complete results snapshot: enriched rows, winners, and the total.
    pub async fn results(&self, event_id: &str) -> AppResult<EventResults> {
        let rows = enrich(self.tally(event_id).await?);
        let winner_ids = winners(&rows);
        let total_votes = total_votes(&rows);

        Ok(EventResults {
            rows,
            winner_ids,
            total_votes,
        })
    }
}

/// Fill in each row's percentage of the total vote count.
#[must_use]
pub fn enrich(mut rows: Vec<TallyRow>) -> Vec<TallyRow> {
    let total: i64 = rows.iter().map(|row| row.votes).sum();
    if total == 0 {
        return rows;
    }

    for row in &mut rows {
        let raw = row.votes as f64 / total as f64 * 100.0;
        row.percentage = (raw * 10.0).round() / 10.0;
    }
    rows
}

/// Ids of every option holding the top vote count. Empty when the top
/// count is zero, so an untouched event has no winner.
#[must_use]
pub fn winners(rows: &[TallyRow]) -> Vec<String> {
    let max = rows.iter().map(|row| row.votes).max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }

    rows.iter()
        .filter(|row| row.votes == max)
        .map(|row| row.option_id.clone())
        .collect()
}

/// Total ballots across all rows.
#[must_use]
pub fn total_votes(rows: &[TallyRow]) -> u64 {
    rows.iter()
        .map(|row| u64::try_from(row.votes).unwrap_or(0))
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use votehall_db::entities::event_option;

    fn row(option_id: &str, option_text: &str, votes: i64) -> TallyRow {
        TallyRow {
            option_id: option_id.to_string(),
            option_text: option_text.to_string(),
            votes,
            percentage: 0.0,
        }
    }

    fn create_test_option(id: &str, text: &str) -> event_option::Model {
        event_option::Model {
            id: id.to_string(),
            text: text.to_string(),
            event_id: "event1".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_enrich_splits_percentages() {
        let rows = enrich(vec![row("opt1", "Alice", 1), row("opt2", "Bob", 0)]);
        assert!((rows[0].percentage - 100.0).abs() < f64::EPSILON);
        assert!((rows[1].percentage - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_enrich_rounds_to_one_decimal() {
        let rows = enrich(vec![row("opt1", "Alice", 1), row("opt2", "Bob", 2)]);
        assert!((rows[0].percentage - 33.3).abs() < f64::EPSILON);
        assert!((rows[1].percentage - 66.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_enrich_leaves_zero_total_at_zero() {
        let rows = enrich(vec![row("opt1", "Alice", 0), row("opt2", "Bob", 0)]);
        assert!(rows.iter().all(|r| r.percentage == 0.0));
    }

    #[test]
    fn test_winners_keeps_every_tied_option() {
        let rows = vec![
            row("opt1", "Alice", 10),
            row("opt2", "Bob", 10),
            row("opt3", "Carol", 3),
        ];
        assert_eq!(winners(&rows), vec!["opt1", "opt2"]);
    }

    #[test]
    fn test_winners_empty_when_nobody_voted() {
        let rows = vec![row("opt1", "Alice", 0), row("opt2", "Bob", 0)];
        assert!(winners(&rows).is_empty());
    }

    #[test]
    fn test_total_votes_sums_rows() {
        let rows = vec![row("opt1", "Alice", 7), row("opt2", "Bob", 3)];
        assert_eq!(total_votes(&rows), 10);
    }

    #[tokio::test]
    async fn test_tally_zero_fills_and_orders() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_option("opt1", "Alice"),
                    create_test_option("opt2", "Bob"),
                    create_test_option("opt3", "Carol"),
                ]])
                .append_query_results([[
                    btreemap! {
                        "option_id" => sea_orm::Value::from("opt1"),
                        "votes" => sea_orm::Value::BigInt(Some(3)),
                    },
                    btreemap! {
                        "option_id" => sea_orm::Value::from("opt2"),
                        "votes" => sea_orm::Value::BigInt(Some(7)),
                    },
                ]])
                .into_connection(),
        );
        let service = TallyService::new(
            EventOptionRepository::new(db.clone()),
            BallotRepository::new(db),
        );

        let rows = service.tally("event1").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].option_id, "opt2");
        assert_eq!(rows[0].votes, 7);
        assert_eq!(rows[1].option_id, "opt1");
        assert_eq!(rows[2].option_id, "opt3");
        assert_eq!(rows[2].votes, 0);
    }

    #[tokio::test]
    async fn test_tally_is_stable_across_reads() {
        let options = [
            create_test_option("opt1", "Alice"),
            create_test_option("opt2", "Bob"),
        ];
        let counts = [
            btreemap! {
                "option_id" => sea_orm::Value::from("opt1"),
                "votes" => sea_orm::Value::BigInt(Some(2)),
            },
            btreemap! {
                "option_id" => sea_orm::Value::from("opt2"),
                "votes" => sea_orm::Value::BigInt(Some(5)),
            },
        ];
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([options.clone()])
                .append_query_results([counts.clone()])
                .append_query_results([options])
                .append_query_results([counts])
                .into_connection(),
        );
        let service = TallyService::new(
            EventOptionRepository::new(db.clone()),
            BallotRepository::new(db),
        );

        let first = service.tally("event1").await.unwrap();
        let second = service.tally("event1").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_results_assembles_snapshot() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_option("opt1", "Alice"),
                    create_test_option("opt2", "Bob"),
                ]])
                .append_query_results([[
                    btreemap! {
                        "option_id" => sea_orm::Value::from("opt1"),
                        "votes" => sea_orm::Value::BigInt(Some(3)),
                    },
                    btreemap! {
                        "option_id" => sea_orm::Value::from("opt2"),
                        "votes" => sea_orm::Value::BigInt(Some(1)),
                    },
                ]])
                .into_connection(),
        );
        let service = TallyService::new(
            EventOptionRepository::new(db.clone()),
            BallotRepository::new(db),
        );

        let results = service.results("event1").await.unwrap();
        assert_eq!(results.total_votes, 4);
        assert_eq!(results.winner_ids, vec!["opt1"]);
        assert!((results.rows[0].percentage - 75.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_results_serializes_camel_case() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_option("opt1", "Alice")]])
                .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
                .into_connection(),
        );
        let service = TallyService::new(
            EventOptionRepository::new(db.clone()),
            BallotRepository::new(db),
        );

        let results = service.results("event1").await.unwrap();
        let value = serde_json::to_value(&results).unwrap();
        assert!(value["rows"][0]["optionId"].is_string());
        assert!(value["totalVotes"].is_u64());
    }
}
