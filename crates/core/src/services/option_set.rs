//! Candidate option validation and edit reconciliation.
//!
//! The edit form resubmits the whole option list. [`reconcile`] diffs that
//! submission against the stored rows into a create/update/delete plan which
//! the repository applies in one transaction, so an event is never visible
//! mid-edit with fewer than two options.

use serde::Deserialize;
use votehall_common::{AppError, AppResult};
use votehall_db::entities::event_option;

/// Fewest options an event can hold.
const MIN_OPTIONS: usize = 2;

/// Shortest accepted option text, in characters.
const MIN_OPTION_CHARS: usize = 2;

/// Longest accepted option text, in characters.
const MAX_OPTION_CHARS: usize = 45;

/// One row of a submitted option list. `id` is present for rows that came
/// from the stored set and absent for newly added ones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedOption {
    pub id: Option<String>,
    pub text: String,
}

/// The diff between the stored option set and a submitted one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Texts to insert as new options.
    pub to_create: Vec<String>,
    /// (option id, new text) pairs whose text changed.
    pub to_update: Vec<(String, String)>,
    /// Option ids no longer present in the submission.
    pub to_delete: Vec<String>,
}

impl ReconcilePlan {
    /// True when the submission matches the stored set exactly.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Clean and check a list of option texts.
///
/// Entries are trimmed and blank ones dropped. At least two must remain, each
/// within 2-45 characters, and no two may collide case-insensitively; a
/// collision names the offending text. The returned list keeps the original
/// order and casing.
pub fn validate(texts: &[String]) -> AppResult<Vec<String>> {
    let cleaned: Vec<String> = texts
        .iter()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if cleaned.len() < MIN_OPTIONS {
        return Err(AppError::Validation(format!(
            "An event needs at least {MIN_OPTIONS} options"
        )));
    }

    let mut seen: Vec<String> = Vec::with_capacity(cleaned.len());
    for text in &cleaned {
        let chars = text.chars().count();
        if chars < MIN_OPTION_CHARS || chars > MAX_OPTION_CHARS {
            return Err(AppError::Validation(format!(
                "Option text must be between {MIN_OPTION_CHARS} and {MAX_OPTION_CHARS} characters: {text}"
            )));
        }

        let folded = text.to_lowercase();
        if seen.contains(&folded) {
            return Err(AppError::Validation(format!("Duplicate option: {text}")));
        }
        seen.push(folded);
    }

    Ok(cleaned)
}

/// Trim a submitted option list, drop rows left blank, and validate the
/// surviving texts while keeping each row's id paired with its text.
pub fn validate_rows(rows: Vec<SubmittedOption>) -> AppResult<Vec<SubmittedOption>> {
    let cleaned: Vec<SubmittedOption> = rows
        .into_iter()
        .filter_map(|row| {
            let text = row.text.trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(SubmittedOption { id: row.id, text })
            }
        })
        .collect();

    let texts: Vec<String> = cleaned.iter().map(|row| row.text.clone()).collect();
    validate(&texts)?;

    Ok(cleaned)
}

/// Diff a validated submission against the stored options.
///
/// A row whose id matches a stored option is an update when its text changed
/// and a no-op otherwise; a row without a matching id is a creation; every
/// stored id missing from the submission is a deletion.
#[must_use]
pub fn reconcile(existing: &[event_option::Model], submitted: &[SubmittedOption]) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for row in submitted {
        match row
            .id
            .as_ref()
            .and_then(|id| existing.iter().find(|option| option.id == *id))
        {
            Some(option) => {
                if option.text != row.text {
                    plan.to_update.push((option.id.clone(), row.text.clone()));
                }
            }
            None => plan.to_create.push(row.text.clone()),
        }
    }

    let submitted_ids: Vec<&String> = submitted.iter().filter_map(|row| row.id.as_ref()).collect();
    for option in existing {
        if !submitted_ids.contains(&&option.id) {
            plan.to_delete.push(option.id.clone());
        }
    }

    plan
}
