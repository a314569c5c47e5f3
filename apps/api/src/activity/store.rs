//! Activity persistence seam.
//!
//! `ActivityStore` is the collaborator interface; `InMemoryActivityStore` is the
//! implementation wired in at startup. Handles are created once and passed
//! explicitly through `AppState`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::activity::models::{ActivityEntry, NewActivity};

/// Maximum lines included in a history summary.
pub const HISTORY_LIMIT: usize = 20;

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn record(&self, activity: NewActivity) -> Result<ActivityEntry>;

    /// All entries for a user, oldest first.
    async fn for_user(&self, user_id: i64) -> Result<Vec<ActivityEntry>>;
}

#[derive(Default)]
pub struct InMemoryActivityStore {
    entries: RwLock<Vec<ActivityEntry>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn record(&self, activity: NewActivity) -> Result<ActivityEntry> {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            user_id: activity.user_id,
            job_id: activity.job_id,
            action: activity.action,
            created_at: Utc::now(),
        };
        self.entries.write().await.push(entry.clone());
        debug!("Recorded activity {} for user {}", entry.id, entry.user_id);
        Ok(entry)
    }

    async fn for_user(&self, user_id: i64) -> Result<Vec<ActivityEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Summarises a user's history for a prompt: most recent first, one line each,
/// at most `HISTORY_LIMIT` lines.
pub fn summarize_history(entries: &[ActivityEntry]) -> String {
    if entries.is_empty() {
        return "No recorded activity.".to_string();
    }
    entries
        .iter()
        .rev()
        .take(HISTORY_LIMIT)
        .map(|e| format!("- {}", e.describe()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::models::ActivityAction;

    fn activity(user_id: i64, job_id: i64) -> NewActivity {
        NewActivity {
            user_id,
            job_id: Some(job_id),
            action: ActivityAction::JobApplied,
        }
    }

    #[tokio::test]
    async fn test_record_and_filter_by_user() {
        let store = InMemoryActivityStore::new();
        store.record(activity(1, 10)).await.unwrap();
        store.record(activity(2, 20)).await.unwrap();
        store.record(activity(1, 11)).await.unwrap();

        let mine = store.for_user(1).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].job_id, Some(10));
        assert_eq!(mine[1].job_id, Some(11));
        assert!(store.for_user(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_is_newest_first_and_capped() {
        let store = InMemoryActivityStore::new();
        for job in 0..25 {
            store.record(activity(1, job)).await.unwrap();
        }
        let summary = summarize_history(&store.for_user(1).await.unwrap());
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), HISTORY_LIMIT);
        assert!(lines[0].ends_with("applied to job #24"));
        assert!(lines[HISTORY_LIMIT - 1].ends_with("applied to job #5"));
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(summarize_history(&[]), "No recorded activity.");
    }
}
