use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the user did, with the metadata that action carries.
/// Serialized as `{"type": "job_applied", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityAction {
    JobViewed,
    JobSaved,
    JobApplied,
    ResumeGenerated {
        /// Where the resume came from: "generated", "uploaded", ...
        source: String,
    },
    CoverLetterGenerated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        company: Option<String>,
    },
    MatchAnalyzed {
        score: f64,
    },
}

/// Request body for logging an activity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub user_id: i64,
    #[serde(default)]
    pub job_id: Option<i64>,
    pub action: ActivityAction,
}

/// Only positive ids name a real user.
pub fn is_valid_user_id(user_id: i64) -> bool {
    user_id > 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: i64,
    pub job_id: Option<i64>,
    pub action: ActivityAction,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    /// One-line, human-readable description used in prompts.
    pub fn describe(&self) -> String {
        let job = match self.job_id {
            Some(id) => format!("job #{id}"),
            None => "a job".to_string(),
        };
        let what = match &self.action {
            ActivityAction::JobViewed => format!("viewed {job}"),
            ActivityAction::JobSaved => format!("saved {job}"),
            ActivityAction::JobApplied => format!("applied to {job}"),
            ActivityAction::ResumeGenerated { source } => {
                format!("created a resume ({source}) for {job}")
            }
            ActivityAction::CoverLetterGenerated { company: Some(company) } => {
                format!("wrote a cover letter for {company}")
            }
            ActivityAction::CoverLetterGenerated { company: None } => {
                format!("wrote a cover letter for {job}")
            }
            ActivityAction::MatchAnalyzed { score } => {
                format!("checked their match for {job} (score {score:.0})")
            }
        };
        format!("{}: {}", self.created_at.format("%Y-%m-%d"), what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(action: ActivityAction, job_id: Option<i64>) -> ActivityEntry {
        ActivityEntry {
            id: Uuid::new_v4(),
            user_id: 1,
            job_id,
            action,
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_action_serde_is_tagged() {
        let json = serde_json::to_value(ActivityAction::ResumeGenerated {
            source: "generated".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "type": "resume_generated", "source": "generated" }));

        let parsed: ActivityAction = serde_json::from_str(r#"{"type":"job_applied"}"#).unwrap();
        assert_eq!(parsed, ActivityAction::JobApplied);
    }

    #[test]
    fn test_unknown_action_type_is_rejected() {
        let result: Result<ActivityAction, _> = serde_json::from_str(r#"{"type":"job_deleted"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_activity_deserializes_camel_case() {
        let parsed: NewActivity = serde_json::from_str(
            r#"{"userId": 4, "jobId": 17, "action": {"type": "match_analyzed", "score": 81}}"#,
        )
        .unwrap();
        assert_eq!(parsed.user_id, 4);
        assert_eq!(parsed.job_id, Some(17));
        assert_eq!(parsed.action, ActivityAction::MatchAnalyzed { score: 81.0 });
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            entry(ActivityAction::JobApplied, Some(42)).describe(),
            "2025-03-14: applied to job #42"
        );
        assert_eq!(
            entry(
                ActivityAction::CoverLetterGenerated {
                    company: Some("Acme".to_string())
                },
                None
            )
            .describe(),
            "2025-03-14: wrote a cover letter for Acme"
        );
        assert_eq!(
            entry(ActivityAction::MatchAnalyzed { score: 72.4 }, Some(3)).describe(),
            "2025-03-14: checked their match for job #3 (score 72)"
        );
    }
}
