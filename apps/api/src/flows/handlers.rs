//! Axum route handlers for the flow API.
//!
//! Bodies are passed to the flows as raw JSON so the flow's input schema is the
//! single source of validation errors.

use axum::{extract::State, Json};
use serde_json::Value;
use tracing::warn;

use crate::activity::{is_valid_user_id, ActivityAction, NewActivity};
use crate::errors::AppError;
use crate::flows::cover_letter::GeneratedCoverLetter;
use crate::flows::extraction::JobDescriptionPoints;
use crate::flows::match_explanation::JobMatchExplanation;
use crate::flows::resume::GeneratedResume;
use crate::state::AppState;

/// POST /api/v1/flows/extract-job-points
pub async fn handle_extract_job_points(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<JobDescriptionPoints>, AppError> {
    let points = state.flows.extract_job_description_points_value(body).await?;
    Ok(Json(points))
}

/// POST /api/v1/flows/match-explanation
pub async fn handle_match_explanation(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<JobMatchExplanation>, AppError> {
    let ids = Requester::from_body(&body);
    let explanation = state.flows.job_match_explanation_value(body).await?;
    ids.record(
        &state,
        ActivityAction::MatchAnalyzed {
            score: explanation.match_score,
        },
    )
    .await;
    Ok(Json(explanation))
}

/// POST /api/v1/flows/resume
pub async fn handle_generate_resume(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<GeneratedResume>, AppError> {
    let ids = Requester::from_body(&body);
    let resume = state.flows.generate_resume_value(body).await?;
    ids.record(
        &state,
        ActivityAction::ResumeGenerated {
            source: "generated".to_string(),
        },
    )
    .await;
    Ok(Json(resume))
}

/// POST /api/v1/flows/cover-letter
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<GeneratedCoverLetter>, AppError> {
    let ids = Requester::from_body(&body);
    let company = body
        .get("companyName")
        .and_then(Value::as_str)
        .map(str::to_string);
    let letter = state.flows.generate_cover_letter_value(body).await?;
    ids.record(&state, ActivityAction::CoverLetterGenerated { company })
        .await;
    Ok(Json(letter))
}

/// User and job a generation request was made for, if the caller said.
struct Requester {
    user_id: Option<i64>,
    job_id: Option<i64>,
}

impl Requester {
    fn from_body(body: &Value) -> Self {
        Self {
            user_id: body
                .get("userId")
                .and_then(Value::as_i64)
                .filter(|id| is_valid_user_id(*id)),
            job_id: body.get("jobId").and_then(Value::as_i64),
        }
    }

    /// Logging is best-effort: the generated output is returned even if it fails.
    async fn record(&self, state: &AppState, action: ActivityAction) {
        let Some(user_id) = self.user_id else {
            return;
        };
        let activity = NewActivity {
            user_id,
            job_id: self.job_id,
            action,
        };
        if let Err(e) = state.activity.record(activity).await {
            warn!("Failed to record activity for user {user_id}: {e:#}");
        }
    }
}
