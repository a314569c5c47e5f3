pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::activity::handlers as activity;
use crate::flows::handlers as flows;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Flow API
        .route(
            "/api/v1/flows/extract-job-points",
            post(flows::handle_extract_job_points),
        )
        .route(
            "/api/v1/flows/match-explanation",
            post(flows::handle_match_explanation),
        )
        .route("/api/v1/flows/resume", post(flows::handle_generate_resume))
        .route(
            "/api/v1/flows/cover-letter",
            post(flows::handle_generate_cover_letter),
        )
        // Activity API
        .route("/api/v1/activity/log", post(activity::handle_log_activity))
        .route(
            "/api/v1/activity/user/:user_id",
            get(activity::handle_user_activity),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::activity::{
        ActivityAction, ActivityEntry, ActivityStore, InMemoryActivityStore, NewActivity,
    };
    use crate::flow::testing::StubModel;
    use crate::flows::JobFlows;

    /// Store whose writes always fail; reads succeed with no history.
    struct FailingStore;

    #[async_trait]
    impl ActivityStore for FailingStore {
        async fn record(&self, _activity: NewActivity) -> anyhow::Result<ActivityEntry> {
            anyhow::bail!("store offline")
        }

        async fn for_user(&self, _user_id: i64) -> anyhow::Result<Vec<ActivityEntry>> {
            Ok(Vec::new())
        }
    }

    fn state_with(model: StubModel, store: Arc<dyn ActivityStore>) -> AppState {
        let flows = JobFlows::new(Arc::new(model), store.clone()).unwrap();
        AppState {
            flows: Arc::new(flows),
            activity: store,
        }
    }

    fn test_state(model: StubModel) -> (AppState, Arc<InMemoryActivityStore>) {
        let store = Arc::new(InMemoryActivityStore::new());
        (state_with(model, store.clone()), store)
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = test_state(StubModel::default());
        let response = build_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_extract_job_points_returns_model_output() {
        let (state, _) = test_state(StubModel::structured(json!({
            "keyRequirements": ["5+ years Go"],
            "keySkills": ["Go", "Kubernetes"]
        })));

        let (status, body) = post_json(
            build_router(state),
            "/api/v1/flows/extract-job-points",
            json!({ "jobDescription": "Backend engineer, Go and Kubernetes" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["keySkills"], json!(["Go", "Kubernetes"]));
    }

    #[tokio::test]
    async fn test_invalid_input_is_400() {
        let (state, _) = test_state(StubModel::default());

        let (status, body) = post_json(
            build_router(state),
            "/api/v1/flows/extract-job-points",
            json!({ "jobDescription": 42 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_502() {
        let (state, store) = test_state(StubModel::structured(json!({
            "matchExplanation": "Great fit.",
            "matchScore": 110
        })));

        let (status, body) = post_json(
            build_router(state),
            "/api/v1/flows/match-explanation",
            json!({ "jobDescription": "SRE", "userProfile": "Ops", "userId": 7 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "MODEL_OUTPUT_ERROR");
        assert!(store.for_user(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_match_records_activity_for_known_user() {
        let (state, store) = test_state(StubModel::structured(json!({
            "matchExplanation": "Strong overlap.",
            "matchScore": 82
        })));

        let (status, body) = post_json(
            build_router(state),
            "/api/v1/flows/match-explanation",
            json!({ "jobDescription": "SRE", "userProfile": "Ops", "userId": 7, "jobId": 42 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matchScore"], json!(82.0));
        let history = store.for_user(7).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].job_id, Some(42));
        assert_eq!(history[0].action, ActivityAction::MatchAnalyzed { score: 82.0 });
    }

    #[tokio::test]
    async fn test_non_positive_user_is_not_recorded() {
        let (state, store) = test_state(StubModel::structured(json!({
            "matchExplanation": "Some overlap.",
            "matchScore": 40
        })));

        let (status, _) = post_json(
            build_router(state),
            "/api/v1/flows/match-explanation",
            json!({ "jobDescription": "SRE", "userProfile": "Ops", "userId": 0 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(store.for_user(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resume_records_generated_activity() {
        let (state, store) = test_state(StubModel::structured(json!({ "resume": "# Sam" })));

        let (status, body) = post_json(
            build_router(state),
            "/api/v1/flows/resume",
            json!({
                "userId": 5,
                "jobId": 11,
                "jobDescription": "Data engineer",
                "userProfile": "ETL pipelines",
                "pointsToMention": ["Airflow"]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume"], "# Sam");
        let history = store.for_user(5).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].job_id, Some(11));
        assert_eq!(
            history[0].action,
            ActivityAction::ResumeGenerated {
                source: "generated".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_cover_letter_records_company() {
        let (state, store) = test_state(StubModel::structured(json!({
            "coverLetter": "Dear Acme team"
        })));

        let (status, body) = post_json(
            build_router(state),
            "/api/v1/flows/cover-letter",
            json!({
                "userId": 5,
                "jobDescription": "PM",
                "userProfile": "Analyst",
                "companyName": "Acme",
                "pointsToMention": []
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["coverLetter"], "Dear Acme team");
        let history = store.for_user(5).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].job_id, None);
        assert_eq!(
            history[0].action,
            ActivityAction::CoverLetterGenerated {
                company: Some("Acme".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_generated_output() {
        let state = state_with(
            StubModel::structured(json!({ "coverLetter": "Dear team" })),
            Arc::new(FailingStore),
        );

        let (status, body) = post_json(
            build_router(state),
            "/api/v1/flows/cover-letter",
            json!({
                "userId": 5,
                "jobDescription": "PM",
                "userProfile": "Analyst",
                "pointsToMention": []
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "coverLetter": "Dear team" }));
    }

    #[tokio::test]
    async fn test_backend_failure_is_502() {
        let (state, _) = test_state(StubModel::failing(529, "overloaded"));

        let (status, body) = post_json(
            build_router(state),
            "/api/v1/flows/cover-letter",
            json!({
                "jobDescription": "PM",
                "userProfile": "Analyst",
                "pointsToMention": []
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_log_and_list_activity() {
        let (state, _) = test_state(StubModel::default());
        let router = build_router(state);

        let (status, entry) = post_json(
            router.clone(),
            "/api/v1/activity/log",
            json!({ "userId": 3, "jobId": 9, "action": { "type": "job_saved" } }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["action"], json!({ "type": "job_saved" }));

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/activity/user/3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let listed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["jobId"], 9);
    }

    #[tokio::test]
    async fn test_log_activity_rejects_non_positive_user() {
        let (state, _) = test_state(StubModel::default());
        let (status, _) = post_json(
            build_router(state),
            "/api/v1/activity/log",
            json!({ "userId": 0, "action": { "type": "job_viewed" } }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
