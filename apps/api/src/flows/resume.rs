//! Resume generation, with the candidate's platform history pulled in via the
//! `getUserHistory` tool.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::activity::store::{summarize_history, ActivityStore};
use crate::flow::{FlowDefinition, FlowError, ObjectSchema, Schema, ToolDefinition, ToolHandler};
use crate::flows::prompts::{RESUME_PROMPT, RESUME_SYSTEM};

pub const FLOW_NAME: &str = "generateResume";
pub const HISTORY_TOOL: &str = "getUserHistory";

const NO_USER: &str = "No user history available.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResumeInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
    pub job_description: String,
    pub user_profile: String,
    #[serde(default)]
    pub points_to_mention: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResume {
    pub resume: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryArgs {
    user_id: Option<i64>,
}

/// Looks up a user's recorded activity and summarises it as text.
pub struct UserHistoryTool {
    store: Arc<dyn ActivityStore>,
}

#[async_trait]
impl ToolHandler for UserHistoryTool {
    async fn call(&self, input: Value) -> anyhow::Result<Value> {
        let args: HistoryArgs =
            serde_json::from_value(input).context("invalid getUserHistory arguments")?;
        let Some(user_id) = args.user_id else {
            return Ok(json!(NO_USER));
        };
        let entries = self
            .store
            .for_user(user_id)
            .await
            .with_context(|| format!("failed to load activity for user {user_id}"))?;
        Ok(json!(summarize_history(&entries)))
    }
}

pub fn user_history_tool(store: Arc<dyn ActivityStore>) -> ToolDefinition {
    ToolDefinition {
        name: HISTORY_TOOL.to_string(),
        description: "Returns a summary of the user's recent job-search activity".to_string(),
        input_schema: ObjectSchema::new().optional(
            "userId",
            Schema::Integer,
            "The user whose history to fetch",
        ),
        output_schema: Schema::String,
        handler: Arc::new(UserHistoryTool { store }),
    }
}

pub fn definition(history: Arc<dyn ActivityStore>) -> Result<FlowDefinition, FlowError> {
    FlowDefinition::builder(FLOW_NAME)
        .system(RESUME_SYSTEM)
        .input(
            ObjectSchema::new()
                .optional("userId", Schema::Integer, "The user the resume is for")
                .optional("jobId", Schema::Integer, "Job being applied to, for activity logging")
                .required("jobDescription", Schema::String, "The target job description")
                .required("userProfile", Schema::String, "The candidate's profile")
                .optional(
                    "pointsToMention",
                    Schema::string_array(),
                    "Specific achievements or facts the resume must include",
                ),
        )
        .output(ObjectSchema::new().required(
            "resume",
            Schema::String,
            "The generated resume in Markdown",
        ))
        .prompt(RESUME_PROMPT)
        .tool(user_history_tool(history))
        .build()
}
