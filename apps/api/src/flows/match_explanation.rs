//! Job match explanation — scores a candidate against a job and explains the fit.
//!
//! `matchScore` is range-checked to 0..=100 at output validation. A model that
//! returns 110 fails the invocation instead of passing an out-of-range score on.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::flow::{FlowDefinition, FlowError, ObjectSchema, Schema};
use crate::flows::prompts::{MATCH_PROMPT, MATCH_SYSTEM};

pub const FLOW_NAME: &str = "jobMatchExplanation";

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatchInput {
    pub job_description: String,
    pub user_profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatchExplanation {
    pub match_explanation: String,
    pub match_score: f64,
}

pub fn definition() -> Result<FlowDefinition, FlowError> {
    FlowDefinition::builder(FLOW_NAME)
        .system(MATCH_SYSTEM)
        .input(
            ObjectSchema::new()
                .required("jobDescription", Schema::String, "The job description")
                .required(
                    "userProfile",
                    Schema::String,
                    "The candidate's profile: skills, experience, education",
                )
                .optional("jobTitle", Schema::String, "Title of the role")
                .optional("yearsExperience", Schema::Integer, "Years of professional experience")
                .optional(
                    "experienceSummary",
                    Schema::String,
                    "Derived from yearsExperience before validation",
                )
                .optional("userId", Schema::Integer, "Requesting user, for activity logging")
                .optional("jobId", Schema::Integer, "Job being assessed, for activity logging"),
        )
        .output(
            ObjectSchema::new()
                .required(
                    "matchExplanation",
                    Schema::String,
                    "Explanation of how well the candidate matches the job",
                )
                .required(
                    "matchScore",
                    Schema::bounded(MIN_SCORE, MAX_SCORE),
                    "A score from 0-100 indicating the match quality",
                ),
        )
        .prompt(MATCH_PROMPT)
        .build()
}

/// Seniority bands a job board would search for, given years of experience.
pub fn seniority_for_experience(years: u32) -> &'static [&'static str] {
    match years {
        0 => &["junior"],
        1..=2 => &["junior", "mid_level"],
        3..=6 => &["mid_level", "senior"],
        7..=9 => &["senior", "staff"],
        _ => &["senior", "staff", "c_level"],
    }
}

/// Fills `experienceSummary` from `yearsExperience`. Any caller-supplied summary is replaced.
pub fn annotate_experience(raw: &mut Value) {
    let Some(map) = raw.as_object_mut() else {
        return;
    };
    let summary = match map
        .get("yearsExperience")
        .and_then(Value::as_u64)
        .and_then(|y| u32::try_from(y).ok())
    {
        Some(years) => format!(
            "{years} years (typical level: {})",
            seniority_for_experience(years).join(", ")
        ),
        None => "not stated".to_string(),
    };
    map.insert("experienceSummary".to_string(), json!(summary));
}
