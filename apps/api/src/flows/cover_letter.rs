//! Cover letter generation.

use serde::{Deserialize, Serialize};

use crate::flow::{FlowDefinition, FlowError, ObjectSchema, Schema};
use crate::flows::prompts::{COVER_LETTER_PROMPT, COVER_LETTER_SYSTEM};

pub const FLOW_NAME: &str = "generateCoverLetter";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCoverLetterInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
    pub job_description: String,
    pub user_profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub points_to_mention: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCoverLetter {
    pub cover_letter: String,
}

pub fn definition() -> Result<FlowDefinition, FlowError> {
    FlowDefinition::builder(FLOW_NAME)
        .system(COVER_LETTER_SYSTEM)
        .input(
            ObjectSchema::new()
                .optional("userId", Schema::Integer, "Requesting user, for activity logging")
                .optional("jobId", Schema::Integer, "Job being applied to, for activity logging")
                .required("jobDescription", Schema::String, "The target job description")
                .required("userProfile", Schema::String, "The candidate's profile")
                .optional("companyName", Schema::String, "Company the letter is addressed to")
                .optional(
                    "pointsToMention",
                    Schema::string_array(),
                    "Specific points the letter must mention",
                ),
        )
        .output(ObjectSchema::new().required(
            "coverLetter",
            Schema::String,
            "The generated cover letter",
        ))
        .prompt(COVER_LETTER_PROMPT)
        .build()
}
