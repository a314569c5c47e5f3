//! Job description extraction — pulls key requirements and skills out of a posting.

use serde::{Deserialize, Serialize};

use crate::flow::{FlowDefinition, FlowError, ObjectSchema, Schema};
use crate::flows::prompts::{EXTRACTION_PROMPT, EXTRACTION_SYSTEM};

pub const FLOW_NAME: &str = "extractJobDescriptionPoints";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractJobPointsInput {
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptionPoints {
    pub key_requirements: Vec<String>,
    pub key_skills: Vec<String>,
}

pub fn definition() -> Result<FlowDefinition, FlowError> {
    FlowDefinition::builder(FLOW_NAME)
        .system(EXTRACTION_SYSTEM)
        .input(ObjectSchema::new().required(
            "jobDescription",
            Schema::String,
            "The full job description text",
        ))
        .output(
            ObjectSchema::new()
                .required(
                    "keyRequirements",
                    Schema::string_array(),
                    "Key requirements extracted from the job description",
                )
                .required(
                    "keySkills",
                    Schema::string_array(),
                    "Key skills extracted from the job description",
                ),
        )
        .prompt(EXTRACTION_PROMPT)
        .build()
}
