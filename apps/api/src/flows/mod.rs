// Job-search flows: four configurations of the flow engine.
// All model calls go through the ModelBackend held by the executor.

pub mod cover_letter;
pub mod extraction;
pub mod handlers;
pub mod match_explanation;
pub mod prompts;
pub mod resume;

use std::sync::Arc;

use serde_json::Value;

use crate::activity::ActivityStore;
use crate::flow::{Flow, FlowError, FlowExecutor, ModelBackend};
use cover_letter::{GenerateCoverLetterInput, GeneratedCoverLetter};
use extraction::{ExtractJobPointsInput, JobDescriptionPoints};
use match_explanation::{annotate_experience, JobMatchExplanation, JobMatchInput};
use resume::{GenerateResumeInput, GeneratedResume};

/// The registered job-search flows plus the executor that runs them.
/// Built once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct JobFlows {
    executor: FlowExecutor,
    extraction: Flow<ExtractJobPointsInput, JobDescriptionPoints>,
    match_explanation: Flow<JobMatchInput, JobMatchExplanation>,
    resume: Flow<GenerateResumeInput, GeneratedResume>,
    cover_letter: Flow<GenerateCoverLetterInput, GeneratedCoverLetter>,
}

impl JobFlows {
    pub fn new(model: Arc<dyn ModelBackend>, history: Arc<dyn ActivityStore>) -> Result<Self, FlowError> {
        Ok(Self {
            executor: FlowExecutor::new(model),
            extraction: Flow::new(extraction::definition()?),
            match_explanation: Flow::new(match_explanation::definition()?),
            resume: Flow::new(resume::definition(history)?),
            cover_letter: Flow::new(cover_letter::definition()?),
        })
    }

    /// Names of every registered flow.
    pub fn names(&self) -> [&str; 4] {
        [
            self.extraction.definition().name(),
            self.match_explanation.definition().name(),
            self.resume.definition().name(),
            self.cover_letter.definition().name(),
        ]
    }

    pub async fn extract_job_description_points(
        &self,
        input: &ExtractJobPointsInput,
    ) -> Result<JobDescriptionPoints, FlowError> {
        self.extraction.run(&self.executor, input).await
    }

    pub async fn extract_job_description_points_value(
        &self,
        raw: Value,
    ) -> Result<JobDescriptionPoints, FlowError> {
        self.extraction.run_value(&self.executor, raw).await
    }

    pub async fn job_match_explanation(
        &self,
        input: &JobMatchInput,
    ) -> Result<JobMatchExplanation, FlowError> {
        self.job_match_explanation_value(serde_json::to_value(input)?)
            .await
    }

    pub async fn job_match_explanation_value(
        &self,
        mut raw: Value,
    ) -> Result<JobMatchExplanation, FlowError> {
        annotate_experience(&mut raw);
        self.match_explanation.run_value(&self.executor, raw).await
    }

    pub async fn generate_resume(
        &self,
        input: &GenerateResumeInput,
    ) -> Result<GeneratedResume, FlowError> {
        self.resume.run(&self.executor, input).await
    }

    pub async fn generate_resume_value(&self, raw: Value) -> Result<GeneratedResume, FlowError> {
        self.resume.run_value(&self.executor, raw).await
    }

    pub async fn generate_cover_letter(
        &self,
        input: &GenerateCoverLetterInput,
    ) -> Result<GeneratedCoverLetter, FlowError> {
        self.cover_letter.run(&self.executor, input).await
    }

    pub async fn generate_cover_letter_value(
        &self,
        raw: Value,
    ) -> Result<GeneratedCoverLetter, FlowError> {
        self.cover_letter.run_value(&self.executor, raw).await
    }
}
