//! Runs one flow invocation against a language model
//!
//! An invocation moves through validating-input, rendering, awaiting-model and
//! validating-output before it is done. It only suspends while awaiting the
//! model, and any failure ends it: nothing is retried and no fallback result
//! is produced.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    ExplainBug, ExplainBugInput, ExplainBugOutput, Flow, FlowRequest, FlowResult,
    GenerateTestCases, GenerateTestCasesInput, GenerateTestCasesOutput, SmartCodeSuggestions,
    SmartCodeSuggestionsInput, SmartCodeSuggestionsOutput, SuggestCodeFix, SuggestCodeFixInput,
    SuggestCodeFixOutput,
};
use crate::ai::LanguageModel;
use crate::error::{FlowError, FlowStage};
use crate::response::decode_output;
use crate::schema;

/// Stateless executor; clones share only the model client
#[derive(Clone)]
pub struct FlowExecutor {
    model: Arc<dyn LanguageModel>,
}

impl FlowExecutor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &dyn LanguageModel {
        self.model.as_ref()
    }

    /// Run a typed flow
    pub async fn run<F: Flow>(&self, request: &F::Request) -> Result<F::Output, FlowError> {
        let flow = F::KIND.name();
        let outcome = self.run_stages::<F>(request).await;

        match &outcome {
            Ok(_) => info!(flow, model = self.model.model_name(), "flow completed"),
            Err(err) => warn!(flow, stage = err.stage().as_str(), error = %err, "flow failed"),
        }
        outcome
    }

    async fn run_stages<F: Flow>(&self, request: &F::Request) -> Result<F::Output, FlowError> {
        let flow = F::KIND.name();

        debug!(flow, stage = FlowStage::ValidatingInput.as_str());
        schema::check(request)?;

        debug!(flow, stage = FlowStage::Rendering.as_str());
        let prompt = F::render_prompt(request);

        debug!(
            flow,
            stage = FlowStage::AwaitingModel.as_str(),
            provider = %self.model.provider(),
            model = self.model.model_name(),
            prompt_chars = prompt.len(),
        );
        let answer = self.model.query_json(&prompt).await?;

        debug!(flow, stage = FlowStage::ValidatingOutput.as_str(), answer_chars = answer.len());
        let output = decode_output::<F::Output>(&answer)?;

        debug!(flow, stage = FlowStage::Done.as_str());
        Ok(output)
    }

    /// Run whichever flow the request belongs to
    pub async fn execute(&self, request: FlowRequest) -> Result<FlowResult, FlowError> {
        Ok(match request {
            FlowRequest::SmartCodeSuggestions(req) => {
                FlowResult::SmartCodeSuggestions(self.run::<SmartCodeSuggestions>(&req).await?)
            }
            FlowRequest::ExplainBug(req) => FlowResult::ExplainBug(self.run::<ExplainBug>(&req).await?),
            FlowRequest::SuggestCodeFix(req) => {
                FlowResult::SuggestCodeFix(self.run::<SuggestCodeFix>(&req).await?)
            }
            FlowRequest::GenerateTestCases(req) => {
                FlowResult::GenerateTestCases(self.run::<GenerateTestCases>(&req).await?)
            }
        })
    }

    pub async fn smart_code_suggestions(
        &self,
        request: &SmartCodeSuggestionsInput,
    ) -> Result<SmartCodeSuggestionsOutput, FlowError> {
        self.run::<SmartCodeSuggestions>(request).await
    }

    pub async fn explain_bug(&self, request: &ExplainBugInput) -> Result<ExplainBugOutput, FlowError> {
        self.run::<ExplainBug>(request).await
    }

    pub async fn suggest_code_fix(
        &self,
        request: &SuggestCodeFixInput,
    ) -> Result<SuggestCodeFixOutput, FlowError> {
        self.run::<SuggestCodeFix>(request).await
    }

    pub async fn generate_test_cases(
        &self,
        request: &GenerateTestCasesInput,
    ) -> Result<GenerateTestCasesOutput, FlowError> {
        self.run::<GenerateTestCases>(request).await
    }
}

impl std::fmt::Debug for FlowExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowExecutor")
            .field("provider", &self.model.provider())
            .field("model", &self.model.model_name())
            .finish()
    }
}
