//! Flows: request schema + prompt template + result schema
//!
//! Each flow is a one-shot request/response contract executed against a
//! language model. The typed entry point is [`Flow`]; [`FlowRequest`] and
//! [`FlowResult`] carry any flow's records through UI code that does not know
//! the concrete flow at compile time.

pub mod executor;
pub mod explain_bug;
pub mod generate_tests;
pub mod suggest_code;
pub mod suggest_fix;

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::prompt::PromptTemplate;
use crate::response::record_from_value;
use crate::schema::{check, FieldSpec, Fields, Record, Schema};

pub use executor::FlowExecutor;
pub use explain_bug::{ExplainBug, ExplainBugInput, ExplainBugOutput};
pub use generate_tests::{GenerateTestCases, GenerateTestCasesInput, GenerateTestCasesOutput};
pub use suggest_code::{SmartCodeSuggestions, SmartCodeSuggestionsInput, SmartCodeSuggestionsOutput};
pub use suggest_fix::{SuggestCodeFix, SuggestCodeFixInput, SuggestCodeFixOutput};

pub trait Flow {
    const KIND: FlowKind;
    const TEMPLATE: PromptTemplate;

    type Request: Record + Send + Sync;
    type Output: Record + Send;

    /// Prompt text for a request; pure and deterministic
    fn render_prompt(request: &Self::Request) -> String {
        Self::TEMPLATE.render(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    SmartCodeSuggestions,
    ExplainBug,
    SuggestCodeFix,
    GenerateTestCases,
}

impl FlowKind {
    pub fn all() -> [FlowKind; 4] {
        [
            FlowKind::SmartCodeSuggestions,
            FlowKind::ExplainBug,
            FlowKind::SuggestCodeFix,
            FlowKind::GenerateTestCases,
        ]
    }

    /// Wire name of the flow
    pub fn name(&self) -> &'static str {
        match self {
            FlowKind::SmartCodeSuggestions => "smartCodeSuggestions",
            FlowKind::ExplainBug => "explainBug",
            FlowKind::SuggestCodeFix => "suggestCodeFix",
            FlowKind::GenerateTestCases => "generateTestCases",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|k| k.name() == name)
    }

    pub fn input_schema(&self) -> &'static Schema {
        match self {
            FlowKind::SmartCodeSuggestions => &suggest_code::SMART_CODE_SUGGESTIONS_INPUT,
            FlowKind::ExplainBug => &explain_bug::EXPLAIN_BUG_INPUT,
            FlowKind::SuggestCodeFix => &suggest_fix::SUGGEST_CODE_FIX_INPUT,
            FlowKind::GenerateTestCases => &generate_tests::GENERATE_TEST_CASES_INPUT,
        }
    }

    pub fn output_schema(&self) -> &'static Schema {
        match self {
            FlowKind::SmartCodeSuggestions => &suggest_code::SMART_CODE_SUGGESTIONS_OUTPUT,
            FlowKind::ExplainBug => &explain_bug::EXPLAIN_BUG_OUTPUT,
            FlowKind::SuggestCodeFix => &suggest_fix::SUGGEST_CODE_FIX_OUTPUT,
            FlowKind::GenerateTestCases => &generate_tests::GENERATE_TEST_CASES_OUTPUT,
        }
    }

    pub fn template(&self) -> PromptTemplate {
        match self {
            FlowKind::SmartCodeSuggestions => SmartCodeSuggestions::TEMPLATE,
            FlowKind::ExplainBug => ExplainBug::TEMPLATE,
            FlowKind::SuggestCodeFix => SuggestCodeFix::TEMPLATE,
            FlowKind::GenerateTestCases => GenerateTestCases::TEMPLATE,
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A request for any flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FlowRequest {
    SmartCodeSuggestions(SmartCodeSuggestionsInput),
    ExplainBug(ExplainBugInput),
    SuggestCodeFix(SuggestCodeFixInput),
    GenerateTestCases(GenerateTestCasesInput),
}

impl FlowRequest {
    pub fn kind(&self) -> FlowKind {
        match self {
            FlowRequest::SmartCodeSuggestions(_) => FlowKind::SmartCodeSuggestions,
            FlowRequest::ExplainBug(_) => FlowKind::ExplainBug,
            FlowRequest::SuggestCodeFix(_) => FlowKind::SuggestCodeFix,
            FlowRequest::GenerateTestCases(_) => FlowKind::GenerateTestCases,
        }
    }

    /// Assemble a request from raw field values without validating them.
    ///
    /// Validation is the executor's job; a form may well hold empty fields.
    pub fn from_fields(kind: FlowKind, fields: Fields) -> Self {
        match kind {
            FlowKind::SmartCodeSuggestions => {
                FlowRequest::SmartCodeSuggestions(Record::from_fields(fields))
            }
            FlowKind::ExplainBug => FlowRequest::ExplainBug(Record::from_fields(fields)),
            FlowKind::SuggestCodeFix => FlowRequest::SuggestCodeFix(Record::from_fields(fields)),
            FlowKind::GenerateTestCases => {
                FlowRequest::GenerateTestCases(Record::from_fields(fields))
            }
        }
    }

    /// Validate the request and render the prompt it would send
    pub fn render_prompt(&self) -> Result<String, ValidationError> {
        Ok(match self {
            FlowRequest::SmartCodeSuggestions(req) => {
                check(req)?;
                SmartCodeSuggestions::render_prompt(req)
            }
            FlowRequest::ExplainBug(req) => {
                check(req)?;
                ExplainBug::render_prompt(req)
            }
            FlowRequest::SuggestCodeFix(req) => {
                check(req)?;
                SuggestCodeFix::render_prompt(req)
            }
            FlowRequest::GenerateTestCases(req) => {
                check(req)?;
                GenerateTestCases::render_prompt(req)
            }
        })
    }

    /// Parse a raw JSON payload, checking it against the flow's input schema
    pub fn from_json(kind: FlowKind, payload: &Value) -> Result<Self, ValidationError> {
        Ok(match kind {
            FlowKind::SmartCodeSuggestions => {
                FlowRequest::SmartCodeSuggestions(record_from_value(payload)?)
            }
            FlowKind::ExplainBug => FlowRequest::ExplainBug(record_from_value(payload)?),
            FlowKind::SuggestCodeFix => FlowRequest::SuggestCodeFix(record_from_value(payload)?),
            FlowKind::GenerateTestCases => {
                FlowRequest::GenerateTestCases(record_from_value(payload)?)
            }
        })
    }
}

/// A validated result of any flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FlowResult {
    SmartCodeSuggestions(SmartCodeSuggestionsOutput),
    ExplainBug(ExplainBugOutput),
    SuggestCodeFix(SuggestCodeFixOutput),
    GenerateTestCases(GenerateTestCasesOutput),
}

impl FlowResult {
    pub fn kind(&self) -> FlowKind {
        match self {
            FlowResult::SmartCodeSuggestions(_) => FlowKind::SmartCodeSuggestions,
            FlowResult::ExplainBug(_) => FlowKind::ExplainBug,
            FlowResult::SuggestCodeFix(_) => FlowKind::SuggestCodeFix,
            FlowResult::GenerateTestCases(_) => FlowKind::GenerateTestCases,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            FlowResult::SmartCodeSuggestions(r) => r.field(name),
            FlowResult::ExplainBug(r) => r.field(name),
            FlowResult::SuggestCodeFix(r) => r.field(name),
            FlowResult::GenerateTestCases(r) => r.field(name),
        }
    }

    pub fn entries(&self) -> Vec<(&'static FieldSpec, &str)> {
        match self {
            FlowResult::SmartCodeSuggestions(r) => r.entries(),
            FlowResult::ExplainBug(r) => r.entries(),
            FlowResult::SuggestCodeFix(r) => r.entries(),
            FlowResult::GenerateTestCases(r) => r.entries(),
        }
    }

    /// True when every declared field is blank
    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, value)| value.trim().is_empty())
    }
}
