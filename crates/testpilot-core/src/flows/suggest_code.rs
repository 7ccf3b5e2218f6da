//! Smart code suggestions tailored for test automation.

use serde::Serialize;

use super::{Flow, FlowKind};
use crate::prompt::PromptTemplate;
use crate::schema::{impl_record, FieldSpec, Schema};

pub static SMART_CODE_SUGGESTIONS_INPUT: Schema = Schema {
    name: "SmartCodeSuggestionsInput",
    fields: &[
        FieldSpec::optional("codeSnippet", "The current code snippet the developer is working on."),
        FieldSpec::optional(
            "language",
            "The programming language of the code snippet (e.g., JavaScript, Python, Java).",
        ),
        FieldSpec::optional(
            "testingFramework",
            "The test automation framework being used (e.g., Selenium, Cypress, Jest).",
        ),
        FieldSpec::required(
            "objective",
            "The objective of the code to be generated, e.g. \"click the button\"",
        ),
    ],
};

pub static SMART_CODE_SUGGESTIONS_OUTPUT: Schema = Schema {
    name: "SmartCodeSuggestionsOutput",
    fields: &[
        FieldSpec::declared("suggestedCode", "The suggested code completion or snippet."),
        FieldSpec::declared(
            "explanation",
            "An explanation of the suggested code and how it addresses the objective.",
        ),
    ],
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartCodeSuggestionsInput {
    pub code_snippet: String,
    pub language: String,
    pub testing_framework: String,
    pub objective: String,
}

impl_record!(SmartCodeSuggestionsInput, SMART_CODE_SUGGESTIONS_INPUT, {
    code_snippet => "codeSnippet",
    language => "language",
    testing_framework => "testingFramework",
    objective => "objective",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartCodeSuggestionsOutput {
    pub suggested_code: String,
    pub explanation: String,
}

impl_record!(SmartCodeSuggestionsOutput, SMART_CODE_SUGGESTIONS_OUTPUT, {
    suggested_code => "suggestedCode",
    explanation => "explanation",
});

pub struct SmartCodeSuggestions;

impl Flow for SmartCodeSuggestions {
    const KIND: FlowKind = FlowKind::SmartCodeSuggestions;
    const TEMPLATE: PromptTemplate = PromptTemplate::new(
        "smartCodeSuggestionsPrompt",
        r#"You are an AI expert in test automation. Given the code snippet, programming language, testing framework, and objective, provide a smart code suggestion to help the developer write tests more accurately and quickly.

Code Snippet:
{{codeSnippet}}

Language: {{language}}
Testing Framework: {{testingFramework}}
Objective: {{objective}}

Respond with the code, followed by an explanation of how the code meets the objective, as a single JSON object using exactly these keys:
{
  "suggestedCode": "The suggested code completion or snippet.",
  "explanation": "An explanation of the suggested code and how it addresses the objective."
}
"#,
    );

    type Request = SmartCodeSuggestionsInput;
    type Output = SmartCodeSuggestionsOutput;
}
