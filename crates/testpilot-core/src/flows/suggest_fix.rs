//! Suggests fixes for bugs and inefficient code.

use serde::Serialize;

use super::{Flow, FlowKind};
use crate::prompt::PromptTemplate;
use crate::schema::{impl_record, FieldSpec, Schema};

pub static SUGGEST_CODE_FIX_INPUT: Schema = Schema {
    name: "SuggestCodeFixInput",
    fields: &[
        FieldSpec::required("code", "The code to be fixed."),
        FieldSpec::required("description", "The description of the issue to be fixed."),
    ],
};

pub static SUGGEST_CODE_FIX_OUTPUT: Schema = Schema {
    name: "SuggestCodeFixOutput",
    fields: &[
        FieldSpec::declared("fixedCode", "The suggested fix for the code."),
        FieldSpec::declared("explanation", "An explanation of the suggested fix."),
    ],
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestCodeFixInput {
    pub code: String,
    pub description: String,
}

impl_record!(SuggestCodeFixInput, SUGGEST_CODE_FIX_INPUT, {
    code => "code",
    description => "description",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestCodeFixOutput {
    pub fixed_code: String,
    pub explanation: String,
}

impl_record!(SuggestCodeFixOutput, SUGGEST_CODE_FIX_OUTPUT, {
    fixed_code => "fixedCode",
    explanation => "explanation",
});

pub struct SuggestCodeFix;

impl Flow for SuggestCodeFix {
    const KIND: FlowKind = FlowKind::SuggestCodeFix;
    const TEMPLATE: PromptTemplate = PromptTemplate::new(
        "suggestCodeFixPrompt",
        r#"You are an AI coding assistant that helps developers fix bugs and improve code quality.

You will be given a piece of code and a description of the issue to be fixed. You will then suggest a fix for the code and explain the fix.

Code:
{{code}}

Issue Description:
{{description}}

Suggest a fix for the code and explain the fix. Return the fixed code and the explanation as a single JSON object in the following format:
{
  "fixedCode": "The fixed code.",
  "explanation": "An explanation of the suggested fix."
}
"#,
    );

    type Request = SuggestCodeFixInput;
    type Output = SuggestCodeFixOutput;
}
