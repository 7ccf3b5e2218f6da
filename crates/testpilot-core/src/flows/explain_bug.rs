//! Explains the cause of a bug and suggests a fix.

use serde::Serialize;

use super::{Flow, FlowKind};
use crate::prompt::PromptTemplate;
use crate::schema::{impl_record, FieldSpec, Schema};

pub static EXPLAIN_BUG_INPUT: Schema = Schema {
    name: "ExplainBugInput",
    fields: &[
        FieldSpec::required("code", "The code containing the bug."),
        FieldSpec::required("bugReport", "The bug report for the code."),
    ],
};

pub static EXPLAIN_BUG_OUTPUT: Schema = Schema {
    name: "ExplainBugOutput",
    fields: &[
        FieldSpec::declared("explanation", "The explanation of the bug."),
        FieldSpec::declared("suggestedFix", "The suggested fix for the bug."),
    ],
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainBugInput {
    pub code: String,
    pub bug_report: String,
}

impl_record!(ExplainBugInput, EXPLAIN_BUG_INPUT, {
    code => "code",
    bug_report => "bugReport",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainBugOutput {
    pub explanation: String,
    pub suggested_fix: String,
}

impl_record!(ExplainBugOutput, EXPLAIN_BUG_OUTPUT, {
    explanation => "explanation",
    suggested_fix => "suggestedFix",
});

pub struct ExplainBug;

impl Flow for ExplainBug {
    const KIND: FlowKind = FlowKind::ExplainBug;
    const TEMPLATE: PromptTemplate = PromptTemplate::new(
        "explainBugPrompt",
        r#"You are an expert software developer. You are reviewing code and a bug report and explaining the cause of the bug and suggesting a fix.

Code:
{{code}}

Bug Report:
{{bugReport}}

Respond with a single JSON object and nothing else, using exactly these keys:
{
  "explanation": "The explanation of the bug.",
  "suggestedFix": "The suggested fix for the bug."
}
"#,
    );

    type Request = ExplainBugInput;
    type Output = ExplainBugOutput;
}
