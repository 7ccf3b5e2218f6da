//! Generates test cases for a piece of code.

use serde::Serialize;

use super::{Flow, FlowKind};
use crate::prompt::PromptTemplate;
use crate::schema::{impl_record, FieldSpec, Schema};

pub static GENERATE_TEST_CASES_INPUT: Schema = Schema {
    name: "GenerateTestCasesInput",
    fields: &[
        FieldSpec::required("code", "The code to generate test cases for."),
        FieldSpec::required("language", "The programming language of the code."),
        FieldSpec::required("testingFramework", "The testing framework to write the tests with."),
    ],
};

pub static GENERATE_TEST_CASES_OUTPUT: Schema = Schema {
    name: "GenerateTestCasesOutput",
    fields: &[FieldSpec::declared("testCases", "The generated test cases as source code.")],
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTestCasesInput {
    pub code: String,
    pub language: String,
    pub testing_framework: String,
}

impl_record!(GenerateTestCasesInput, GENERATE_TEST_CASES_INPUT, {
    code => "code",
    language => "language",
    testing_framework => "testingFramework",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTestCasesOutput {
    pub test_cases: String,
}

impl_record!(GenerateTestCasesOutput, GENERATE_TEST_CASES_OUTPUT, {
    test_cases => "testCases",
});

pub struct GenerateTestCases;

impl Flow for GenerateTestCases {
    const KIND: FlowKind = FlowKind::GenerateTestCases;
    const TEMPLATE: PromptTemplate = PromptTemplate::new(
        "generateTestCasesPrompt",
        r#"You are an expert in software testing. Given the code below, write thorough test cases covering normal behavior, edge cases and error handling.

Language: {{language}}
Testing Framework: {{testingFramework}}

Code:
{{code}}

Return the complete test code as a single JSON object using exactly this key:
{
  "testCases": "The generated test cases as source code."
}
"#,
    );

    type Request = GenerateTestCasesInput;
    type Output = GenerateTestCasesOutput;
}
