mod common;

use std::sync::Arc;

use common::ScriptedModel;
use testpilot_core::flows::{
    ExplainBug, ExplainBugInput, Flow, GenerateTestCasesInput, SmartCodeSuggestionsInput,
    SuggestCodeFixInput,
};
use testpilot_core::{FlowError, FlowExecutor, FlowRequest, FlowResult, FlowStage, ModelError, ValidationError};

fn executor(model: &Arc<ScriptedModel>) -> FlowExecutor {
    FlowExecutor::new(model.clone())
}

#[tokio::test]
async fn test_explain_bug_returns_both_fields() {
    let model = Arc::new(ScriptedModel::answering(&[r#"{
        "explanation": "The function subtracts b from a instead of adding them.",
        "suggestedFix": "function add(a,b){return a+b}"
    }"#]));

    let output = executor(&model)
        .explain_bug(&ExplainBugInput {
            code: "function add(a,b){return a-b}".to_string(),
            bug_report: "add(2,3) returns -1 instead of 5".to_string(),
        })
        .await
        .unwrap();

    assert!(!output.explanation.is_empty());
    assert!(!output.suggested_fix.is_empty());
    assert_eq!(model.calls(), 1);

    let prompt = &model.prompts()[0];
    assert!(prompt.contains("function add(a,b){return a-b}"));
    assert!(prompt.contains("add(2,3) returns -1 instead of 5"));
}

#[tokio::test]
async fn test_empty_code_fails_before_model_call() {
    let model = Arc::new(ScriptedModel::answering(&[r#"{"fixedCode": "x", "explanation": "y"}"#]));

    let err = executor(&model)
        .suggest_code_fix(&SuggestCodeFixInput {
            code: String::new(),
            description: "optimize this".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.validation().and_then(ValidationError::field), Some("code"));
    assert_eq!(err.stage(), FlowStage::ValidatingInput);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_missing_objective_fails_before_model_call() {
    let model = Arc::new(ScriptedModel::new());
    let request = FlowRequest::SmartCodeSuggestions(SmartCodeSuggestionsInput {
        objective: "   ".to_string(),
        ..Default::default()
    });

    let err = executor(&model).execute(request).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_repeated_calls_may_differ() {
    let model = Arc::new(ScriptedModel::answering(&[
        r#"{"testCases": "test('adds', () => expect(add(1, 2)).toBe(3));"}"#,
        r#"{"testCases": "describe('add', () => { it('handles zero', () => expect(add(0, 0)).toBe(0)); });"}"#,
    ]));
    let request = GenerateTestCasesInput {
        code: "const add = (a, b) => a + b;".to_string(),
        language: "JavaScript".to_string(),
        testing_framework: "Jest".to_string(),
    };

    let exec = executor(&model);
    let first = exec.generate_test_cases(&request).await.unwrap();
    let second = exec.generate_test_cases(&request).await.unwrap();

    assert!(!first.test_cases.is_empty());
    assert!(!second.test_cases.is_empty());
    assert_ne!(first, second);

    let prompts = model.prompts();
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn test_incomplete_answer_is_never_returned() {
    let model = Arc::new(ScriptedModel::answering(&[r#"{"explanation": "only half"}"#]));

    let err = executor(&model)
        .explain_bug(&ExplainBugInput {
            code: "x = 1".to_string(),
            bug_report: "x should be 2".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        FlowError::Model(ModelError::InvalidOutput(v)) => assert_eq!(v.field(), Some("suggestedFix")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_model_errors_propagate_unchanged() {
    let model = Arc::new(ScriptedModel::failing(ModelError::Api {
        provider: "claude",
        status: 529,
        message: "overloaded".to_string(),
    }));

    let err = executor(&model)
        .explain_bug(&ExplainBugInput {
            code: "x = 1".to_string(),
            bug_report: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::Model(ModelError::Api { status: 529, .. })));
    assert_eq!(err.stage(), FlowStage::AwaitingModel);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_non_json_answer_is_malformed() {
    let model = Arc::new(ScriptedModel::answering(&["Sure! The bug is on line 1."]));

    let err = executor(&model)
        .explain_bug(&ExplainBugInput {
            code: "x = 1".to_string(),
            bug_report: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::Model(ModelError::MalformedResponse { .. })));
    assert_eq!(err.stage(), FlowStage::ValidatingOutput);
}

#[tokio::test]
async fn test_execute_dispatches_on_request_kind() {
    let model = Arc::new(ScriptedModel::answering(&[
        "```json\n{\"fixedCode\": \"a + b\", \"explanation\": \"use addition\"}\n```",
    ]));

    let result = executor(&model)
        .execute(FlowRequest::SuggestCodeFix(SuggestCodeFixInput {
            code: "a - b".to_string(),
            description: "should add".to_string(),
        }))
        .await
        .unwrap();

    assert!(matches!(result, FlowResult::SuggestCodeFix(_)));
    assert_eq!(result.field("fixedCode"), Some("a + b"));
}

#[test]
fn test_rendering_is_deterministic() {
    let request = ExplainBugInput {
        code: "fn main() {}".to_string(),
        bug_report: "does nothing".to_string(),
    };
    assert_eq!(ExplainBug::render_prompt(&request), ExplainBug::render_prompt(&request));
}

#[test]
fn test_special_characters_survive_rendering() {
    let code = r#"const t = `${a}{{code}}`; if (x) { return "q\"uote"; } // {{ bugReport }}"#;
    let request = ExplainBugInput {
        code: code.to_string(),
        bug_report: "braces {{}} and 'quotes'".to_string(),
    };

    let prompt = ExplainBug::render_prompt(&request);
    assert!(prompt.contains(code));
    assert!(prompt.contains("braces {{}} and 'quotes'"));
}
