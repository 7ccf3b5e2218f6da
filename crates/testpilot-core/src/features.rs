//! Feature registry: the five panels the application offers and how each one
//! maps its form onto a flow.

use crate::flows::FlowKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    SmartCodeSuggestions,
    BugDetection,
    AutoFix,
    TestCaseGeneration,
    NaturalLanguageQuery,
}

impl FeatureKey {
    pub fn all() -> [FeatureKey; 5] {
        [
            FeatureKey::SmartCodeSuggestions,
            FeatureKey::BugDetection,
            FeatureKey::AutoFix,
            FeatureKey::TestCaseGeneration,
            FeatureKey::NaturalLanguageQuery,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::SmartCodeSuggestions => "smart-code-suggestions",
            FeatureKey::BugDetection => "bug-detection",
            FeatureKey::AutoFix => "auto-fix",
            FeatureKey::TestCaseGeneration => "test-case-generation",
            FeatureKey::NaturalLanguageQuery => "natural-language-query",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|k| k.as_str() == s)
    }

    /// Position in the sidebar
    pub fn index(&self) -> usize {
        Self::all().iter().position(|k| k == self).unwrap_or(0)
    }

    pub fn feature(&self) -> &'static Feature {
        feature(*self)
    }
}

/// One editable form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputField {
    /// Wire name of the request field it fills
    pub name: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub default: &'static str,
    pub multiline: bool,
}

/// How a result field is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultView {
    pub field: &'static str,
    pub label: &'static str,
    /// Render as a code block rather than prose
    pub code: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Feature {
    pub key: FeatureKey,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub title: &'static str,
    pub intro: &'static str,
    pub flow: FlowKind,
    pub inputs: &'static [InputField],
    /// Request fields the form never shows, with the value they always take
    pub fixed: &'static [(&'static str, &'static str)],
    pub results: &'static [ResultView],
    pub results_heading: &'static str,
    pub submit_label: &'static str,
    /// Shown instead of the result views when every result field is blank
    pub empty_result: Option<&'static str>,
}

impl Feature {
    pub fn input(&self, name: &str) -> Option<&InputField> {
        self.inputs.iter().find(|i| i.name == name)
    }
}

const fn input(
    name: &'static str,
    label: &'static str,
    placeholder: &'static str,
    default: &'static str,
    multiline: bool,
) -> InputField {
    InputField { name, label, placeholder, default, multiline }
}

const fn prose(field: &'static str, label: &'static str) -> ResultView {
    ResultView { field, label, code: false }
}

const fn code(field: &'static str, label: &'static str) -> ResultView {
    ResultView { field, label, code: true }
}

pub static FEATURES: [Feature; 5] = [
    Feature {
        key: FeatureKey::SmartCodeSuggestions,
        label: "Smart Code Suggestions",
        icon: "💡",
        description: "Context-aware code completions for test automation.",
        title: "Smart Code Suggestions",
        intro: "Enter your code snippet, language, testing framework, and objective to get AI-powered code suggestions.",
        flow: FlowKind::SmartCodeSuggestions,
        inputs: &[
            input("codeSnippet", "Code Snippet (Optional)", "Enter your current code snippet...", "", true),
            input("language", "Programming Language", "e.g., JavaScript, Python", "JavaScript", false),
            input("testingFramework", "Testing Framework", "e.g., Selenium, Cypress, Jest", "Jest", false),
            input("objective", "Objective", "e.g., Click the login button, Assert API response", "", false),
        ],
        fixed: &[],
        results: &[
            code("suggestedCode", "Suggested Code:"),
            prose("explanation", "Explanation:"),
        ],
        results_heading: "AI Suggestion:",
        submit_label: "Get Suggestions",
        empty_result: None,
    },
    Feature {
        key: FeatureKey::BugDetection,
        label: "Bug Detection",
        icon: "🐞",
        description: "Identify bugs with clear explanations.",
        title: "Bug Detection & Explanation",
        intro: "Provide your code and a bug report to get an AI-powered explanation and suggested fix.",
        flow: FlowKind::ExplainBug,
        inputs: &[
            input("code", "Code", "Enter the code containing the bug...", "", true),
            input("bugReport", "Bug Report", "Describe the bug or paste the bug report...", "", true),
        ],
        fixed: &[],
        results: &[
            prose("explanation", "Bug Explanation:"),
            code("suggestedFix", "Suggested Fix:"),
        ],
        results_heading: "AI Analysis:",
        submit_label: "Detect Bug",
        empty_result: None,
    },
    Feature {
        key: FeatureKey::AutoFix,
        label: "Auto-Fix",
        icon: "🔧",
        description: "Suggest fixes for bugs or inefficient code.",
        title: "Auto-Fix Capability",
        intro: "Provide code and a description of the issue to get AI-driven suggestions for fixes.",
        flow: FlowKind::SuggestCodeFix,
        inputs: &[
            input("code", "Code to Fix", "Paste the problematic code here...", "", true),
            input("description", "Issue Description", "Describe the bug, inefficiency, or desired change...", "", true),
        ],
        fixed: &[],
        results: &[
            code("fixedCode", "Fixed Code:"),
            prose("explanation", "Explanation:"),
        ],
        results_heading: "AI Suggested Fix:",
        submit_label: "Suggest Fix",
        empty_result: None,
    },
    Feature {
        key: FeatureKey::TestCaseGeneration,
        label: "Test Case Generation",
        icon: "📄",
        description: "Automatically generate test cases from code.",
        title: "Test Case Generation",
        intro: "Provide code, language, and testing framework to automatically generate test cases.",
        flow: FlowKind::GenerateTestCases,
        inputs: &[
            input("code", "Code", "Paste the code to generate tests for...", "", true),
            input("language", "Programming Language", "e.g., JavaScript, Python", "JavaScript", false),
            input("testingFramework", "Testing Framework", "e.g., Jest, PyTest, JUnit", "Jest", false),
        ],
        fixed: &[],
        results: &[code("testCases", "Test Cases:")],
        results_heading: "Generated Test Cases:",
        submit_label: "Generate Test Cases",
        empty_result: None,
    },
    Feature {
        key: FeatureKey::NaturalLanguageQuery,
        label: "Natural Language Query",
        icon: "🧠",
        description: "Ask coding questions in natural language.",
        title: "Natural Language Query",
        intro: "Ask coding or testing related questions in plain English. For example: \"How do I test this API?\" or \"Fix this brittle selector for element X\".",
        flow: FlowKind::SmartCodeSuggestions,
        inputs: &[input("objective", "Your Question", "Type your question here...", "", true)],
        fixed: &[("codeSnippet", ""), ("language", "general"), ("testingFramework", "any")],
        results: &[
            code("suggestedCode", "Suggestion / Code:"),
            prose("explanation", "Explanation:"),
        ],
        results_heading: "AI Response:",
        submit_label: "Ask AI",
        empty_result: Some(
            "The AI did not provide a specific code suggestion or explanation for this query.",
        ),
    },
];

pub fn feature(key: FeatureKey) -> &'static Feature {
    &FEATURES[key.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_matches_keys() {
        for key in FeatureKey::all() {
            assert_eq!(feature(key).key, key);
            assert_eq!(FeatureKey::from_name(key.as_str()), Some(key));
        }
    }

    #[test]
    fn test_every_request_field_is_covered() {
        for f in FEATURES.iter() {
            let schema = f.flow.input_schema();
            for name in schema.field_names() {
                let shown = f.input(name).is_some();
                let fixed = f.fixed.iter().any(|(n, _)| *n == name);
                assert!(shown ^ fixed, "{} field {} must be an input or fixed", f.label, name);
            }
            for input in f.inputs {
                assert!(schema.field(input.name).is_some(), "{} has stray input {}", f.label, input.name);
            }
        }
    }

    #[test]
    fn test_result_views_name_declared_fields() {
        for f in FEATURES.iter() {
            let schema = f.flow.output_schema();
            for view in f.results {
                assert!(schema.field(view.field).is_some(), "{} shows unknown {}", f.label, view.field);
            }
        }
    }

    #[test]
    fn test_form_defaults() {
        let f = feature(FeatureKey::TestCaseGeneration);
        assert_eq!(f.input("language").unwrap().default, "JavaScript");
        assert_eq!(f.input("testingFramework").unwrap().default, "Jest");
    }
}
