//! Prompt templates
//!
//! Templates are static text with `{{field}}` placeholders. Rendering is a
//! single left-to-right pass over the template: substituted values are copied
//! into the output and never scanned again, so a field that itself contains
//! `{{...}}` or stray braces comes through untouched.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::schema::Record;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
}

impl PromptTemplate {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    /// Substitute each placeholder with the record's value for that field.
    ///
    /// Placeholders that name no field of the record are left as written.
    pub fn render<R: Record>(&self, record: &R) -> String {
        placeholder_pattern()
            .replace_all(self.text, |caps: &Captures| match record.field(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for caps in placeholder_pattern().captures_iter(self.text) {
            if let Some(m) = caps.get(1) {
                let name = &self.text[m.start()..m.end()];
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{impl_record, FieldSpec, Schema};

    static NOTE_SCHEMA: Schema = Schema {
        name: "Note",
        fields: &[
            FieldSpec::required("title", "Title."),
            FieldSpec::optional("body", "Body."),
        ],
    };

    struct Note {
        title: String,
        body: String,
    }

    impl_record!(Note, NOTE_SCHEMA, { title => "title", body => "body" });

    const TEMPLATE: PromptTemplate =
        PromptTemplate::new("note", "Title: {{title}}\nBody:\n{{ body }}\nKeep {{unknown}} as is.");

    fn note(title: &str, body: &str) -> Note {
        Note { title: title.to_string(), body: body.to_string() }
    }

    #[test]
    fn test_render_substitutes_fields() {
        let out = TEMPLATE.render(&note("Hello", "World"));
        assert_eq!(out, "Title: Hello\nBody:\nWorld\nKeep {{unknown}} as is.");
    }

    #[test]
    fn test_render_is_deterministic() {
        let n = note("a", "b");
        assert_eq!(TEMPLATE.render(&n), TEMPLATE.render(&n));
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let out = TEMPLATE.render(&note("{{body}}", "fn f() { \"{{title}}\" }"));
        assert!(out.starts_with("Title: {{body}}\n"));
        assert!(out.contains("fn f() { \"{{title}}\" }"));
    }

    #[test]
    fn test_placeholders_listed_once() {
        let t = PromptTemplate::new("t", "{{a}} {{b}} {{a}}");
        assert_eq!(t.placeholders(), vec!["a", "b"]);
        assert_eq!(TEMPLATE.placeholders(), vec!["title", "body", "unknown"]);
    }
}
