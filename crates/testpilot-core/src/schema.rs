//! Request and result schemas
//!
//! Every flow declares two schemas: one for its request and one for its result.
//! Validation runs over a [`FieldSource`], so the same rules apply to typed
//! records built by the UI and to objects decoded from model output.

use std::collections::BTreeMap;

use crate::error::ValidationError;

/// How a field must appear in a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Present, a string, and not blank
    Required,
    /// May be absent; defaults to an empty string
    Optional,
    /// Present and a string, but may be empty
    Declared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub presence: Presence,
}

impl FieldSpec {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self { name, description, presence: Presence::Required }
    }

    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self { name, description, presence: Presence::Optional }
    }

    pub const fn declared(name: &'static str, description: &'static str) -> Self {
        Self { name, description, presence: Presence::Declared }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

/// A field as seen by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Missing,
    Text(&'a str),
    /// Present but not a string; carries the kind that was found
    Other(&'static str),
}

/// Anything the validator can look fields up in
pub trait FieldSource {
    fn lookup(&self, name: &str) -> FieldValue<'_>;
}

/// Validated field values keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    values: BTreeMap<&'static str, String>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: impl Into<String>) {
        self.values.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Remove a value; absent fields come back empty
    pub fn take(&mut self, name: &str) -> String {
        self.values.remove(name).unwrap_or_default()
    }
}

impl FieldSource for Fields {
    fn lookup(&self, name: &str) -> FieldValue<'_> {
        match self.values.get(name) {
            Some(v) => FieldValue::Text(v),
            None => FieldValue::Missing,
        }
    }
}

/// A typed request or result record
pub trait Record: Sized {
    fn schema() -> &'static Schema;

    /// Value of a declared field
    fn field(&self, name: &str) -> Option<&str>;

    /// Build the record from field values; missing fields become empty strings
    fn from_fields(fields: Fields) -> Self;

    /// Declared fields paired with their values, in schema order
    fn entries(&self) -> Vec<(&'static FieldSpec, &str)> {
        Self::schema()
            .fields
            .iter()
            .map(|spec| (spec, self.field(spec.name).unwrap_or_default()))
            .collect()
    }
}

struct RecordSource<'a, R: Record>(&'a R);

impl<R: Record> FieldSource for RecordSource<'_, R> {
    fn lookup(&self, name: &str) -> FieldValue<'_> {
        match self.0.field(name) {
            Some(v) => FieldValue::Text(v),
            None => FieldValue::Missing,
        }
    }
}

/// Check `source` against `schema`, returning the declared fields only
pub fn validate(schema: &'static Schema, source: &impl FieldSource) -> Result<Fields, ValidationError> {
    let mut fields = Fields::new();

    for spec in schema.fields {
        match (source.lookup(spec.name), spec.presence) {
            (FieldValue::Missing, Presence::Optional) => fields.insert(spec.name, ""),
            (FieldValue::Missing, _) => {
                return Err(ValidationError::Missing {
                    schema: schema.name,
                    field: spec.name,
                })
            }
            (FieldValue::Other(found), _) => {
                return Err(ValidationError::WrongType {
                    schema: schema.name,
                    field: spec.name,
                    found,
                })
            }
            (FieldValue::Text(value), Presence::Required) if value.trim().is_empty() => {
                return Err(ValidationError::Empty {
                    schema: schema.name,
                    field: spec.name,
                })
            }
            (FieldValue::Text(value), _) => fields.insert(spec.name, value),
        }
    }

    Ok(fields)
}

/// Validate a typed record against its own schema
pub fn check<R: Record>(record: &R) -> Result<(), ValidationError> {
    validate(R::schema(), &RecordSource(record)).map(|_| ())
}

/// Implements [`Record`] for a struct of `String` fields
macro_rules! impl_record {
    ($ty:ty, $schema:expr, { $($field:ident => $name:literal),+ $(,)? }) => {
        impl $crate::schema::Record for $ty {
            fn schema() -> &'static $crate::schema::Schema {
                &$schema
            }

            fn field(&self, name: &str) -> Option<&str> {
                match name {
                    $($name => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }

            fn from_fields(mut fields: $crate::schema::Fields) -> Self {
                Self {
                    $($field: fields.take($name),)+
                }
            }
        }
    };
}

pub(crate) use impl_record;

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_SCHEMA: Schema = Schema {
        name: "TestInput",
        fields: &[
            FieldSpec::required("code", "The code."),
            FieldSpec::optional("note", "An optional note."),
            FieldSpec::declared("answer", "May be empty."),
        ],
    };

    struct MapSource(Vec<(&'static str, FieldValue<'static>)>);

    impl FieldSource for MapSource {
        fn lookup(&self, name: &str) -> FieldValue<'_> {
            self.0
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| *v)
                .unwrap_or(FieldValue::Missing)
        }
    }

    #[test]
    fn test_optional_defaults_to_empty() {
        let source = MapSource(vec![
            ("code", FieldValue::Text("x = 1")),
            ("answer", FieldValue::Text("")),
        ]);
        let fields = validate(&TEST_SCHEMA, &source).unwrap();
        assert_eq!(fields.get("note"), Some(""));
        assert_eq!(fields.get("answer"), Some(""));
    }

    #[test]
    fn test_required_blank_is_rejected() {
        let source = MapSource(vec![
            ("code", FieldValue::Text("   \n")),
            ("answer", FieldValue::Text("ok")),
        ]);
        let err = validate(&TEST_SCHEMA, &source).unwrap_err();
        assert_eq!(err, ValidationError::Empty { schema: "TestInput", field: "code" });
    }

    #[test]
    fn test_declared_must_be_present() {
        let source = MapSource(vec![("code", FieldValue::Text("x"))]);
        let err = validate(&TEST_SCHEMA, &source).unwrap_err();
        assert_eq!(err.field(), Some("answer"));
        assert!(matches!(err, ValidationError::Missing { .. }));
    }

    #[test]
    fn test_non_string_is_not_coerced() {
        let source = MapSource(vec![
            ("code", FieldValue::Text("x")),
            ("answer", FieldValue::Other("number")),
        ]);
        let err = validate(&TEST_SCHEMA, &source).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongType { schema: "TestInput", field: "answer", found: "number" }
        );
    }

    #[test]
    fn test_only_declared_fields_are_returned() {
        let mut source = Fields::new();
        source.insert("code", "x");
        source.insert("answer", "y");
        source.insert("extra", "z");
        let fields = validate(&TEST_SCHEMA, &source).unwrap();
        assert_eq!(fields.get("extra"), None);
    }
}
