//! Partial-update plumbing.
//!
//! A patch field is either absent from the request body, explicitly `null`,
//! or carries a value. Absent fields are never written; `null` clears a
//! nullable field and is rejected for the rest.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::store::Body;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Absent => Field::Absent,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(f(v)),
        }
    }
}

// Only invoked when the key is present; `#[serde(default)]` covers absence.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Value(value),
            None => Field::Null,
        })
    }
}

/// Field-level validation failures, keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub HashMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Collects the `$set` document for one update while recording validation errors.
#[derive(Debug, Default)]
pub struct PatchBuilder {
    set: Body,
    errors: FieldErrors,
}

impl PatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A field that may be cleared with `null`.
    pub fn nullable<T: Serialize>(&mut self, name: &str, field: Field<T>) -> &mut Self {
        match field {
            Field::Absent => {}
            Field::Null => {
                self.set.insert(name.to_string(), Value::Null);
            }
            Field::Value(v) => self.put(name, v),
        }
        self
    }

    /// A field that always holds a value once created.
    pub fn required<T: Serialize>(&mut self, name: &str, field: Field<T>) -> &mut Self {
        match field {
            Field::Absent => {}
            Field::Null => self.errors.add(name, "cannot be null"),
            Field::Value(v) => self.put(name, v),
        }
        self
    }

    /// Validates a present value before it is written.
    pub fn check<T>(
        &mut self,
        name: &str,
        field: &Field<T>,
        check: impl FnOnce(&T) -> Result<(), String>,
    ) -> &mut Self {
        if let Field::Value(v) = field {
            if let Err(message) = check(v) {
                self.errors.add(name, message);
            }
        }
        self
    }

    pub fn put<T: Serialize>(&mut self, name: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.set.insert(name.to_string(), v);
            }
            Err(e) => self.errors.add(name, e.to_string()),
        }
    }

    pub fn error(&mut self, name: &str, message: impl Into<String>) {
        self.errors.add(name, message);
    }

    pub fn has_changes(&self) -> bool {
        !self.set.is_empty()
    }

    pub fn finish(self) -> Result<Body, FieldErrors> {
        self.errors.into_result()?;
        Ok(self.set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default)]
        title: Field<String>,
        #[serde(default)]
        description: Field<String>,
        #[serde(default)]
        count: Field<i64>,
    }

    #[test]
    fn distinguishes_absent_null_and_value() {
        let sample: Sample =
            serde_json::from_value(json!({ "title": "x", "description": null })).unwrap();
        assert_eq!(sample.title, Field::Value("x".to_string()));
        assert_eq!(sample.description, Field::Null);
        assert_eq!(sample.count, Field::Absent);
    }

    #[test]
    fn builder_writes_only_present_fields() {
        let mut patch = PatchBuilder::new();
        patch
            .required("title", Field::Value("x"))
            .nullable("description", Field::<String>::Null)
            .nullable("deadline", Field::<String>::Absent);

        let set = patch.finish().unwrap();
        assert_eq!(Value::Object(set), json!({ "title": "x", "description": null }));
    }

    #[test]
    fn null_on_required_field_is_an_error() {
        let mut patch = PatchBuilder::new();
        patch.required("title", Field::<String>::Null);

        let errors = patch.finish().unwrap_err();
        assert_eq!(errors.0.get("title").map(String::as_str), Some("cannot be null"));
    }

    #[test]
    fn empty_patch_has_no_changes() {
        let patch = PatchBuilder::new();
        assert!(!patch.has_changes());
        assert!(patch.finish().unwrap().is_empty());
    }
}
