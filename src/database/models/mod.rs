pub mod goal;
pub mod note;
pub mod routine;
pub mod task;
pub mod user;

pub use goal::{Goal, Milestone, Period};
pub use note::Note;
pub use routine::{Category, Routine};
pub use task::{Priority, Task};
pub use user::User;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::patch::{Field, FieldErrors, PatchBuilder};
use super::store::{Body, Collection, DatabaseError, Document};

/// A user-owned document kind served by the generic repository.
///
/// Implementors describe where they live, how they sort, and how create and
/// patch payloads turn into stored fields. Everything else (ownership
/// scoping, ids, timestamps) is handled once in `Repository`.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Human-readable singular name used in error messages.
    const LABEL: &'static str;
    /// Timestamp field `list` orders by, newest first.
    const SORT_FIELD: &'static str = "createdAt";
    /// Whether the kind carries an `updatedAt` refreshed on every update.
    const TRACKS_UPDATES: bool = false;
    /// Fields a patch only fills in while empty. Once stored, a value is kept
    /// until a patch clears it with `null`.
    const KEEP_FIRST: &'static [&'static str] = &[];

    type Create: DeserializeOwned + Send + 'static;
    type Patch: DeserializeOwned + Default + Send + 'static;

    /// Validated body of a new document, with defaults applied. Timestamps
    /// are added by the repository.
    fn new_body(input: Self::Create, now: DateTime<Utc>) -> Result<Body, FieldErrors>;

    /// The fields a patch sets. Empty means nothing to change.
    fn patch_body(input: Self::Patch, now: DateTime<Utc>) -> Result<Body, FieldErrors>;

    fn from_document(doc: Document) -> Result<Self, DatabaseError> {
        let mut body = doc.body;
        body.insert("id".to_string(), Value::String(doc.id.to_string()));

        serde_json::from_value(Value::Object(body)).map_err(|e| DatabaseError::Corrupt {
            collection: Self::COLLECTION.as_str(),
            message: e.to_string(),
        })
    }
}

/// Writes a trimmed, non-blank string.
pub(crate) fn put_text(doc: &mut PatchBuilder, name: &str, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        doc.error(name, "must not be blank");
    } else {
        doc.put(name, trimmed);
    }
}

/// Patch counterpart of [`put_text`] for a non-nullable text field.
pub(crate) fn patch_text(doc: &mut PatchBuilder, name: &str, field: Field<String>) {
    match field {
        Field::Value(v) => put_text(doc, name, &v),
        other => {
            doc.required(name, other);
        }
    }
}

/// Optional free text: trimmed, and blank collapses to null.
pub(crate) fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Patch counterpart of [`optional_text`]: a blank value clears the field.
pub(crate) fn nullable_text(field: Field<String>) -> Field<String> {
    match field {
        Field::Value(v) => match optional_text(Some(v)) {
            Some(trimmed) => Field::Value(trimmed),
            None => Field::Null,
        },
        other => other,
    }
}
