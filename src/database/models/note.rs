use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{patch_text, put_text, Resource};
use crate::database::patch::{Field, FieldErrors, PatchBuilder};
use crate::database::store::{Body, Collection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNote {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateNote {
    pub title: Field<String>,
    pub content: Field<String>,
    pub tags: Field<Vec<String>>,
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl Resource for Note {
    const COLLECTION: Collection = Collection::Notes;
    const LABEL: &'static str = "Note";
    const SORT_FIELD: &'static str = "updatedAt";
    const TRACKS_UPDATES: bool = true;

    type Create = CreateNote;
    type Patch = UpdateNote;

    fn new_body(input: CreateNote, _now: DateTime<Utc>) -> Result<Body, FieldErrors> {
        let mut doc = PatchBuilder::new();
        put_text(&mut doc, "title", &input.title);
        put_text(&mut doc, "content", &input.content);
        doc.put("tags", clean_tags(input.tags));
        doc.finish()
    }

    fn patch_body(input: UpdateNote, _now: DateTime<Utc>) -> Result<Body, FieldErrors> {
        let mut doc = PatchBuilder::new();
        patch_text(&mut doc, "title", input.title);
        patch_text(&mut doc, "content", input.content);
        doc.required("tags", input.tags.map(clean_tags));
        doc.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_are_trimmed_and_blank_ones_dropped() {
        let input: CreateNote = serde_json::from_value(json!({
            "title": "Ideas",
            "content": "some",
            "tags": [" work ", "", "home"]
        }))
        .unwrap();

        let body = Note::new_body(input, Utc::now()).unwrap();
        assert_eq!(body["tags"], json!(["work", "home"]));
    }

    #[test]
    fn content_is_required() {
        let parsed = serde_json::from_value::<CreateNote>(json!({ "title": "Ideas" }));
        assert!(parsed.is_err());

        let patch: UpdateNote = serde_json::from_value(json!({ "content": null })).unwrap();
        assert!(Note::patch_body(patch, Utc::now()).is_err());
    }
}
