use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{nullable_text, optional_text, patch_text, put_text, Resource};
use crate::database::patch::{Field, FieldErrors, PatchBuilder};
use crate::database::store::{Body, Collection};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTask {
    pub title: Field<String>,
    pub description: Field<String>,
    pub deadline: Field<String>,
    pub priority: Field<Priority>,
    pub completed: Field<bool>,
}

impl Resource for Task {
    const COLLECTION: Collection = Collection::Tasks;
    const LABEL: &'static str = "Task";
    const KEEP_FIRST: &'static [&'static str] = &["completedAt"];

    type Create = CreateTask;
    type Patch = UpdateTask;

    fn new_body(input: CreateTask, now: DateTime<Utc>) -> Result<Body, FieldErrors> {
        let mut doc = PatchBuilder::new();
        put_text(&mut doc, "title", &input.title);
        doc.put("description", optional_text(input.description));
        doc.put("deadline", optional_text(input.deadline));
        doc.put("priority", input.priority);
        doc.put("completed", input.completed);
        doc.put("completedAt", input.completed.then_some(now));
        doc.finish()
    }

    fn patch_body(input: UpdateTask, now: DateTime<Utc>) -> Result<Body, FieldErrors> {
        let mut doc = PatchBuilder::new();
        patch_text(&mut doc, "title", input.title);
        doc.nullable("description", nullable_text(input.description))
            .nullable("deadline", nullable_text(input.deadline))
            .required("priority", input.priority);

        if let Field::Value(completed) = input.completed {
            doc.put("completed", completed);
            doc.put("completedAt", completed.then_some(now));
        } else {
            doc.required("completed", input.completed);
        }

        doc.finish()
    }
}
