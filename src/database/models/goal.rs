use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{nullable_text, optional_text, patch_text, put_text, Resource};
use crate::database::patch::{Field, FieldErrors, PatchBuilder};
use crate::database::store::{Body, Collection};

const MAX_PROGRESS: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    #[default]
    Monthly,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub period: Period,
    pub target_date: Option<String>,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoal {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub period: Period,
    pub target_date: Option<String>,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateGoal {
    pub title: Field<String>,
    pub description: Field<String>,
    pub period: Field<Period>,
    pub target_date: Field<String>,
    pub progress: Field<i64>,
    pub milestones: Field<Vec<Milestone>>,
}

fn check_progress(progress: &i64) -> Result<(), String> {
    if (0..=MAX_PROGRESS).contains(progress) {
        Ok(())
    } else {
        Err(format!("must be between 0 and {}", MAX_PROGRESS))
    }
}

fn check_milestones(milestones: &Vec<Milestone>) -> Result<(), String> {
    match milestones.iter().position(|m| m.title.trim().is_empty()) {
        Some(index) => Err(format!("milestone {} has a blank title", index)),
        None => Ok(()),
    }
}

fn clean_milestones(milestones: Vec<Milestone>) -> Vec<Milestone> {
    milestones
        .into_iter()
        .map(|m| Milestone {
            title: m.title.trim().to_string(),
            completed: m.completed,
        })
        .collect()
}

impl Resource for Goal {
    const COLLECTION: Collection = Collection::Goals;
    const LABEL: &'static str = "Goal";
    const TRACKS_UPDATES: bool = true;

    type Create = CreateGoal;
    type Patch = UpdateGoal;

    fn new_body(input: CreateGoal, _now: DateTime<Utc>) -> Result<Body, FieldErrors> {
        let mut doc = PatchBuilder::new();
        put_text(&mut doc, "title", &input.title);
        doc.put("description", optional_text(input.description));
        doc.put("period", input.period);
        doc.put("targetDate", optional_text(input.target_date));

        let progress = Field::Value(input.progress);
        let milestones = Field::Value(input.milestones);
        doc.check("progress", &progress, check_progress)
            .check("milestones", &milestones, check_milestones)
            .required("progress", progress)
            .required("milestones", milestones.map(clean_milestones));
        doc.finish()
    }

    fn patch_body(input: UpdateGoal, _now: DateTime<Utc>) -> Result<Body, FieldErrors> {
        let mut doc = PatchBuilder::new();
        patch_text(&mut doc, "title", input.title);
        doc.check("progress", &input.progress, check_progress)
            .check("milestones", &input.milestones, check_milestones)
            .nullable("description", nullable_text(input.description))
            .required("period", input.period)
            .nullable("targetDate", nullable_text(input.target_date))
            .required("progress", input.progress)
            .required("milestones", input.milestones.map(clean_milestones));
        doc.finish()
    }
}
