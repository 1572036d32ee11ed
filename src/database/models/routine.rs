use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{nullable_text, optional_text, patch_text, put_text, Resource};
use crate::database::patch::{Field, FieldErrors, PatchBuilder};
use crate::database::store::{Body, Collection};

/// Stored field holding the per-day completion map.
pub const COMPLETIONS_FIELD: &str = "completions";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Health,
    Fitness,
    Work,
    Learning,
    Mindfulness,
    Personal,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub completions: BTreeMap<String, bool>,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoutine {
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub completions: BTreeMap<String, bool>,
}

/// Completions are only changed through the toggle route.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateRoutine {
    pub title: Field<String>,
    pub description: Field<String>,
    pub start_time: Field<String>,
    pub end_time: Field<String>,
    pub category: Field<Category>,
    pub active: Field<bool>,
}

fn check_time_of_day(value: &String) -> Result<(), String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| "must be a time of day as HH:MM".to_string())
}

/// Parses a completion key, which must name a calendar day as `YYYY-MM-DD`.
pub fn parse_date_key(key: &str) -> Result<NaiveDate, String> {
    // chrono accepts single-digit months and days; keys must be canonical.
    let date = NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a YYYY-MM-DD date", key))?;
    if date.format("%Y-%m-%d").to_string() != key {
        return Err(format!("'{}' is not a YYYY-MM-DD date", key));
    }
    Ok(date)
}

impl Resource for Routine {
    const COLLECTION: Collection = Collection::Routines;
    const LABEL: &'static str = "Routine";

    type Create = CreateRoutine;
    type Patch = UpdateRoutine;

    fn new_body(input: CreateRoutine, _now: DateTime<Utc>) -> Result<Body, FieldErrors> {
        let mut doc = PatchBuilder::new();
        put_text(&mut doc, "title", &input.title);
        doc.put("description", optional_text(input.description));

        let start = Field::Value(optional_text(input.start_time));
        let end = Field::Value(optional_text(input.end_time));
        doc.check("startTime", &start, |t| t.as_ref().map_or(Ok(()), check_time_of_day))
            .check("endTime", &end, |t| t.as_ref().map_or(Ok(()), check_time_of_day))
            .required("startTime", start)
            .required("endTime", end);

        if let Some(bad) = input.completions.keys().find(|k| parse_date_key(k).is_err()) {
            doc.error(COMPLETIONS_FIELD, format!("'{}' is not a YYYY-MM-DD date", bad));
        }

        doc.put("category", input.category);
        doc.put("active", input.active);
        doc.put(COMPLETIONS_FIELD, input.completions);
        doc.finish()
    }

    fn patch_body(input: UpdateRoutine, _now: DateTime<Utc>) -> Result<Body, FieldErrors> {
        let mut doc = PatchBuilder::new();
        patch_text(&mut doc, "title", input.title);

        let start = nullable_text(input.start_time);
        let end = nullable_text(input.end_time);
        doc.check("startTime", &start, check_time_of_day)
            .check("endTime", &end, check_time_of_day)
            .nullable("description", nullable_text(input.description))
            .nullable("startTime", start)
            .nullable("endTime", end)
            .required("category", input.category)
            .required("active", input.active);
        doc.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn create_defaults() {
        let input: CreateRoutine = serde_json::from_value(json!({ "title": "Stretch" })).unwrap();
        let body = Routine::new_body(input, Utc::now()).unwrap();

        assert_eq!(body["category"], json!("health"));
        assert_eq!(body["active"], json!(true));
        assert_eq!(body["completions"], json!({}));
        assert_eq!(body["startTime"], Value::Null);
    }

    #[test]
    fn times_must_be_hh_mm() {
        let input: CreateRoutine = serde_json::from_value(json!({
            "title": "Stretch",
            "startTime": "07:30",
            "endTime": "7pm"
        }))
        .unwrap();
        let errors = Routine::new_body(input, Utc::now()).unwrap_err();
        assert!(errors.0.contains_key("endTime"));
        assert!(!errors.0.contains_key("startTime"));

        let patch: UpdateRoutine = serde_json::from_value(json!({ "startTime": "25:00" })).unwrap();
        assert!(Routine::patch_body(patch, Utc::now()).is_err());
    }

    #[test]
    fn patch_times_are_trimmed_and_blank_clears() {
        let patch: UpdateRoutine =
            serde_json::from_value(json!({ "startTime": "", "endTime": " 21:30 " })).unwrap();
        let set = Routine::patch_body(patch, Utc::now()).unwrap();
        assert_eq!(set["startTime"], Value::Null);
        assert_eq!(set["endTime"], json!("21:30"));
    }

    #[test]
    fn patch_ignores_completions() {
        let patch: UpdateRoutine =
            serde_json::from_value(json!({ "completions": { "2024-01-01": true } })).unwrap();
        assert!(Routine::patch_body(patch, Utc::now()).unwrap().is_empty());
    }

    #[test]
    fn date_keys_must_be_canonical() {
        assert!(parse_date_key("2024-02-29").is_ok());
        assert!(parse_date_key("2023-02-29").is_err());
        assert!(parse_date_key("2024-1-5").is_err());
        assert!(parse_date_key("yesterday").is_err());
    }

    #[test]
    fn unknown_category_is_rejected_at_parse() {
        let parsed =
            serde_json::from_value::<CreateRoutine>(json!({ "title": "x", "category": "sleep" }));
        assert!(parsed.is_err());
    }
}
