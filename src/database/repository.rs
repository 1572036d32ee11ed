use chrono::Utc;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::database::models::routine::{parse_date_key, COMPLETIONS_FIELD};
use crate::database::models::{Resource, Routine};
use crate::database::patch::FieldErrors;
use crate::database::store::{Body, DatabaseError, DocumentStore, Filter, Update};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Absent or owned by someone else; the two are never told apart.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

impl From<FieldErrors> for RepositoryError {
    fn from(errors: FieldErrors) -> Self {
        RepositoryError::Validation(errors)
    }
}

/// Ownership-scoped CRUD over one resource kind.
///
/// Every read and write is filtered by `owner`, so another user's id behaves
/// exactly like an id that does not exist.
pub struct Repository<R> {
    store: Arc<dyn DocumentStore>,
    owner: Uuid,
    _phantom: PhantomData<R>,
}

impl<R: Resource> Repository<R> {
    pub fn new(store: Arc<dyn DocumentStore>, owner: Uuid) -> Self {
        Self {
            store,
            owner,
            _phantom: PhantomData,
        }
    }

    fn owned(&self, id: Uuid) -> Filter {
        Filter::Owned {
            id,
            owner: self.owner,
        }
    }

    pub async fn list(&self) -> Result<Vec<R>, RepositoryError> {
        let docs = self
            .store
            .find_owned(R::COLLECTION, self.owner, R::SORT_FIELD)
            .await?;

        docs.into_iter()
            .map(|doc| R::from_document(doc).map_err(RepositoryError::from))
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<R, RepositoryError> {
        match self.store.find_one(R::COLLECTION, &self.owned(id)).await? {
            Some(doc) => Ok(R::from_document(doc)?),
            None => Err(RepositoryError::NotFound(R::LABEL)),
        }
    }

    pub async fn create(&self, input: R::Create) -> Result<R, RepositoryError> {
        let now = Utc::now();
        let mut body = R::new_body(input, now)?;

        let stamp = serde_json::to_value(now).unwrap_or(Value::Null);
        body.insert("createdAt".to_string(), stamp.clone());
        if R::TRACKS_UPDATES {
            body.insert("updatedAt".to_string(), stamp);
        }

        let doc = self.store.insert(R::COLLECTION, Some(self.owner), body).await?;
        debug!("Created {} {} for {}", R::LABEL, doc.id, self.owner);
        Ok(R::from_document(doc)?)
    }

    /// Applies the present fields of `input`. A patch that sets nothing
    /// returns the current record untouched.
    pub async fn update(&self, id: Uuid, input: R::Patch) -> Result<R, RepositoryError> {
        let now = Utc::now();
        let mut set = R::patch_body(input, now)?;

        if set.is_empty() {
            return self.get(id).await;
        }
        if R::TRACKS_UPDATES {
            set.insert(
                "updatedAt".to_string(),
                serde_json::to_value(now).unwrap_or(Value::Null),
            );
        }

        let mut fill = Body::new();
        for field in R::KEEP_FIRST {
            match set.remove(*field) {
                Some(Value::Null) => {
                    set.insert(field.to_string(), Value::Null);
                }
                Some(value) => {
                    fill.insert(field.to_string(), value);
                }
                None => {}
            }
        }

        self.apply(id, Update::Set { fields: set, fill }).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        if self.store.delete_one(R::COLLECTION, &self.owned(id)).await? {
            debug!("Deleted {} {} for {}", R::LABEL, id, self.owner);
            Ok(())
        } else {
            Err(RepositoryError::NotFound(R::LABEL))
        }
    }

    async fn apply(&self, id: Uuid, update: Update) -> Result<R, RepositoryError> {
        match self
            .store
            .update_one(R::COLLECTION, &self.owned(id), update)
            .await?
        {
            Some(doc) => Ok(R::from_document(doc)?),
            None => Err(RepositoryError::NotFound(R::LABEL)),
        }
    }
}

impl Repository<Routine> {
    /// Flips `completions[date_key]`, treating a missing entry as not done.
    pub async fn toggle_completion(&self, id: Uuid, date_key: &str) -> Result<Routine, RepositoryError> {
        if let Err(message) = parse_date_key(date_key) {
            let mut errors = FieldErrors::default();
            errors.add("date", message);
            return Err(errors.into());
        }

        self.apply(
            id,
            Update::Toggle {
                field: COMPLETIONS_FIELD,
                key: date_key.to_string(),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::models::{Note, Task};
    use serde_json::json;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryStore::new())
    }

    fn parse<T: serde::de::DeserializeOwned>(v: serde_json::Value) -> T {
        serde_json::from_value(v).unwrap()
    }

    #[tokio::test]
    async fn create_then_list_includes_defaults() {
        let tasks = Repository::<Task>::new(store(), Uuid::new_v4());
        let created = tasks.create(parse(json!({ "title": "buy milk" }))).await.unwrap();

        let listed = tasks.list().await.unwrap();
        assert_eq!(listed, vec![created.clone()]);
        assert!(!created.completed);
        assert_eq!(created.priority, crate::database::models::Priority::Medium);
    }

    #[tokio::test]
    async fn other_owners_see_not_found() {
        let store = store();
        let mine = Repository::<Task>::new(store.clone(), Uuid::new_v4());
        let theirs = Repository::<Task>::new(store, Uuid::new_v4());

        let task = mine.create(parse(json!({ "title": "private" }))).await.unwrap();

        assert!(matches!(theirs.get(task.id).await, Err(RepositoryError::NotFound("Task"))));
        assert!(matches!(
            theirs.update(task.id, parse(json!({ "title": "stolen" }))).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(theirs.delete(task.id).await, Err(RepositoryError::NotFound(_))));
        assert!(theirs.list().await.unwrap().is_empty());

        assert_eq!(mine.get(task.id).await.unwrap().title, "private");
    }

    #[tokio::test]
    async fn empty_update_returns_record_unchanged() {
        let notes = Repository::<Note>::new(store(), Uuid::new_v4());
        let note = notes
            .create(parse(json!({ "title": "a", "content": "b" })))
            .await
            .unwrap();

        let same = notes.update(note.id, parse(json!({}))).await.unwrap();
        assert_eq!(same, note);
    }

    #[tokio::test]
    async fn update_refreshes_updated_at_and_reorders_notes() {
        let notes = Repository::<Note>::new(store(), Uuid::new_v4());
        let first = notes
            .create(parse(json!({ "title": "first", "content": "x" })))
            .await
            .unwrap();
        notes
            .create(parse(json!({ "title": "second", "content": "x" })))
            .await
            .unwrap();

        let edited = notes
            .update(first.id, parse(json!({ "content": "edited" })))
            .await
            .unwrap();
        assert!(edited.updated_at >= first.updated_at);
        assert_eq!(edited.created_at, first.created_at);

        let titles: Vec<_> = notes.list().await.unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles[0], "first");
    }

    #[tokio::test]
    async fn completed_at_is_stamped_once_per_completion() {
        let tasks = Repository::<Task>::new(store(), Uuid::new_v4());
        let task = tasks
            .create(parse(json!({ "title": "t", "completed": true })))
            .await
            .unwrap();
        let stamped = task.completed_at.unwrap();

        let again = tasks
            .update(task.id, parse(json!({ "completed": true, "title": "renamed" })))
            .await
            .unwrap();
        assert_eq!(again.completed_at, Some(stamped));
        assert_eq!(again.title, "renamed");

        let reopened = tasks.update(task.id, parse(json!({ "completed": false }))).await.unwrap();
        assert_eq!(reopened.completed_at, None);

        let redone = tasks.update(task.id, parse(json!({ "completed": true }))).await.unwrap();
        assert!(redone.completed_at.is_some());
    }

    #[tokio::test]
    async fn toggle_flips_and_validates_date() {
        let routines = Repository::<Routine>::new(store(), Uuid::new_v4());
        let routine = routines.create(parse(json!({ "title": "Stretch" }))).await.unwrap();

        let on = routines.toggle_completion(routine.id, "2024-01-01").await.unwrap();
        assert_eq!(on.completions.get("2024-01-01"), Some(&true));
        let off = routines.toggle_completion(routine.id, "2024-01-01").await.unwrap();
        assert_eq!(off.completions.get("2024-01-01"), Some(&false));

        assert!(matches!(
            routines.toggle_completion(routine.id, "not-a-date").await,
            Err(RepositoryError::Validation(_))
        ));
        assert!(matches!(
            routines.toggle_completion(Uuid::new_v4(), "2024-01-01").await,
            Err(RepositoryError::NotFound("Routine"))
        ));
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let tasks = Repository::<Task>::new(store(), Uuid::new_v4());
        let task = tasks.create(parse(json!({ "title": "x" }))).await.unwrap();

        tasks.delete(task.id).await.unwrap();
        assert!(matches!(tasks.delete(task.id).await, Err(RepositoryError::NotFound(_))));
        assert!(tasks.list().await.unwrap().is_empty());
    }
}
