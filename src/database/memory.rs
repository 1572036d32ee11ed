use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{
    timestamp_field, Body, Collection, DatabaseError, Document, DocumentStore, Filter, Update,
};

/// In-process document store for tests and local development.
///
/// Each collection is guarded by one lock, so `update_one` runs its match and
/// mutation inside a single write critical section.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn unique_conflict<'a>(
        mut docs: impl Iterator<Item = &'a Document>,
        collection: Collection,
        body: &Body,
    ) -> Option<&'static str> {
        let field = collection.unique_field()?;
        let value = body.get(field).and_then(Value::as_str)?;
        docs.any(|d| d.body.get(field).and_then(Value::as_str) == Some(value))
            .then_some(field)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn insert(
        &self,
        collection: Collection,
        owner: Option<Uuid>,
        body: Body,
    ) -> Result<Document, DatabaseError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        if let Some(field) = Self::unique_conflict(docs.iter(), collection, &body) {
            return Err(DatabaseError::Duplicate(field));
        }

        let doc = Document {
            id: Uuid::new_v4(),
            owner,
            body,
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn find_owned(
        &self,
        collection: Collection,
        owner: Uuid,
        sort_field: &'static str,
    ) -> Result<Vec<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| d.owner == Some(owner))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Among equal timestamps the most recent insert comes first.
        docs.reverse();
        docs.sort_by(|a, b| {
            timestamp_field(&b.body, sort_field).cmp(&timestamp_field(&a.body, sort_field))
        });
        Ok(docs)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: Update,
    ) -> Result<Option<Document>, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(None);
        };
        let Some(index) = docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };

        let mut body = docs[index].body.clone();
        update.apply(&mut body);

        if let Update::Set { fields, .. } = &update {
            let others = docs.iter().enumerate().filter(|(i, _)| *i != index).map(|(_, d)| d);
            if let Some(field) = Self::unique_conflict(others, collection, fields) {
                return Err(DatabaseError::Duplicate(field));
            }
        }

        docs[index].body = body;
        Ok(Some(docs[index].clone()))
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<bool, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
