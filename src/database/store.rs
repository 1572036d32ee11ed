use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// JSON object body of a stored document.
pub type Body = Map<String, Value>;

/// Errors from a document store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate value for unique field '{0}'")]
    Duplicate(&'static str),

    #[error("Corrupt document in {collection}: {message}")]
    Corrupt {
        collection: &'static str,
        message: String,
    },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One collection per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Tasks,
    Notes,
    Goals,
    Routines,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Tasks,
        Collection::Notes,
        Collection::Goals,
        Collection::Routines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Tasks => "tasks",
            Collection::Notes => "notes",
            Collection::Goals => "goals",
            Collection::Routines => "routines",
        }
    }

    /// Top-level body field that must be unique across the collection.
    pub fn unique_field(&self) -> Option<&'static str> {
        match self {
            Collection::Users => Some("email"),
            _ => None,
        }
    }
}

/// A stored document: store-assigned id, optional owning user, JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub owner: Option<Uuid>,
    pub body: Body,
}

/// Selects at most one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Id(Uuid),
    /// Matches only if the document exists *and* belongs to `owner`.
    Owned { id: Uuid, owner: Uuid },
    /// Exact match on a top-level string field.
    Field { name: &'static str, value: String },
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Id(id) => doc.id == *id,
            Filter::Owned { id, owner } => doc.id == *id && doc.owner == Some(*owner),
            Filter::Field { name, value } => {
                doc.body.get(*name).and_then(Value::as_str) == Some(value.as_str())
            }
        }
    }
}

/// A single-document mutation applied atomically by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Merge `fields` into the body. Each `fill` field is written only where
    /// the stored value is missing or null.
    Set { fields: Body, fill: Body },
    /// Flip the boolean at `body[field][key]`, treating a missing value as false.
    Toggle { field: &'static str, key: String },
}

impl Update {
    pub fn set(fields: Body) -> Self {
        Update::Set {
            fields,
            fill: Body::new(),
        }
    }

    /// Applies the mutation to an in-memory body.
    pub fn apply(&self, body: &mut Body) {
        match self {
            Update::Set { fields, fill } => {
                for (k, v) in fill {
                    if body.get(k).map_or(true, Value::is_null) {
                        body.insert(k.clone(), v.clone());
                    }
                }
                for (k, v) in fields {
                    body.insert(k.clone(), v.clone());
                }
            }
            Update::Toggle { field, key } => {
                let entry = body
                    .entry(field.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                if let Value::Object(map) = entry {
                    let current = map.get(key).and_then(Value::as_bool).unwrap_or(false);
                    map.insert(key.clone(), Value::Bool(!current));
                }
            }
        }
    }
}

/// Parses an RFC 3339 timestamp field for ordering; missing or malformed sorts last.
pub fn timestamp_field(body: &Body, field: &str) -> Option<DateTime<Utc>> {
    body.get(field)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// The injectable store handle every repository works against.
///
/// Every method touches a single document (or a single owner's slice of one
/// collection), and `update_one` is atomic: the filter check and the mutation
/// happen in one store operation.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Inserts a document and returns it with its assigned id.
    async fn insert(
        &self,
        collection: Collection,
        owner: Option<Uuid>,
        body: Body,
    ) -> Result<Document, DatabaseError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, DatabaseError>;

    /// All documents owned by `owner`, newest first by the timestamp in `sort_field`.
    async fn find_owned(
        &self,
        collection: Collection,
        owner: Uuid,
        sort_field: &'static str,
    ) -> Result<Vec<Document>, DatabaseError>;

    /// Applies `update` to the matching document, returning the new state.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: Update,
    ) -> Result<Option<Document>, DatabaseError>;

    /// Removes the matching document. Returns whether one was removed.
    async fn delete_one(&self, collection: Collection, filter: &Filter)
        -> Result<bool, DatabaseError>;

    async fn close(&self) {}
}
