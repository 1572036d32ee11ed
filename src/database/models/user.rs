use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::database::store::{Body, Collection, DatabaseError, Document};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Stored body for a new account. `email` must already be normalized.
    pub fn new_body(email: &str, name: Option<String>, password_hash: String, now: DateTime<Utc>) -> Body {
        let mut body = Body::new();
        body.insert("email".to_string(), Value::from(email));
        body.insert("name".to_string(), name.map_or(Value::Null, Value::from));
        body.insert("passwordHash".to_string(), Value::from(password_hash));
        body.insert("createdAt".to_string(), Value::from(now.to_rfc3339()));
        body
    }

    pub fn from_document(doc: Document) -> Result<Self, DatabaseError> {
        let mut body = doc.body;
        body.insert("id".to_string(), Value::String(doc.id.to_string()));

        serde_json::from_value(Value::Object(body)).map_err(|e| DatabaseError::Corrupt {
            collection: Collection::Users.as_str(),
            message: e.to_string(),
        })
    }
}
