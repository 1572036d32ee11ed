use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::store::{Body, Collection, DatabaseError, Document, DocumentStore, Filter, Update};
use crate::config::{redact_url, StoreConfig};

type DocumentRow = (Uuid, Option<Uuid>, Json<Body>);

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed document store: one table per collection, each row an
/// `(id, owner, body jsonb)` triple.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects, verifies the connection and makes sure every collection exists.
    pub async fn connect(config: &StoreConfig) -> Result<Self, DatabaseError> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| DatabaseError::Unavailable("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;

        info!("Connected to document store at {}", redact_url(url));

        let store = Self { pool };
        store.ping().await?;
        Ok(store)
    }

    /// Creates collection tables and indexes if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        for collection in Collection::ALL {
            let table = collection.as_str();
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    owner UUID,
                    body JSONB NOT NULL DEFAULT '{{}}'::jsonb
                )"
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {table}_owner_idx ON {table} (owner)"
            ))
            .execute(&self.pool)
            .await?;

            if let Some(field) = collection.unique_field() {
                sqlx::query(&format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS {table}_{field}_key ON {table} ((body->>'{field}'))"
                ))
                .execute(&self.pool)
                .await?;
            }

            info!("Collection ready: {}", table);
        }
        Ok(())
    }

    fn where_clause(filter: &Filter) -> &'static str {
        match filter {
            Filter::Id(_) => "id = $1",
            Filter::Owned { .. } => "id = $1 AND owner = $2",
            Filter::Field { .. } => "body->>$1 = $2",
        }
    }

    /// Binds the filter's parameters starting at `$1`.
    fn bind_filter<'q, O>(
        query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
        filter: &'q Filter,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
        match filter {
            Filter::Id(id) => query.bind(*id),
            Filter::Owned { id, owner } => query.bind(*id).bind(*owner),
            Filter::Field { name, value } => query.bind(*name).bind(value.as_str()),
        }
    }

    fn param_count(filter: &Filter) -> usize {
        match filter {
            Filter::Id(_) => 1,
            Filter::Owned { .. } | Filter::Field { .. } => 2,
        }
    }
}

fn into_document((id, owner, Json(body)): DocumentRow) -> Document {
    Document { id, owner, body }
}

fn map_write_error(err: sqlx::Error, collection: Collection) -> DatabaseError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            if let Some(field) = collection.unique_field() {
                return DatabaseError::Duplicate(field);
            }
        }
    }
    DatabaseError::Sqlx(err)
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn insert(
        &self,
        collection: Collection,
        owner: Option<Uuid>,
        body: Body,
    ) -> Result<Document, DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (owner, body) VALUES ($1, $2) RETURNING id, owner, body",
            collection.as_str()
        );

        sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(owner)
            .bind(Json(body))
            .fetch_one(&self.pool)
            .await
            .map(into_document)
            .map_err(|e| map_write_error(e, collection))
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, DatabaseError> {
        let sql = format!(
            "SELECT id, owner, body FROM {} WHERE {} LIMIT 1",
            collection.as_str(),
            Self::where_clause(filter)
        );

        let row = Self::bind_filter(sqlx::query_as::<_, DocumentRow>(&sql), filter)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(into_document))
    }

    async fn find_owned(
        &self,
        collection: Collection,
        owner: Uuid,
        sort_field: &'static str,
    ) -> Result<Vec<Document>, DatabaseError> {
        let sql = format!(
            "SELECT id, owner, body FROM {} WHERE owner = $1
             ORDER BY (body->>$2)::timestamptz DESC NULLS LAST",
            collection.as_str()
        );

        let docs: Vec<Document> = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(owner)
            .bind(sort_field)
            .fetch(&self.pool)
            .map_ok(into_document)
            .try_collect()
            .await?;
        Ok(docs)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: Update,
    ) -> Result<Option<Document>, DatabaseError> {
        let table = collection.as_str();
        let next = Self::param_count(filter) + 1;

        let row = match &update {
            Update::Set { fields, fill } => {
                // Fill keys are kept only where the stored value is missing or null.
                let sql = format!(
                    "UPDATE {table} SET body = body
                        || COALESCE((
                            SELECT jsonb_object_agg(f.key, f.value)
                            FROM jsonb_each(${fill}::jsonb) AS f
                            WHERE COALESCE(body->f.key, 'null'::jsonb) = 'null'::jsonb
                        ), '{{}}'::jsonb)
                        || ${set}::jsonb
                    WHERE {} RETURNING id, owner, body",
                    Self::where_clause(filter),
                    fill = next,
                    set = next + 1,
                );
                Self::bind_filter(sqlx::query_as::<_, DocumentRow>(&sql), filter)
                    .bind(Json(fill))
                    .bind(Json(fields))
                    .fetch_optional(&self.pool)
                    .await
            }
            Update::Toggle { field, key } => {
                // Flip in place so two concurrent toggles can never read the same prior value.
                let path = vec![field.to_string(), key.clone()];
                let sql = format!(
                    "UPDATE {table} SET body = jsonb_set(
                        body || jsonb_build_object(${f}::text, COALESCE(body->${f}, '{{}}'::jsonb)),
                        ${p}::text[],
                        to_jsonb(NOT COALESCE((body #>> ${p}::text[])::boolean, false)),
                        true
                    ) WHERE {} RETURNING id, owner, body",
                    Self::where_clause(filter),
                    f = next,
                    p = next + 1,
                );
                Self::bind_filter(sqlx::query_as::<_, DocumentRow>(&sql), filter)
                    .bind(*field)
                    .bind(path)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(|e| map_write_error(e, collection))?;

        Ok(row.map(into_document))
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<bool, DatabaseError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} RETURNING id, owner, body",
            collection.as_str(),
            Self::where_clause(filter)
        );

        let row = Self::bind_filter(sqlx::query_as::<_, DocumentRow>(&sql), filter)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed document store pool");
    }
}
