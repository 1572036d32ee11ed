pub mod memory;
pub mod models;
pub mod patch;
pub mod postgres;
pub mod repository;
pub mod store;

pub use memory::MemoryStore;
pub use patch::{Field, FieldErrors};
pub use postgres::PgStore;
pub use repository::{Repository, RepositoryError};
pub use store::{Collection, DatabaseError, Document, DocumentStore, Filter, Update};

use std::sync::Arc;
use tracing::info;

use crate::config::{StoreBackend, StoreConfig};

/// Opens the configured store, creating PostgreSQL collections if missing.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
    match config.backend {
        StoreBackend::Postgres => {
            let store = PgStore::connect(config).await?;
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Using in-memory document store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
