use anyhow::{bail, Context};
use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::database::{DocumentStore, PgStore};

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    if config.store.backend != StoreBackend::Postgres {
        bail!("migrate requires STORE_BACKEND=postgres");
    }

    let store = PgStore::connect(&config.store)
        .await
        .context("failed to connect to PostgreSQL")?;
    store
        .ensure_schema()
        .await
        .context("failed to create collections")?;
    store.close().await;

    info!("Migration complete");
    Ok(())
}
