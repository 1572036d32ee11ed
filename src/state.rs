use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::{DocumentStore, Repository};
use crate::database::models::Resource;
use crate::services::user_service::UserRegistry;

/// Shared handles every request works against. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub users: UserRegistry,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        let tokens = TokenService::from_config(&config.security);
        Self {
            users: UserRegistry::new(store.clone(), tokens),
            store,
            config: Arc::new(config),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        self.users.tokens()
    }

    /// Repository for `R` scoped to one owner.
    pub fn repository<R: Resource>(&self, owner: uuid::Uuid) -> Repository<R> {
        Repository::new(self.store.clone(), owner)
    }
}
