use anyhow::Result;
use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::security::{CredentialStore, PasswordHasher2, TokenService};
use crate::storage::Store;

/// Shared by every handler through `State<Arc<AppState>>`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub credentials: CredentialStore,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Result<Self> {
        let tokens = TokenService::new(&config.auth)?;
        let hasher = PasswordHasher2::new(&config.password)?;
        let credentials = CredentialStore::new(Arc::clone(&store), hasher)?;

        Ok(Self {
            store,
            tokens,
            credentials,
            config,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.store.backend_name())
            .finish_non_exhaustive()
    }
}
