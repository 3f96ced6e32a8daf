//! Application state shared across handlers.

use std::sync::Arc;

use emporium_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Application state shared across all handlers.
///
/// Cheap to clone: everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: Database,
    jwt: JwtManager,
    config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.token_secret.clone(), config.token_lifetime_secs);
        AppState {
            inner: Arc::new(AppStateInner { db, jwt, config }),
        }
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.inner.jwt
    }

    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }
}
