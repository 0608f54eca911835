use std::sync::Arc;

use uuid::Uuid;

use crate::auth::expiring::{ExpiringMap, SWEEP_INTERVAL};
use crate::config::Config;
use crate::store::Store;

/// Shared per-request state. Cloning is cheap; everything inside is shared.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Session token -> member id.
    pub sessions: ExpiringMap<String, Uuid>,
    /// Password-reset token -> member id.
    pub reset_tokens: ExpiringMap<String, Uuid>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            sessions: ExpiringMap::new(config.session_ttl),
            reset_tokens: ExpiringMap::new(config.reset_token_ttl),
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn spawn_sweepers(&self) {
        self.sessions.spawn_sweeper("sessions", SWEEP_INTERVAL);
        self.reset_tokens.spawn_sweeper("reset_tokens", SWEEP_INTERVAL);
    }
}
