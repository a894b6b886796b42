//! Application state.

use std::sync::Arc;

use gravmap_store::Store;

use crate::auth::RevocationList;
use crate::config::ServiceConfig;

/// Application state shared across handlers.
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Process-wide revoked-token set.
    pub revoked: RevocationList,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        Self {
            store,
            config,
            revoked: RevocationList::new(),
        }
    }
}
