use std::sync::Arc;

use auth::AuthService;
use tour::{ContentService, MemoryStore};

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiters;

/// Shared handler state. Cloning is cheap: the store and limiters are
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    pub content: ContentService<MemoryStore>,
    pub auth: AuthService<MemoryStore>,
    pub config: Arc<ServerConfig>,
    pub limiters: Arc<RateLimiters>,
}

impl AppState {
    pub fn new(store: MemoryStore, config: ServerConfig) -> Self {
        let limiters = RateLimiters::new(&config.rate_limits);
        Self {
            content: ContentService::new(store.clone()),
            auth: AuthService::new(store, config.auth.clone()),
            config: Arc::new(config),
            limiters: Arc::new(limiters),
        }
    }
}
