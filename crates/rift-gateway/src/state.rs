use std::sync::Arc;
use std::time::Duration;

use rift_agents::ConversationEngine;
use rift_config::AppConfig;

/// Shared state for all request handlers.
pub struct AppState {
    pub config: AppConfig,
    pub engine: Arc<ConversationEngine>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig, engine: Arc<ConversationEngine>) -> Self {
        Self { config, engine }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.gateway.request_timeout_secs)
    }
}
