use std::sync::Arc;

use rift_agents::{AnthropicProvider, ConversationEngine, EngineConfig, LlmProvider, match_tools};
use rift_common::{Error, Result};
use rift_config::AppConfig;
use rift_db::{MatchRepository, SqliteMatchRepository, TimelineStore};
use tokio::sync::Mutex;
use tracing::info;

use crate::state::AppState;

/// Engine settings derived from the `llm` and `agent` config sections.
pub fn engine_config(config: &AppConfig) -> EngineConfig {
    EngineConfig {
        model: config.llm.model.clone(),
        max_tokens: config.llm.max_tokens,
        temperature: Some(config.llm.temperature),
        max_iterations: config.agent.max_iterations,
        model_timeout: config.agent.model_timeout(),
        concurrent_tool_dispatch: config.agent.concurrent_tool_dispatch,
        agent_name: config.agent.name.clone(),
    }
}

/// Build the configured model provider.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.llm.provider.as_str() {
        "anthropic" => {
            let api_key = config
                .llm
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    Error::Config(
                        "llm.api_key is not set (or set ANTHROPIC_API_KEY)".to_string(),
                    )
                })?;
            let mut provider = AnthropicProvider::new(api_key);
            if let Some(base_url) = &config.llm.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        other => Err(Error::Config(format!("unsupported llm.provider: {other}"))),
    }
}

/// Open the timeline database and wrap it as a paging repository.
pub fn open_repository(config: &AppConfig) -> Result<Arc<dyn MatchRepository>> {
    let path = config.database.resolved_path();
    let store = TimelineStore::open(&path)?;
    info!(path = %path.display(), "opened timeline store");
    let repository =
        SqliteMatchRepository::new(Arc::new(Mutex::new(store)), config.database.page_size)?;
    Ok(Arc::new(repository))
}

/// Assemble the engine and shared state from `config` and an already-built provider.
pub fn build_state(
    config: AppConfig,
    provider: Arc<dyn LlmProvider>,
    repository: Option<Arc<dyn MatchRepository>>,
) -> AppState {
    let registry = Arc::new(match_tools(repository));
    info!(tools = ?registry.names(), provider = provider.provider_id(), "tool catalog ready");
    let engine = ConversationEngine::new(provider, registry, engine_config(&config));
    AppState::new(config, Arc::new(engine))
}
