use std::path::PathBuf;
use std::time::Duration;

use rift_common::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub llm: LlmProviderConfig,
    pub agent: AgentConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for one chat turn, model calls and tools included.
    pub request_timeout_secs: u64,
    pub cors_allow_any: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            request_timeout_secs: 60,
            cors_allow_any: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmProviderConfig {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-5-sonnet-latest".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    pub max_iterations: usize,
    pub model_timeout_secs: u64,
    pub concurrent_tool_dispatch: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Rift Copilot".to_string(),
            max_iterations: 5,
            model_timeout_secs: 30,
            concurrent_tool_dispatch: true,
        }
    }
}

impl AgentConfig {
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub page_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            page_size: 200,
        }
    }
}

impl DatabaseConfig {
    /// Configured database path, falling back to `~/.rift-copilot/timelines.db`.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            crate::loader::config_dir().join("timelines.db")
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            return Err(Error::Config("agent.max_iterations must be at least 1".into()));
        }
        if self.agent.model_timeout_secs == 0 {
            return Err(Error::Config("agent.model_timeout_secs must be positive".into()));
        }
        if self.gateway.request_timeout_secs == 0 {
            return Err(Error::Config(
                "gateway.request_timeout_secs must be positive".into(),
            ));
        }
        if self.database.page_size == 0 {
            return Err(Error::Config("database.page_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "llm.temperature must be within [0, 1], got {}",
                self.llm.temperature
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(Error::Config("llm.model must not be empty".into()));
        }
        Ok(())
    }
}
