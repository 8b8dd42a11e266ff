use std::path::{Path, PathBuf};

use rift_common::{Error, Result};
use tracing::{debug, info, warn};

use crate::model::AppConfig;

const CONFIG_FILE_NAME: &str = "config.yml";

/// `~/.rift-copilot`, or `.rift-copilot` when no home directory is known.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".rift-copilot"))
        .unwrap_or_else(|| PathBuf::from(".rift-copilot"))
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    /// Environment overrides are applied before validation.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let default_path = config_dir().join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::read_file(&default_path)?
                } else {
                    debug!(
                        "no config file at {}, using defaults",
                        default_path.display()
                    );
                    AppConfig::default()
                }
            }
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<AppConfig> {
        info!("loading config from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        if raw.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        serde_yaml::from_str(&raw)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }
}

/// Apply `RIFT_*` and `ANTHROPIC_API_KEY` overrides using `lookup` to read variables.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(host) = non_empty("RIFT_GATEWAY_HOST") {
        config.gateway.host = host;
    }
    if let Some(port) = non_empty("RIFT_GATEWAY_PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.gateway.port = port,
            Err(_) => warn!("ignoring invalid RIFT_GATEWAY_PORT value '{}'", port),
        }
    }
    if let Some(model) = non_empty("RIFT_LLM_MODEL") {
        config.llm.model = model;
    }
    if let Some(path) = non_empty("RIFT_DATABASE_PATH") {
        config.database.path = Some(PathBuf::from(path));
    }
    let file_key_missing = config
        .llm
        .api_key
        .as_deref()
        .is_none_or(|key| key.trim().is_empty());
    if file_key_missing {
        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            config.llm.api_key = Some(key);
        }
    }
}
