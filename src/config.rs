use crate::error::{Result, SplitterError};
use serde::Deserialize;
use std::fs;

/// Environment variable carrying the personal auth token for the base host.
pub const PERSONAL_TOKEN_ENV: &str = "BASE_PERSONAL_TOKEN";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub base: BaseConfig,
}

/// Connection settings for the hosted base platform.
#[derive(Debug, Deserialize)]
pub struct BaseConfig {
    /// Root URL of the base REST surface, e.g. `https://base.example.com/api/v1/bases/<base_id>`.
    pub url: String,
    /// App-level token appended to requests when the host requires one.
    pub app_token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            SplitterError::Config(format!("Failed to read config file '{path}': {e}"))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        if config.base.url.trim().is_empty() {
            return Err(SplitterError::Config("base.url must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Personal auth token, sourced from the environment (dotenv is loaded in main).
    pub fn personal_token(&self) -> Result<String> {
        let token = std::env::var(PERSONAL_TOKEN_ENV)?;
        if token.trim().is_empty() {
            return Err(SplitterError::Config(format!(
                "{PERSONAL_TOKEN_ENV} is set but empty"
            )));
        }
        Ok(token)
    }
}
