//! Configuration management utilities

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Load variables from a `.env` file in the working directory (or a parent).
///
/// Returns the path that was loaded, if any. A missing file is not an error.
pub fn load_env() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Failed to parse .env file: {e}");
            None
        }
    }
}

/// Application-level settings shared by every crate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "stock-advisor".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl AppConfig {
    /// Build from `STOCK_ADVISOR_ENV`, keeping defaults for anything unset
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(env) = std::env::var("STOCK_ADVISOR_ENV") {
            config.environment = env;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.app_name, "stock-advisor");
        assert_eq!(config.environment, "development");
    }
}
