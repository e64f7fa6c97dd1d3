use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["TACTICAL_TERMINAL_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Replaces the built-in persona when set.
    #[serde(default)]
    pub persona: Option<String>,
}

impl Config {
    pub fn effective_base_url(&self) -> String {
        non_blank(&self.base_url).unwrap_or(DEFAULT_BASE_URL).to_string()
    }

    pub fn effective_model(&self) -> String {
        non_blank(&self.model).unwrap_or(DEFAULT_MODEL).to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn has_api_key(&self) -> bool {
        non_blank(&self.api_key).is_some()
    }

    /// Copy with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.api_key = config.api_key.as_ref().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() <= 4 {
                return "****".to_string();
            }
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("****{}", tail)
        });
        config
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn get_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}

pub fn load_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let config_path = get_config_path(data_dir);

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path).map_err(ConfigError::Read)?;
    serde_json::from_str(&content).map_err(ConfigError::Parse)
}

pub fn save_config(data_dir: &Path, config: &Config) -> Result<(), ConfigError> {
    if !data_dir.exists() {
        fs::create_dir_all(data_dir).map_err(|e| ConfigError::Write(e.to_string()))?;
    }
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| ConfigError::Write(format!("Failed to serialize config: {}", e)))?;
    fs::write(get_config_path(data_dir), content).map_err(|e| ConfigError::Write(e.to_string()))?;
    Ok(())
}

fn update_config(data_dir: &Path, apply: impl FnOnce(&mut Config)) -> Result<(), ConfigError> {
    let mut config = load_config(data_dir).unwrap_or_default();
    apply(&mut config);
    save_config(data_dir, &config)
}

pub fn set_api_key(data_dir: &Path, key: &str) -> Result<(), ConfigError> {
    update_config(data_dir, |config| config.api_key = Some(key.to_string()))
}

pub fn set_base_url(data_dir: &Path, url: &str) -> Result<(), ConfigError> {
    update_config(data_dir, |config| config.base_url = Some(url.to_string()))
}

pub fn set_model(data_dir: &Path, model: &str) -> Result<(), ConfigError> {
    update_config(data_dir, |config| config.model = Some(model.to_string()))
}

pub fn set_request_timeout(data_dir: &Path, secs: u64) -> Result<(), ConfigError> {
    update_config(data_dir, |config| config.request_timeout_secs = Some(secs))
}

/// Stored config with the API key taken from the environment when set there.
pub fn get_effective_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let config = load_config(data_dir)?;
    Ok(apply_env_overrides(config, |name| std::env::var(name).ok()))
}

fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(key) = API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(*name))
        .find(|value| !value.trim().is_empty())
    {
        config.api_key = Some(key);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.effective_model(), DEFAULT_MODEL);
        assert_eq!(config.effective_base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn setters_keep_other_fields() {
        let temp = TempDir::new().unwrap();
        set_api_key(temp.path(), "sk-123456").unwrap();
        set_model(temp.path(), "gpt-4o-mini").unwrap();
        set_request_timeout(temp.path(), 15).unwrap();

        let config = load_config(temp.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-123456"));
        assert_eq!(config.effective_model(), "gpt-4o-mini");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn unparseable_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(get_config_path(temp.path()), "{ nope").unwrap();
        assert!(matches!(load_config(temp.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn environment_key_wins_over_stored_key() {
        let config = Config {
            api_key: Some("stored".into()),
            ..Config::default()
        };
        let overridden = apply_env_overrides(config.clone(), |name| {
            (name == "API_KEY").then(|| "from-env".to_string())
        });
        assert_eq!(overridden.api_key.as_deref(), Some("from-env"));

        let untouched = apply_env_overrides(config, |_| Some("   ".to_string()));
        assert_eq!(untouched.api_key.as_deref(), Some("stored"));
    }

    #[test]
    fn redaction_keeps_last_four() {
        let config = Config {
            api_key: Some("sk-abcdef1234".into()),
            ..Config::default()
        };
        assert_eq!(config.redacted().api_key.as_deref(), Some("****1234"));
        assert!(config.has_api_key());
    }

    #[test]
    fn short_keys_are_fully_masked() {
        for key in ["abcd", "xy", ""] {
            let config = Config {
                api_key: Some(key.into()),
                ..Config::default()
            };
            assert_eq!(config.redacted().api_key.as_deref(), Some("****"), "{key:?}");
        }
    }
}
