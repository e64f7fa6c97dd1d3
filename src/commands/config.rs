use std::path::Path;

use crate::services::config_service::{self, Config};

/// Stored configuration with the API key masked.
pub fn get_config(data_dir: &Path) -> Result<Config, String> {
    config_service::get_effective_config(data_dir)
        .map(|config| config.redacted())
        .map_err(|e| e.to_string())
}

pub fn set_api_key(data_dir: &Path, key: &str) -> Result<(), String> {
    if key.trim().is_empty() {
        return Err("API key must not be empty".to_string());
    }
    config_service::set_api_key(data_dir, key.trim()).map_err(|e| e.to_string())
}

pub fn set_base_url(data_dir: &Path, url: &str) -> Result<(), String> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("Base URL must start with http:// or https://, got '{}'", url));
    }
    config_service::set_base_url(data_dir, url).map_err(|e| e.to_string())
}

pub fn set_model(data_dir: &Path, model: &str) -> Result<(), String> {
    if model.trim().is_empty() {
        return Err("Model name must not be empty".to_string());
    }
    config_service::set_model(data_dir, model.trim()).map_err(|e| e.to_string())
}

pub fn set_request_timeout(data_dir: &Path, secs: u64) -> Result<(), String> {
    if secs == 0 {
        return Err("Timeout must be at least one second".to_string());
    }
    config_service::set_request_timeout(data_dir, secs).map_err(|e| e.to_string())
}
