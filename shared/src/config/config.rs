use std::fs;
use tracing::{debug, error, info, warn};

use crate::types::server_config::{AppConfig, ConfigError};

const KNOWN_LOG_LEVELS: [&str; 5] = ["debug", "info", "warning", "warn", "error"];

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(&contents)?;

    info!("Configuration loaded successfully");

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.database.file.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "database.file cannot be empty".into(),
        ));
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::InvalidConfig(
            "database.max_connections must be greater than 0".into(),
        ));
    }

    let level = config.server.log_level.trim().to_ascii_lowercase();
    if !KNOWN_LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::InvalidConfig(format!(
            "unknown log_level '{}'",
            config.server.log_level
        )));
    }

    // A missing secret only disables token operations; the rest of the
    // service (health, startup) keeps working.
    if config.auth.resolved_jwt_secret().is_none() {
        warn!("JWT secret is empty; authentication will fail until configured");
    }

    if !config.auth.google_configured() {
        warn!(
            client_id_set = !config.auth.google_client_id.trim().is_empty(),
            redirect_url = %config.auth.google_redirect_url,
            "Google OAuth configuration incomplete"
        );
    }

    Ok(())
}
