use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file. Created on first start.
    pub file: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public host name, only reported in logs.
    #[serde(default)]
    pub hostname: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// HMAC key used to sign and verify service tokens.
    ///
    /// The `JWT_SECRET` environment variable takes priority over this field.
    /// When neither is set the server still starts, but every token operation
    /// fails with a configuration error.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub jwt_issuer: String,
    #[serde(default)]
    pub jwt_audience: String,
    #[serde(default)]
    pub jwt_admin_audience: String,
    #[serde(default = "default_token_expiry")]
    pub jwt_expiry_minutes: i64,
    #[serde(default)]
    pub google_client_id: String,
    #[serde(default)]
    pub google_client_secret: String,
    #[serde(default)]
    pub google_redirect_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: "gogear.db".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            hostname: String::new(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Full bind address, e.g. `"0.0.0.0:8081"`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Translate the configured level into a `tracing` filter directive.
    /// Unknown names fall back to `info`.
    pub fn log_filter(&self) -> &'static str {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "debug" => "debug",
            "warning" | "warn" => "warn",
            "error" => "error",
            _ => "info",
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret with `JWT_SECRET` env-var taking priority over
    /// the config file field.
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| self.jwt_secret.as_ref().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
    }

    /// Token lifetime in minutes; non-positive values mean the default hour.
    pub fn expiry_minutes(&self) -> i64 {
        if self.jwt_expiry_minutes <= 0 {
            default_token_expiry()
        } else {
            self.jwt_expiry_minutes
        }
    }

    pub fn google_configured(&self) -> bool {
        !self.google_client_id.trim().is_empty() && !self.google_redirect_url.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_bind() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8081
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_max_connections() -> u32 {
    5
}

pub fn default_token_expiry() -> i64 {
    60
}
