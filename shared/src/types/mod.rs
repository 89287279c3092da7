pub mod auth;
pub mod health;
pub mod json_error;
pub mod jwt;
pub mod pagination;
pub mod server_config;

pub use self::auth::{GoogleCallbackRequest, TokenEnvelope, TokenUser};
pub use self::health::Health;
pub use self::json_error::{ErrorResponse, StatusResponse};
pub use self::jwt::{Audience, JwtClaims};
pub use self::pagination::{PageRequest, PaginationError, ResponsePayload};
pub use self::server_config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, ServerConfig};
