//! GoGear API server: gear catalog, user gear registrations and containers
//! over SQLite, behind Google sign-in and service-issued bearer tokens.

use std::sync::Arc;

use shared::types::AuthConfig;

pub mod auth;
pub mod database;
pub mod handlers;
pub mod tower_middle;

use auth::{IdentityVerifier, TokenIssuer};
use database::Database;

/// Everything a handler needs. Cheap to clone; built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenIssuer>,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(db: Database, auth: &AuthConfig, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            db,
            tokens: Arc::new(TokenIssuer::from_config(auth)),
            identity,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}
