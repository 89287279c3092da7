use serde::{Deserialize, Serialize};

/// Liveness payload served by `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub status: String,
    pub name: String,
    pub updated: String,
    pub documentation: String,
}

impl Health {
    pub fn ok(updated: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            name: "GoGear-api".to_string(),
            updated: updated.into(),
            documentation: "https://github.com/Sea-Shell/gogear-api".to_string(),
        }
    }
}
