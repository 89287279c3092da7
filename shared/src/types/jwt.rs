use serde::{Deserialize, Serialize};

/// Claims embedded in every service token.
///
/// Tokens are stateless: nothing is stored server-side, so a token stays
/// usable until `exp` even if the user record changes. Privileges are
/// re-evaluated on `/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    /// Numeric user id as a string, or the e-mail address when the user
    /// has no id yet.
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Absent when no audience is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,

    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// The `aud` claim may be a single string or a list of strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn single(aud: impl Into<String>) -> Self {
        Audience::Many(vec![aud.into()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Audience::One(aud) => std::slice::from_ref(aud),
            Audience::Many(auds) => auds,
        };
        values.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, aud: &str) -> bool {
        self.iter().any(|a| a.trim() == aud)
    }
}

impl JwtClaims {
    pub fn audiences(&self) -> Vec<&str> {
        self.aud
            .as_ref()
            .map(|a| a.iter().collect())
            .unwrap_or_default()
    }
}
