use serde::{Deserialize, Serialize};

/// Credentials delivered to the Google callback, either as a JSON body, a
/// form body or query parameters. Any one of them is enough.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GoogleCallbackRequest {
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl GoogleCallbackRequest {
    /// The identity token, preferring `id_token` over `credential`.
    pub fn identity_token(&self) -> Option<&str> {
        non_blank(&self.id_token).or_else(|| non_blank(&self.credential))
    }

    pub fn authorization_code(&self) -> Option<&str> {
        non_blank(&self.code)
    }

    /// Fill any missing field from `other` without overriding what is set.
    pub fn or(self, other: GoogleCallbackRequest) -> Self {
        Self {
            id_token: self.id_token.filter(|s| !s.trim().is_empty()).or(other.id_token),
            credential: self
                .credential
                .filter(|s| !s.trim().is_empty())
                .or(other.credential),
            code: self.code.filter(|s| !s.trim().is_empty()).or(other.code),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Token envelope returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenEnvelope {
    pub token_type: String,
    pub access_token: String,
    pub expires_at: i64,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<TokenUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenUser {
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}
