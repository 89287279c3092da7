use thiserror::Error;

/// Failures while authenticating a request or issuing a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("invalid Authorization header format")]
    MalformedHeader,

    #[error("empty bearer token")]
    EmptyToken,

    #[error("token has expired")]
    Expired,

    #[error("token not valid yet")]
    NotYetValid,

    #[error("invalid token audience")]
    WrongAudience,

    #[error("invalid token issuer")]
    WrongIssuer,

    #[error("invalid token")]
    Invalid,

    #[error("subject claim missing")]
    MissingSubject,

    #[error("user not found")]
    UnknownSubject,

    #[error("missing Google credentials")]
    MissingCredentials,

    #[error("invalid Google token")]
    ExternalRejected,

    #[error("Google token missing email")]
    MissingEmail,

    /// The authorization code could not be exchanged; carries the upstream
    /// detail for logs.
    #[error("unable to exchange authorization code")]
    Exchange(String),

    #[error("missing id_token in Google response")]
    MissingIdToken,

    #[error("unable to reach Google: {0}")]
    Upstream(String),

    /// Server-side misconfiguration, e.g. no signing secret.
    #[error("{0}")]
    Configuration(String),
}

impl AuthError {
    pub fn not_configured(what: &str) -> Self {
        AuthError::Configuration(format!("{} not configured", what))
    }
}
