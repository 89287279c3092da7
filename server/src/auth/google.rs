//! Google Sign-In: authorization-code exchange and ID token verification.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tracing::{debug, warn};

use shared::types::AuthConfig;

use super::error::AuthError;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Claims read from a verified identity token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExternalIdentity {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

impl ExternalIdentity {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    /// `name`, else given and family name, else the e-mail address.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        let joined = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            return joined;
        }

        self.email().unwrap_or_default().to_string()
    }
}

/// Verifies identities issued by an external provider.
pub trait IdentityVerifier: Send + Sync {
    /// Trade an authorization code for an identity token.
    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<String, AuthError>>;

    /// Check an identity token and return its claims.
    fn verify<'a>(&'a self, id_token: &'a str)
    -> BoxFuture<'a, Result<ExternalIdentity, AuthError>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}

/// Talks to Google's OAuth endpoints. Configured once at startup.
#[derive(Clone)]
pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl std::fmt::Debug for GoogleVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleVerifier")
            .field("client_id", &self.client_id)
            .field("redirect_url", &self.redirect_url)
            .finish_non_exhaustive()
    }
}

impl GoogleVerifier {
    pub fn from_config(auth: &AuthConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            client_id: auth.google_client_id.trim().to_string(),
            client_secret: auth.google_client_secret.trim().to_string(),
            redirect_url: auth.google_redirect_url.trim().to_string(),
        })
    }

    fn ensure_configured(&self) -> Result<(), AuthError> {
        if self.client_id.is_empty() {
            return Err(AuthError::not_configured("Google authentication"));
        }
        Ok(())
    }

    async fn exchange(&self, code: &str) -> Result<String, AuthError> {
        self.ensure_configured()?;
        if self.redirect_url.is_empty() {
            return Err(AuthError::not_configured("Google redirect URL"));
        }

        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Google code exchange rejected");
            return Err(AuthError::Exchange(format!("token endpoint returned {}", status)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        body.id_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::MissingIdToken)
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        self.client
            .get(GOOGLE_CERTS_URL)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::Upstream(e.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))
    }

    async fn verify_token(&self, id_token: &str) -> Result<ExternalIdentity, AuthError> {
        self.ensure_configured()?;

        let header = decode_header(id_token).map_err(|_| AuthError::ExternalRejected)?;
        let kid = header.kid.ok_or(AuthError::ExternalRejected)?;

        let keys = self.fetch_keys().await?;
        let jwk = keys.find(&kid).ok_or_else(|| {
            warn!(kid = %kid, "No Google signing key matches token");
            AuthError::ExternalRejected
        })?;
        let key = DecodingKey::from_jwk(jwk).map_err(|_| AuthError::ExternalRejected)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<ExternalIdentity>(id_token, &key, &validation).map_err(|e| {
            warn!(error = %e, "Google ID token rejected");
            AuthError::ExternalRejected
        })?;

        debug!(sub = %data.claims.sub, "Verified Google identity");
        Ok(data.claims)
    }
}

impl IdentityVerifier for GoogleVerifier {
    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<String, AuthError>> {
        Box::pin(self.exchange(code))
    }

    fn verify<'a>(
        &'a self,
        id_token: &'a str,
    ) -> BoxFuture<'a, Result<ExternalIdentity, AuthError>> {
        Box::pin(self.verify_token(id_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ExternalIdentity {
        ExternalIdentity {
            sub: "1089".into(),
            email: Some("hiker@example.com".into()),
            ..Default::default()
        }
    }

    #[test]
    fn display_name_prefers_full_name() {
        let mut id = identity();
        id.name = Some("Ada Hiker".into());
        id.given_name = Some("Ada".into());
        assert_eq!(id.display_name(), "Ada Hiker");
    }

    #[test]
    fn display_name_joins_given_and_family() {
        let mut id = identity();
        id.name = Some("  ".into());
        id.given_name = Some("Ada".into());
        id.family_name = Some("Hiker".into());
        assert_eq!(id.display_name(), "Ada Hiker");

        id.family_name = None;
        assert_eq!(id.display_name(), "Ada");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        assert_eq!(identity().display_name(), "hiker@example.com");
    }

    #[tokio::test]
    async fn unconfigured_client_is_a_configuration_error() {
        let verifier = GoogleVerifier::from_config(&AuthConfig::default()).unwrap();
        assert!(matches!(
            verifier.exchange_code("abc").await,
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            verifier.verify("a.b.c").await,
            Err(AuthError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_before_fetching_keys() {
        let verifier = GoogleVerifier::from_config(&AuthConfig {
            google_client_id: "client".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            verifier.verify("not-a-jwt").await,
            Err(AuthError::ExternalRejected)
        );
    }
}
