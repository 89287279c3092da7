//! Service token issue and validation.
//!
//! Tokens are HS256 JWTs signed with one shared secret. They are never
//! stored: validation is a pure function of the token and the config.

use chrono::{Duration, Utc};
use hyper::header::{AUTHORIZATION, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};

use shared::types::{Audience, AuthConfig, JwtClaims, TokenEnvelope, TokenUser};

use super::error::AuthError;
use crate::database::models::User;

pub const TOKEN_TYPE: &str = "Bearer";

/// An access token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
    pub expires_in: i64,
}

/// What a validated token grants.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub subject: String,
    pub is_admin: bool,
    pub claims: JwtClaims,
}

impl AuthContext {
    /// True when the token was issued for `user_id`.
    pub fn is_user(&self, user_id: i64) -> bool {
        self.subject.trim() == user_id.to_string()
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: Option<String>,
    issuer: String,
    audience: String,
    admin_audience: String,
    expiry_minutes: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("admin_audience", &self.admin_audience)
            .field("expiry_minutes", &self.expiry_minutes)
            .finish()
    }
}

impl TokenIssuer {
    pub fn from_config(auth: &AuthConfig) -> Self {
        let issuer = Self {
            secret: auth.resolved_jwt_secret(),
            issuer: auth.jwt_issuer.trim().to_string(),
            audience: auth.jwt_audience.trim().to_string(),
            admin_audience: auth.jwt_admin_audience.trim().to_string(),
            expiry_minutes: auth.expiry_minutes(),
        };
        if issuer.secret.is_none() {
            warn!("JWT secret not configured; token endpoints will fail");
        }
        issuer
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or_else(|| AuthError::not_configured("JWT secret"))
    }

    /// Fail early when no signing secret is available.
    pub fn ensure_configured(&self) -> Result<(), AuthError> {
        self.secret().map(|_| ())
    }

    fn audience_for(&self, is_admin: bool) -> Option<String> {
        if is_admin && !self.admin_audience.is_empty() {
            return Some(self.admin_audience.clone());
        }
        (!self.audience.is_empty()).then(|| self.audience.clone())
    }

    /// Sign a token for `user`. Admins get the admin audience in place of the
    /// standard one when it is configured.
    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let secret = self.secret()?;

        let subject = user
            .user_id
            .map(|id| id.to_string())
            .or_else(|| user.email().map(str::to_string))
            .unwrap_or_default();

        let now = Utc::now();
        let expires = now + Duration::minutes(self.expiry_minutes);

        let claims = JwtClaims {
            sub: subject,
            iss: (!self.issuer.is_empty()).then(|| self.issuer.clone()),
            aud: self.audience_for(user.user_is_admin).map(Audience::single),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            nbf: None,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| AuthError::Configuration(format!("failed to sign token: {}", e)))?;

        debug!(sub = %claims.sub, aud = ?claims.aud, "Issued token");

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
            expires_in: claims.exp - claims.iat,
        })
    }

    /// Verify signature, algorithm, expiry, issuer and audience.
    pub fn validate(&self, token: &str) -> Result<AuthContext, AuthError> {
        let secret = self.secret()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        // Audience is checked below against two accepted values.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        if !self.issuer.is_empty() {
            validation.set_issuer(&[self.issuer.as_str()]);
        }

        let data = decode::<JwtClaims>(token, &DecodingKey::from_secret(secret), &validation)
            .map_err(|e| {
                let err = map_jwt_error(e.kind());
                debug!(error = %e, "Token rejected");
                err
            })?;
        let claims = data.claims;

        let accepted: Vec<&str> = [self.audience.as_str(), self.admin_audience.as_str()]
            .into_iter()
            .filter(|a| !a.is_empty())
            .collect();

        let mut is_admin = false;
        if !accepted.is_empty() {
            let matched = claims
                .audiences()
                .into_iter()
                .map(str::trim)
                .find(|aud| accepted.contains(aud))
                .ok_or(AuthError::WrongAudience)?;
            is_admin = !self.admin_audience.is_empty() && matched == self.admin_audience;
        }

        Ok(AuthContext {
            subject: claims.sub.clone(),
            is_admin,
            claims,
        })
    }

    /// Validate the bearer token carried by `headers`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        self.ensure_configured()?;
        let token = bearer_token(headers)?;
        self.validate(token)
    }

    /// Wrap an issued token in the response envelope.
    pub fn envelope(&self, issued: IssuedToken, user: &User) -> TokenEnvelope {
        TokenEnvelope {
            token_type: TOKEN_TYPE.to_string(),
            access_token: issued.token,
            expires_at: issued.expires_at,
            expires_in: issued.expires_in,
            user: Some(TokenUser {
                id: user.user_id,
                email: user.email().unwrap_or_default().to_string(),
                name: user.user_name.clone(),
                is_admin: user.user_is_admin,
            }),
            state: None,
        }
    }
}

fn map_jwt_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::ImmatureSignature => AuthError::NotYetValid,
        ErrorKind::InvalidIssuer => AuthError::WrongIssuer,
        ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => AuthError::WrongIssuer,
        _ => AuthError::Invalid,
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header. The
/// scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    if value.is_empty() {
        return Err(AuthError::MissingHeader);
    }

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case(TOKEN_TYPE) {
        return Err(AuthError::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(token)
}
