//! External login and token refresh.

use tracing::{debug, info, warn};

use shared::types::{GoogleCallbackRequest, TokenEnvelope};

use super::error::AuthError;
use super::token::AuthContext;
use crate::AppState;
use crate::database::users::{ExternalProfile, ensure_external_user, resolve_subject};
use crate::handlers::http::error::ApiError;

/// Exchange a Google credential for a service token.
///
/// An identity token (`id_token`, then `credential`) wins over an
/// authorization code. The local account is created on first login.
pub async fn login_with_external_identity(
    state: &AppState,
    request: GoogleCallbackRequest,
    state_param: Option<String>,
) -> Result<TokenEnvelope, ApiError> {
    state.tokens.ensure_configured()?;

    let id_token = match (request.identity_token(), request.authorization_code()) {
        (Some(token), _) => token.to_string(),
        (None, Some(code)) => {
            debug!("Exchanging Google authorization code");
            state.identity.exchange_code(code).await?
        }
        (None, None) => return Err(AuthError::MissingCredentials.into()),
    };

    let identity = state.identity.verify(&id_token).await?;
    let email = identity
        .email()
        .ok_or_else(|| {
            warn!(sub = %identity.sub, "Google identity has no email");
            AuthError::MissingEmail
        })?
        .to_string();

    let profile = ExternalProfile {
        name: identity.display_name(),
        email,
    };

    let mut conn = state.db.acquire().await?;
    let user = ensure_external_user(&mut conn, &profile).await?;
    let issued = state.tokens.issue(&user)?;

    info!(user_id = ?user.user_id, admin = user.user_is_admin, "Google login succeeded");

    let mut envelope = state.tokens.envelope(issued, &user);
    envelope.state = state_param.filter(|s| !s.trim().is_empty());
    Ok(envelope)
}

/// Reissue a token for the caller, re-reading their admin flag.
pub async fn refresh(state: &AppState, ctx: &AuthContext) -> Result<TokenEnvelope, ApiError> {
    let subject = ctx.subject.trim();
    if subject.is_empty() {
        return Err(AuthError::MissingSubject.into());
    }

    let mut conn = state.db.acquire().await?;
    let user = match resolve_subject(&mut conn, subject).await {
        Ok(user) => user,
        Err(err) if err.is_not_found() => {
            warn!(subject, "Refresh for unknown subject");
            return Err(AuthError::UnknownSubject.into());
        }
        Err(err) => return Err(err.into()),
    };

    let issued = state.tokens.issue(&user)?;
    debug!(user_id = ?user.user_id, admin = user.user_is_admin, "Token refreshed");
    Ok(state.tokens.envelope(issued, &user))
}
