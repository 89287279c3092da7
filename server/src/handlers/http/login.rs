use bytes::Bytes;
use hyper::{Request, StatusCode, header};
use tracing::info;

use shared::types::GoogleCallbackRequest;
use shared::types::pagination::query_pairs;

use crate::AppState;
use crate::auth::AuthContext;
use crate::auth::login::{login_with_external_identity, refresh};
use crate::handlers::http::error::ApiError;
use crate::handlers::http::routes::Reply;
use crate::handlers::http::utils::{deliver_serialized_json, query, text_value};

fn from_pairs(pairs: &[(String, String)]) -> GoogleCallbackRequest {
    GoogleCallbackRequest {
        id_token: text_value(pairs, "id_token").map(str::to_string),
        credential: text_value(pairs, "credential").map(str::to_string),
        code: text_value(pairs, "code").map(str::to_string),
    }
}

fn is_form(req: &Request<Bytes>) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// Credentials and `state` from the body (JSON or form) and the query
/// string. Body values win.
fn read_callback(req: &Request<Bytes>) -> Result<(GoogleCallbackRequest, Option<String>), ApiError> {
    let pairs = query(req);
    let from_query = from_pairs(&pairs);
    let mut state = text_value(&pairs, "state").map(str::to_string);

    let body = req.body();
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok((from_query, state));
    }

    let from_body = if is_form(req) {
        let form = query_pairs(std::str::from_utf8(body).ok());
        if state.is_none() {
            state = text_value(&form, "state").map(str::to_string);
        }
        from_pairs(&form)
    } else {
        serde_json::from_slice::<GoogleCallbackRequest>(body)
            .map_err(|e| ApiError::bad_request(format!("invalid payload: {}", e)))?
    };

    Ok((from_body.or(from_query), state))
}

/// `GET|POST /auth/google/callback`
pub async fn handle_google_callback(req: Request<Bytes>, state: AppState) -> Reply {
    let (callback, state_param) = read_callback(&req)?;
    info!("Processing Google callback");

    let envelope = login_with_external_identity(&state, callback, state_param).await?;
    Ok(deliver_serialized_json(&envelope, StatusCode::OK)?)
}

/// `POST /auth/refresh`
pub async fn handle_refresh(_req: Request<Bytes>, state: AppState, ctx: AuthContext) -> Reply {
    let envelope = refresh(&state, &ctx).await?;
    Ok(deliver_serialized_json(&envelope, StatusCode::OK)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, content_type: Option<&str>, body: &str) -> Request<Bytes> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Bytes::from(body.to_string())).unwrap()
    }

    #[test]
    fn query_only_callback() {
        let req = request("/auth/google/callback?code=abc&state=s1", None, "");
        let (callback, state) = read_callback(&req).unwrap();
        assert_eq!(callback.authorization_code(), Some("abc"));
        assert_eq!(state.as_deref(), Some("s1"));
    }

    #[test]
    fn json_body_wins_over_query() {
        let req = request(
            "/auth/google/callback?credential=from-query",
            Some("application/json"),
            r#"{"credential":"from-body"}"#,
        );
        let (callback, _) = read_callback(&req).unwrap();
        assert_eq!(callback.identity_token(), Some("from-body"));
    }

    #[test]
    fn form_body_is_read() {
        let req = request(
            "/auth/google/callback",
            Some("application/x-www-form-urlencoded; charset=utf-8"),
            "credential=tok&state=xyz",
        );
        let (callback, state) = read_callback(&req).unwrap();
        assert_eq!(callback.identity_token(), Some("tok"));
        assert_eq!(state.as_deref(), Some("xyz"));
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let req = request("/auth/google/callback", Some("application/json"), "{oops");
        assert!(matches!(read_callback(&req), Err(ApiError::BadRequest(_))));
    }
}
