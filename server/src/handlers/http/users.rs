//! User endpoints. Members may read everyone but only change themselves;
//! admins may change anyone.

use bytes::Bytes;
use hyper::{Request, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

use shared::types::StatusResponse;

use crate::AppState;
use crate::auth::AuthContext;
use crate::database::descriptor::Record;
use crate::database::filter::Filter;
use crate::database::mapper::{decode_payload, fetch_by_id};
use crate::database::models::User;
use crate::database::users::{delete_user_cascade, set_password};
use crate::database::utils::{hash_password, is_strong_password};
use crate::handlers::http::crud;
use crate::handlers::http::error::ApiError;
use crate::handlers::http::routes::Reply;
use crate::handlers::http::utils::{deliver_serialized_json, id_values, path_id, query, text_values};

#[derive(Debug, Deserialize)]
struct PasswordChange {
    password: String,
}

fn ensure_self_or_admin(ctx: &AuthContext, user_id: i64) -> Result<(), ApiError> {
    if ctx.is_admin || ctx.is_user(user_id) {
        return Ok(());
    }
    warn!(subject = %ctx.subject, user_id, "Refused change to another user");
    Err(ApiError::forbidden())
}

/// `user` ids, `username` and `name` substrings, all ORed.
pub async fn handle_list(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let pairs = query(&req);
    let filter = Filter::any()
        .eq_each("userId", id_values(&pairs, "user")?)
        .like_each("userUsername", text_values(&pairs, "username"))
        .like_each("userName", text_values(&pairs, "name"));
    crud::list_filtered::<User>(&state, req.uri().path(), &pairs, filter).await
}

pub async fn handle_get(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::get_one::<User>(&state, id).await
}

pub async fn handle_update(req: Request<Bytes>, state: AppState, ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    ensure_self_or_admin(&ctx, id)?;

    let mut user = decode_payload::<User>(req.body())?;
    user.set_id(id);

    if !ctx.is_admin {
        let mut conn = state.db.acquire().await?;
        let stored = fetch_by_id::<User>(&mut conn, id).await?;
        if stored.user_is_admin != user.user_is_admin {
            warn!(user_id = id, "Non-admin tried to change admin flag");
            return Err(ApiError::Forbidden(
                "Only admins may change admin status".to_string(),
            ));
        }
    }

    crud::update_stored(&state, &user).await
}

pub async fn handle_set_password(
    req: Request<Bytes>,
    state: AppState,
    ctx: AuthContext,
) -> Reply {
    let id = path_id(&req, "id")?;
    ensure_self_or_admin(&ctx, id)?;

    let change: PasswordChange = serde_json::from_slice(req.body())
        .map_err(|e| ApiError::bad_request(format!("invalid payload: {}", e)))?;
    if !is_strong_password(&change.password) {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters and contain letters and numbers",
        ));
    }

    let hash = hash_password(&change.password)?;
    let mut conn = state.db.acquire().await?;
    set_password(&mut conn, id, &hash).await?;

    info!(user_id = id, "Password changed");
    Ok(deliver_serialized_json(
        &StatusResponse::success(),
        StatusCode::OK,
    )?)
}

/// Removes the user together with their gear registrations and container
/// links.
pub async fn handle_delete(req: Request<Bytes>, state: AppState, ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    ensure_self_or_admin(&ctx, id)?;

    let deleted = delete_user_cascade(&state.db, id).await?;
    Ok(deliver_serialized_json(&deleted, StatusCode::OK)?)
}

pub async fn handle_insert(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    crud::insert_one::<User>(&state, req.body()).await
}
