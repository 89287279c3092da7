use bytes::Bytes;
use hyper::Request;

use crate::AppState;
use crate::auth::AuthContext;
use crate::database::filter::Filter;
use crate::database::mapper::decode_payload;
use crate::database::models::{UserContainer, UserGear};
use crate::handlers::http::crud;
use crate::handlers::http::error::ApiError;
use crate::handlers::http::routes::Reply;
use crate::handlers::http::utils::{path_id, query};

/// Registrations packed into container registration `:id`.
pub async fn handle_list(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let container_id = path_id(&req, "id")?;
    let pairs = query(&req);
    let filter = Filter::all().eq("user_container_registration.userContainerId", container_id);
    crud::list_filtered::<UserGear>(&state, req.uri().path(), &pairs, filter).await
}

pub async fn handle_get(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::get_one::<UserContainer>(&state, id).await
}

/// Pack a registration into a container registration. A registration cannot
/// contain itself.
pub async fn handle_insert(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let link = decode_payload::<UserContainer>(req.body())?;
    if link.user_container_id == link.user_gear_registration_id {
        return Err(ApiError::bad_request(
            "A registration cannot be packed into itself",
        ));
    }
    crud::insert_stored(&state, &link).await
}

pub async fn handle_delete(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::delete_one::<UserContainer>(&state, id).await
}
