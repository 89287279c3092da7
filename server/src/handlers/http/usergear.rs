use bytes::Bytes;
use hyper::{Request, StatusCode};

use crate::AppState;
use crate::auth::AuthContext;
use crate::database::filter::Filter;
use crate::database::models::{UserGear, UserGearLink};
use crate::database::usergear::delete_registration_cascade;
use crate::handlers::http::crud;
use crate::handlers::http::routes::Reply;
use crate::handlers::http::utils::{deliver_serialized_json, id_values, path_id, query};

/// Registrations of `:user`, narrowed by `topCategory`, `category` and
/// `manufacturer` (each ORed within itself).
pub async fn handle_list(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let user_id = path_id(&req, "user")?;
    let pairs = query(&req);

    let filter = Filter::all()
        .eq("user_gear_registrations.userId", user_id)
        .group(Filter::any().eq_each("gear.gearTopCategoryId", id_values(&pairs, "topCategory")?))
        .group(Filter::any().eq_each("gear.gearCategoryId", id_values(&pairs, "category")?))
        .group(Filter::any().eq_each(
            "gear.gearManufactureId",
            id_values(&pairs, "manufacturer")?,
        ));

    crud::list_filtered::<UserGear>(&state, req.uri().path(), &pairs, filter).await
}

pub async fn handle_get(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::get_one::<UserGear>(&state, id).await
}

pub async fn handle_update(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::update_one::<UserGearLink>(&state, id, req.body()).await
}

/// Also unpacks the registration from any container, and empties it if it
/// is a container itself.
pub async fn handle_delete(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    let deleted = delete_registration_cascade(&state.db, id).await?;
    Ok(deliver_serialized_json(&deleted, StatusCode::OK)?)
}

pub async fn handle_insert(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    crud::insert_one::<UserGearLink>(&state, req.body()).await
}
