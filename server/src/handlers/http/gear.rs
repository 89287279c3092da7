use bytes::Bytes;
use hyper::Request;

use crate::AppState;
use crate::auth::AuthContext;
use crate::database::filter::Filter;
use crate::database::models::{FullGear, Gear, GearListItem};
use crate::handlers::http::crud;
use crate::handlers::http::error::ApiError;
use crate::handlers::http::routes::Reply;
use crate::handlers::http::utils::{id_values, path_id, query, text_value};

/// `topCategory`, `category` and `manufacturer` filters. Values of one
/// parameter are ORed; the parameters are ANDed.
fn catalog_filter(pairs: &[(String, String)]) -> Result<Filter, ApiError> {
    Ok(Filter::all()
        .group(Filter::any().eq_each("gear.gearTopCategoryId", id_values(pairs, "topCategory")?))
        .group(Filter::any().eq_each("gear.gearCategoryId", id_values(pairs, "category")?))
        .group(Filter::any().eq_each(
            "gear.gearManufactureId",
            id_values(pairs, "manufacturer")?,
        )))
}

pub async fn handle_list(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let pairs = query(&req);
    let filter = catalog_filter(&pairs)?;
    crud::list_filtered::<GearListItem>(&state, req.uri().path(), &pairs, filter).await
}

pub async fn handle_search(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let pairs = query(&req);
    let name = text_value(&pairs, "name")
        .ok_or_else(|| ApiError::bad_request("Missing search parameter: name"))?;

    let filter = catalog_filter(&pairs)?.like("gear.gearName", name);
    crud::list_filtered::<GearListItem>(&state, req.uri().path(), &pairs, filter).await
}

pub async fn handle_get(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::get_one::<FullGear>(&state, id).await
}

pub async fn handle_update(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::update_one::<Gear>(&state, id, req.body()).await
}

pub async fn handle_delete(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::delete_one::<Gear>(&state, id).await
}

pub async fn handle_insert(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    crud::insert_one::<Gear>(&state, req.body()).await
}
