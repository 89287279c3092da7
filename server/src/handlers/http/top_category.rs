use bytes::Bytes;
use hyper::Request;

use crate::AppState;
use crate::auth::AuthContext;
use crate::database::filter::Filter;
use crate::database::models::TopCategory;
use crate::handlers::http::crud;
use crate::handlers::http::routes::Reply;
use crate::handlers::http::utils::{id_values, path_id, query};

pub async fn handle_list(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let pairs = query(&req);
    let filter = Filter::any().eq_each("topCategoryId", id_values(&pairs, "topCategory")?);
    crud::list_filtered::<TopCategory>(&state, req.uri().path(), &pairs, filter).await
}

pub async fn handle_get(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::get_one::<TopCategory>(&state, id).await
}

pub async fn handle_update(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::update_one::<TopCategory>(&state, id, req.body()).await
}

pub async fn handle_delete(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    let id = path_id(&req, "id")?;
    crud::delete_one::<TopCategory>(&state, id).await
}

pub async fn handle_insert(req: Request<Bytes>, state: AppState, _ctx: AuthContext) -> Reply {
    crud::insert_one::<TopCategory>(&state, req.body()).await
}
