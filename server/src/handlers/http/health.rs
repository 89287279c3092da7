use bytes::Bytes;
use chrono::Local;
use hyper::{Request, StatusCode};

use shared::types::Health;

use crate::AppState;
use crate::handlers::http::routes::Reply;
use crate::handlers::http::utils::deliver_serialized_json;

/// `GET /health`
pub async fn handle_health(_req: Request<Bytes>, _state: AppState) -> Reply {
    let updated = Local::now().format("%d.%m.%Y %H:%M:%S").to_string();
    Ok(deliver_serialized_json(&Health::ok(updated), StatusCode::OK)?)
}
