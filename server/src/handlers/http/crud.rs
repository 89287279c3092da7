//! Generic handler bodies shared by every entity.

use hyper::StatusCode;
use tracing::info;

use shared::types::{PageRequest, ResponsePayload, StatusResponse};

use crate::AppState;
use crate::database::descriptor::{Record, Writable};
use crate::database::filter::{Filter, list_page};
use crate::database::mapper::{
    decode_payload, delete_by_id, fetch_by_id, insert_record, update_record,
};
use crate::handlers::http::routes::Reply;
use crate::handlers::http::utils::deliver_serialized_json;

pub async fn get_one<R: Record>(state: &AppState, id: i64) -> Reply {
    let mut conn = state.db.acquire().await?;
    let record = fetch_by_id::<R>(&mut conn, id).await?;
    Ok(deliver_serialized_json(&record, StatusCode::OK)?)
}

/// Insert the JSON `body` and answer with the stored row.
pub async fn insert_one<R: Writable>(state: &AppState, body: &[u8]) -> Reply {
    let record = decode_payload::<R>(body)?;
    insert_stored(state, &record).await
}

pub async fn insert_stored<R: Writable>(state: &AppState, record: &R) -> Reply {
    let mut conn = state.db.acquire().await?;
    let created = insert_record(&mut conn, record).await?;
    info!(table = R::TABLE, id = ?created.id(), "Inserted record");
    Ok(deliver_serialized_json(&created, StatusCode::OK)?)
}

/// Update row `id` from the JSON `body`. The path id wins over any id in
/// the body.
pub async fn update_one<R: Writable>(state: &AppState, id: i64, body: &[u8]) -> Reply {
    let mut record = decode_payload::<R>(body)?;
    record.set_id(id);
    update_stored(state, &record).await
}

pub async fn update_stored<R: Writable>(state: &AppState, record: &R) -> Reply {
    let mut conn = state.db.acquire().await?;
    update_record(&mut conn, record).await?;
    info!(table = R::TABLE, id = ?record.id(), "Updated record");
    Ok(deliver_serialized_json(
        &StatusResponse::success(),
        StatusCode::OK,
    )?)
}

/// Delete row `id` and answer with the row as it was.
pub async fn delete_one<R: Writable>(state: &AppState, id: i64) -> Reply {
    let mut conn = state.db.acquire().await?;
    let deleted = delete_by_id::<R>(&mut conn, id).await?;
    info!(table = R::TABLE, id, "Deleted record");
    Ok(deliver_serialized_json(&deleted, StatusCode::OK)?)
}

/// One page of `R` matching `filter`, wrapped in the pagination envelope.
/// `path` and `query` come from the request and feed the page links.
pub async fn list_filtered<R: Record>(
    state: &AppState,
    path: &str,
    query: &[(String, String)],
    filter: Filter,
) -> Reply {
    let page = PageRequest::from_query(query)?;

    let mut conn = state.db.acquire().await?;
    let (total, items) = list_page::<R>(&mut conn, &filter, page).await?;

    let payload = ResponsePayload::build(items, total, page, path, query);
    Ok(deliver_serialized_json(&payload, StatusCode::OK)?)
}
