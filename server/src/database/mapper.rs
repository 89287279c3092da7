//! Generic CRUD over any [`Record`].
//!
//! Functions take a bare `&mut SqliteConnection` so callers can hand in either
//! a pooled connection or an open transaction (`&mut *tx`).

use sqlx::{Row, SqliteConnection};
use tracing::{debug, warn};

use super::descriptor::{FieldDescriptor, Record, SqlValue, Writable, bind_value};
use super::error::{DbError, DbResult};

pub(crate) fn primary_key<R: Record>() -> DbResult<&'static FieldDescriptor> {
    R::FIELDS
        .first()
        .ok_or_else(|| DbError::Type(format!("{} declares no fields", R::TABLE)))
}

/// Decode a JSON payload into `R`.
pub fn decode_payload<R: Record>(payload: &[u8]) -> DbResult<R> {
    serde_json::from_slice(payload).map_err(|e| DbError::Validation(e.to_string()))
}

/// Fetch one row by primary key, applying the record's own joins.
pub async fn fetch_by_id<R: Record>(conn: &mut SqliteConnection, id: i64) -> DbResult<R> {
    fetch_by_id_with::<R>(conn, id, R::JOINS).await
}

/// Fetch one row by primary key with an explicit set of join clauses.
pub async fn fetch_by_id_with<R: Record>(
    conn: &mut SqliteConnection,
    id: i64,
    joins: &[&str],
) -> DbResult<R> {
    let pk = primary_key::<R>()?;

    let mut sql = format!("SELECT {} FROM {}", R::select_list(), R::TABLE);
    for join in joins {
        sql.push(' ');
        sql.push_str(join);
    }
    sql.push_str(&format!(" WHERE {} = ? LIMIT 1", pk.column));

    debug!(table = R::TABLE, id, "fetch by id");

    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;

    match row {
        Some(row) => Ok(R::from_row(&row)?),
        None => Err(DbError::not_found(R::TABLE, id)),
    }
}

/// Decode `payload` and insert it. Returns the stored row.
pub async fn insert<R: Writable>(conn: &mut SqliteConnection, payload: &[u8]) -> DbResult<R> {
    let record: R = decode_payload(payload)?;
    insert_record(conn, &record).await
}

/// Insert every non-key field of `record`; the key is assigned by SQLite.
pub async fn insert_record<R: Writable>(conn: &mut SqliteConnection, record: &R) -> DbResult<R> {
    primary_key::<R>()?;
    let columns = &R::FIELDS[1..];
    if columns.is_empty() {
        return Err(DbError::Type(format!("{} has no writable columns", R::TABLE)));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::TABLE,
        columns.iter().map(|f| f.column).collect::<Vec<_>>().join(", "),
        vec!["?"; columns.len()].join(", ")
    );

    let mut query = sqlx::query(&sql);
    for value in record.values().into_iter().skip(1) {
        query = bind_value(query, value);
    }

    let result = query.execute(&mut *conn).await.map_err(|e| {
        let err = DbError::from(e);
        warn!(table = R::TABLE, error = %err, "insert failed");
        err
    })?;

    let id = result.last_insert_rowid();
    debug!(table = R::TABLE, id, "inserted row");

    fetch_by_id::<R>(conn, id).await
}

/// Decode `payload` and update the row its key field names.
pub async fn update<R: Writable>(conn: &mut SqliteConnection, payload: &[u8]) -> DbResult<()> {
    let record: R = decode_payload(payload)?;
    update_record(conn, &record).await
}

/// Overwrite every non-key column of the row keyed by `record.id()`.
pub async fn update_record<R: Writable>(conn: &mut SqliteConnection, record: &R) -> DbResult<()> {
    let pk = primary_key::<R>()?;
    let id = record
        .id()
        .ok_or_else(|| DbError::Validation(format!("{} is required", pk.field)))?;

    let columns = &R::FIELDS[1..];
    if columns.is_empty() {
        return Err(DbError::Type(format!("{} has no writable columns", R::TABLE)));
    }

    let assignments = columns
        .iter()
        .map(|f| format!("{} = ?", f.column))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {} WHERE {} = ?", R::TABLE, assignments, pk.column);

    let mut query = sqlx::query(&sql);
    for value in record.values().into_iter().skip(1) {
        query = bind_value(query, value);
    }
    query = query.bind(id);

    let result = query.execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(DbError::not_found(R::TABLE, id));
    }

    debug!(table = R::TABLE, id, "updated row");
    Ok(())
}

/// Delete by primary key. Returns the row as it was before deletion.
pub async fn delete_by_id<R: Writable>(conn: &mut SqliteConnection, id: i64) -> DbResult<R> {
    let pk = primary_key::<R>()?;
    let existing = fetch_by_id::<R>(conn, id).await?;

    let sql = format!("DELETE FROM {} WHERE {} = ?", R::TABLE, pk.column);
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(DbError::not_found(R::TABLE, id));
    }

    debug!(table = R::TABLE, id, "deleted row");
    Ok(existing)
}

/// All rows whose `column` equals `value`, ordered by primary key.
///
/// `column` must be one of the record's declared columns; anything else is
/// rejected before a statement is built.
pub async fn list_by_field<R: Record>(
    conn: &mut SqliteConnection,
    column: &str,
    value: impl Into<SqlValue>,
) -> DbResult<Vec<R>> {
    let field = R::FIELDS
        .iter()
        .find(|f| f.column == column)
        .ok_or_else(|| DbError::InvalidField {
            field: column.to_string(),
            table: R::TABLE,
        })?;
    let pk = primary_key::<R>()?;

    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ? ORDER BY {}",
        R::select_list(),
        R::source(),
        field.column,
        pk.column
    );

    let rows = bind_value(sqlx::query(&sql), value.into())
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| R::from_row(row).map_err(DbError::from))
        .collect()
}

/// `SELECT COUNT(*)` over the record's source with an optional `WHERE`.
pub(crate) async fn count_where<R: Record>(
    conn: &mut SqliteConnection,
    where_clause: &str,
    params: &[SqlValue],
) -> DbResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}{}", R::source(), where_clause);
    let mut query = sqlx::query(&sql);
    for value in params {
        query = bind_value(query, value.clone());
    }
    let row = query.fetch_one(&mut *conn).await?;
    Ok(row.try_get::<i64, _>(0)?)
}
