//! Fixtures shared by the database unit tests.

use sqlx::SqliteConnection;

use super::mapper::insert;
use super::models::{Category, Gear, Manufacture, TopCategory, User};
use super::pool::{Database, DbConfig};

pub async fn memory_db() -> Database {
    Database::connect(DbConfig::in_memory()).await.unwrap()
}

/// A file-backed database with several pooled connections, for tests that
/// need real concurrency. Keep the `TempDir` alive for the test's duration.
pub async fn file_db() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::connect(DbConfig::new(dir.path().join("gear.db")).max_connections(4))
        .await
        .unwrap();
    (db, dir)
}

#[derive(Debug, Clone, Copy)]
pub struct Seeded {
    pub top_category_id: i64,
    pub category_id: i64,
    pub manufacture_id: i64,
    pub gear_id: i64,
    pub container_gear_id: i64,
    pub user_id: i64,
}

/// One top category, category, manufacturer, two gear items (the second a
/// container) and one user.
pub async fn seed_catalog(conn: &mut SqliteConnection) -> Seeded {
    let top: TopCategory = insert(conn, br#"{"top_category_name":"Shelter"}"#)
        .await
        .unwrap();
    let top_category_id = top.top_category_id.unwrap();

    let category: Category = insert(
        conn,
        format!(r#"{{"category_top_category_id":{top_category_id},"category_name":"Tents"}}"#)
            .as_bytes(),
    )
    .await
    .unwrap();
    let category_id = category.category_id.unwrap();

    let maker: Manufacture = insert(conn, br#"{"manufacture_name":"Hilleberg"}"#)
        .await
        .unwrap();
    let manufacture_id = maker.manufacture_id.unwrap();

    let gear_payload = |name: &str, container: bool| {
        format!(
            r#"{{"gear_top_category_id":{top_category_id},"gear_category_id":{category_id},"gear_manufacture_id":{manufacture_id},"gear_name":"{name}","gear_is_container":{container},"gear_weight":2100,"gear_status":true}}"#
        )
    };
    let tent: Gear = insert(conn, gear_payload("Keron 3 GT", false).as_bytes())
        .await
        .unwrap();
    let backpack: Gear = insert(conn, gear_payload("Backpack 60L", true).as_bytes())
        .await
        .unwrap();

    let user: User = insert(
        conn,
        br#"{"user_username":"kari","user_name":"Kari","user_email":"kari@example.com"}"#,
    )
    .await
    .unwrap();

    Seeded {
        top_category_id,
        category_id,
        manufacture_id,
        gear_id: tent.gear_id.unwrap(),
        container_gear_id: backpack.gear_id.unwrap(),
        user_id: user.user_id.unwrap(),
    }
}
