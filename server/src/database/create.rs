use sqlx::{Row, SqliteConnection};
use tracing::{info, warn};

use super::error::DbResult;
use super::pool::Database;

/// Current schema version, stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &[&str] = &[
    // Users. `userPassword` stays empty for accounts created through Google.
    "CREATE TABLE IF NOT EXISTS users (
        userId         INTEGER PRIMARY KEY AUTOINCREMENT,
        userUsername   TEXT    NOT NULL UNIQUE,
        userPassword   TEXT    NOT NULL DEFAULT '',
        userName       TEXT    NOT NULL DEFAULT '',
        userEmail      TEXT    UNIQUE,
        userIsAdmin    BOOLEAN NOT NULL DEFAULT 0,
        userIsExternal BOOLEAN NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS gear_top_category (
        topCategoryId   INTEGER PRIMARY KEY AUTOINCREMENT,
        topCategoryName TEXT    NOT NULL,
        topCategoryIcon TEXT
    )",
    "CREATE TABLE IF NOT EXISTS gear_category (
        categoryId            INTEGER PRIMARY KEY AUTOINCREMENT,
        categoryTopCategoryId INTEGER NOT NULL,
        categoryName          TEXT    NOT NULL,
        FOREIGN KEY (categoryTopCategoryId) REFERENCES gear_top_category(topCategoryId)
    )",
    "CREATE TABLE IF NOT EXISTS manufacture (
        manufactureId   INTEGER PRIMARY KEY AUTOINCREMENT,
        manufactureName TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS gear (
        gearId             INTEGER PRIMARY KEY AUTOINCREMENT,
        gearTopCategoryId  INTEGER NOT NULL,
        gearCategoryId     INTEGER NOT NULL,
        gearManufactureId  INTEGER NOT NULL,
        gearIsContainer    BOOLEAN NOT NULL DEFAULT 0,
        gearName           TEXT    NOT NULL,
        gearSizeDefinition TEXT    NOT NULL DEFAULT '',
        gearWeight         INTEGER NOT NULL DEFAULT 0,
        gearHeight         INTEGER NOT NULL DEFAULT 0,
        gearLength         INTEGER NOT NULL DEFAULT 0,
        gearWidth          INTEGER NOT NULL DEFAULT 0,
        gearStatus         BOOLEAN NOT NULL DEFAULT 0,
        FOREIGN KEY (gearTopCategoryId) REFERENCES gear_top_category(topCategoryId),
        FOREIGN KEY (gearCategoryId)    REFERENCES gear_category(categoryId),
        FOREIGN KEY (gearManufactureId) REFERENCES manufacture(manufactureId)
    )",
    "CREATE TABLE IF NOT EXISTS user_gear_registrations (
        userGearRegistrationId INTEGER PRIMARY KEY AUTOINCREMENT,
        gearId                 INTEGER NOT NULL,
        userId                 INTEGER NOT NULL,
        FOREIGN KEY (gearId) REFERENCES gear(gearId),
        FOREIGN KEY (userId) REFERENCES users(userId)
    )",
    // `userContainerId` is the registration of the container gear;
    // `userGearRegistrationId` is the registration packed inside it.
    "CREATE TABLE IF NOT EXISTS user_container_registration (
        containerRegistrationId INTEGER PRIMARY KEY AUTOINCREMENT,
        userContainerId         INTEGER NOT NULL,
        userGearRegistrationId  INTEGER NOT NULL UNIQUE,
        FOREIGN KEY (userContainerId)        REFERENCES user_gear_registrations(userGearRegistrationId),
        FOREIGN KEY (userGearRegistrationId) REFERENCES user_gear_registrations(userGearRegistrationId)
    )",
    // --- Indexes ---------------------------------------------------------
    "CREATE INDEX IF NOT EXISTS idx_gear_top_category   ON gear(gearTopCategoryId)",
    "CREATE INDEX IF NOT EXISTS idx_gear_category       ON gear(gearCategoryId)",
    "CREATE INDEX IF NOT EXISTS idx_gear_manufacture    ON gear(gearManufactureId)",
    "CREATE INDEX IF NOT EXISTS idx_category_top        ON gear_category(categoryTopCategoryId)",
    "CREATE INDEX IF NOT EXISTS idx_usergear_user       ON user_gear_registrations(userId)",
    "CREATE INDEX IF NOT EXISTS idx_usergear_gear       ON user_gear_registrations(gearId)",
    "CREATE INDEX IF NOT EXISTS idx_container_container ON user_container_registration(userContainerId)",
];

/// Create any missing table or index and stamp the schema version.
pub async fn create_tables(db: &Database) -> DbResult<()> {
    let mut conn = db.acquire().await?;
    let current = schema_version(&mut conn).await?;

    create_schema(&mut conn).await?;

    if current < SCHEMA_VERSION {
        set_schema_version(&mut conn, SCHEMA_VERSION).await?;
        info!(version = SCHEMA_VERSION, "Database schema created");
    } else if current > SCHEMA_VERSION {
        warn!(
            current,
            expected = SCHEMA_VERSION,
            "Database schema is newer than this server"
        );
    }
    Ok(())
}

async fn create_schema(conn: &mut SqliteConnection) -> DbResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(())
}

async fn schema_version(conn: &mut SqliteConnection) -> DbResult<i64> {
    let row = sqlx::query("PRAGMA user_version")
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.try_get::<i64, _>(0)?)
}

async fn set_schema_version(conn: &mut SqliteConnection, version: i64) -> DbResult<()> {
    // PRAGMA does not take bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", version))
        .execute(&mut *conn)
        .await?;
    Ok(())
}
