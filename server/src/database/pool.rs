//! SQLite connection pool.
//!
//! File databases run in WAL mode with foreign keys on. Writers queue on the
//! busy timeout instead of failing with `SQLITE_BUSY`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use super::create::create_tables;
use super::error::{DbError, DbResult};
use shared::types::DatabaseConfig;

#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the database file; ignored for in-memory databases.
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
    /// Create missing tables and stamp the schema version on connect.
    pub create_schema: bool,
    in_memory: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            create_schema: true,
            in_memory: false,
        }
    }

    pub fn from_settings(settings: &DatabaseConfig) -> Self {
        DbConfig::new(&settings.file).max_connections(settings.max_connections)
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn create_schema(mut self, create: bool) -> Self {
        self.create_schema = create;
        self
    }

    /// A private in-memory database. Every pooled connection to `:memory:`
    /// would see its own empty database, so the pool is pinned to one
    /// connection that never expires.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            create_schema: true,
            in_memory: true,
        }
    }
}

/// Shared database handle. Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            in_memory = config.in_memory,
            "Initializing database connection"
        );

        let pool = if config.in_memory {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::Connection(e.to_string()))?
                .foreign_keys(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .acquire_timeout(config.acquire_timeout)
                .connect_with(options)
                .await
                .map_err(|e| DbError::Connection(e.to_string()))?
        } else {
            let options = SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .foreign_keys(true)
                .busy_timeout(config.busy_timeout);

            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout)
                .connect_with(options)
                .await
                .map_err(|e| DbError::Connection(e.to_string()))?
        };

        info!(max_connections = config.max_connections, "Database pool created");

        let db = Database { pool };
        if config.create_schema {
            create_tables(&db).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn acquire(&self) -> DbResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Start a transaction. Dropping it without `commit` rolls back.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        debug!("Beginning transaction");
        Ok(self.pool.begin().await?)
    }

    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_keeps_its_schema_across_acquires() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();

        {
            let mut conn = db.acquire().await.unwrap();
            sqlx::query("INSERT INTO manufacture (manufactureName) VALUES ('Nordisk')")
                .execute(&mut *conn)
                .await
                .unwrap();
        }

        let mut conn = db.acquire().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM manufacture")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        let err = sqlx::query(
            "INSERT INTO gear_category (categoryTopCategoryId, categoryName) VALUES (999, 'x')",
        )
        .execute(&mut *conn)
        .await
        .unwrap_err();
        assert!(matches!(DbError::from(err), DbError::ForeignKeyViolation(_)));
    }

    #[test]
    fn settings_map_onto_pool_config() {
        let settings = DatabaseConfig {
            file: "gear.db".into(),
            max_connections: 0,
        };
        let cfg = DbConfig::from_settings(&settings);
        assert_eq!(cfg.database_path, PathBuf::from("gear.db"));
        assert_eq!(cfg.max_connections, 1);
        assert!(cfg.create_schema);
    }
}
