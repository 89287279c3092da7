use thiserror::Error;

/// Errors raised by the record mapper and the repository helpers.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row matched the requested id.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// `list_by_field` was asked for a column the record does not declare.
    #[error("invalid field '{field}' for {table}")]
    InvalidField { field: String, table: &'static str },

    /// Payload could not be decoded into the record type.
    #[error("invalid payload: {0}")]
    Validation(String),

    /// The record descriptor cannot drive a query (e.g. it has no fields).
    #[error("invalid descriptor: {0}")]
    Type(String),

    #[error("duplicate value violates unique constraint {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint failed: {0}")]
    ForeignKeyViolation(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("connection failed: {0}")]
    Connection(String),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports constraints as
                // "UNIQUE constraint failed: <table>.<column>" and
                // "FOREIGN KEY constraint failed".
                if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation(target.to_string())
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation(msg.to_string())
                } else {
                    DbError::Query(msg.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::Connection("pool timed out".to_string()),
            sqlx::Error::PoolClosed => DbError::Connection("pool is closed".to_string()),
            other => DbError::Query(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
