//! Database errors and how they surface upstream.
//!
//! ```text
//! sqlx::Error ──► DbError ──┬──► ListingError::StoreUnavailable   (listings)
//!                           └──► ApiError                         (handlers)
//!                                  NotFound  404, UniqueViolation 409,
//!                                  Check/FK  400, unavailable     503
//! ```

use emporium_core::ListingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// An update or delete matched no row.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write (username, email).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Product owner id does not reference a user.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Negative price or stock, or a status outside the allowed set.
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// The file could not be opened, or the pool has been closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when the store itself could not serve the request, as opposed to
    /// the request being wrong.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_)
                | DbError::PoolExhausted
                | DbError::QueryFailed(_)
                | DbError::MigrationFailed(_)
                | DbError::Internal(_)
        )
    }
}

/// Constraint failures are told apart by SQLite's message prefix; transport
/// failures (closed pool, I/O, timeout) all count as unavailable.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    // "users.email" -> "email"
                    let field = target.rsplit('.').next().unwrap_or(target);
                    DbError::duplicate(field, "unknown")
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Listings only read, so any database failure is the store being unavailable.
impl From<DbError> for ListingError {
    fn from(err: DbError) -> Self {
        ListingError::StoreUnavailable(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(DbError::PoolExhausted.is_unavailable());
        assert!(DbError::ConnectionFailed("gone".into()).is_unavailable());
        assert!(!DbError::not_found("Product", 3).is_unavailable());
        assert!(!DbError::duplicate("email", "a@b.co").is_unavailable());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            DbError::not_found("Product", 42).to_string(),
            "Product not found: 42"
        );
    }

    #[tokio::test]
    async fn test_unique_violation_names_column() {
        let db = crate::Database::new(crate::DbConfig::in_memory()).await.unwrap();
        let insert = "INSERT INTO users (username, email, password_hash, created_at, updated_at) \
                      VALUES ('a', 'a@x.io', 'h', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')";
        sqlx::query(insert).execute(db.pool()).await.unwrap();

        let err: DbError = sqlx::query(insert).execute(db.pool()).await.unwrap_err().into();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[test]
    fn test_into_listing_error() {
        let err: ListingError = DbError::PoolExhausted.into();
        assert!(matches!(err, ListingError::StoreUnavailable(_)));
    }
}
