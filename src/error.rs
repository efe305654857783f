use tracing::error;

use crate::migrate::{ACTIVE_INDEX, SQLITE_ACTIVE_INDEX_VIOLATION};

/// Failures surfaced by the ledger and its stores.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The activation target does not exist or belongs to another nickname.
    #[error("no score {id} for nickname {nickname:?}")]
    NotFound { nickname: String, id: i64 },

    /// Connection, pool or backend failure. Not retried here.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    /// More than one active score for a nickname. Indicates a locking bug.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Nickname or score outside the accepted bounds. Rejected before storage.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Whether `db` is the active-score index refusing a second active row.
fn is_active_index_violation(db: &dyn sqlx::error::DatabaseError) -> bool {
    // postgres names the index, sqlite only names the indexed columns
    db.is_unique_violation()
        && (db.constraint() == Some(ACTIVE_INDEX) || db.message() == SQLITE_ACTIVE_INDEX_VIOLATION)
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if is_active_index_violation(&**db) => {
                error!(detail = db.message(), "second active score rejected");
                LedgerError::InvariantViolation(format!(
                    "second active score rejected by the database: {}",
                    db.message()
                ))
            }
            _ => LedgerError::StorageUnavailable(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
