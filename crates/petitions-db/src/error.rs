use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Every store operation fails with one of these kinds.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("DB lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        // Raised by the typed column readers when a stored value will not decode
        if let rusqlite::Error::FromSqlConversionFailure(idx, _, source) = &err {
            return StoreError::Corrupt(format!("column {idx}: {source}"));
        }
        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            if code.code == ErrorCode::ConstraintViolation {
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        return StoreError::Conflict(unique_violation(msg.as_deref()));
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        return StoreError::NotFound("referenced record");
                    }
                    _ => {}
                }
            }
        }
        StoreError::Database(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// SQLite reports e.g. "UNIQUE constraint failed: users.email".
fn unique_violation(msg: Option<&str>) -> String {
    let column = msg
        .and_then(|m| m.rsplit_once('.'))
        .map(|(_, column)| column.trim());

    match column {
        Some("email") => "email is already registered".to_string(),
        Some("national_id") => "national id is already registered".to_string(),
        _ => "record already exists".to_string(),
    }
}
