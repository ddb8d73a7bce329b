pub mod sqlite;
pub mod repository;

pub use sqlite::*;
pub use repository::*;

use thiserror::Error;

use crate::models::ValidationError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid stored value in column {column}: {value}")]
    InvalidStoredValue { column: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DatabaseError {
    /// Storage-level failure (as opposed to a bad request or unknown id).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(_)
                | Self::Io(_)
                | Self::InvalidEnum { .. }
                | Self::InvalidStoredValue { .. }
                | Self::MigrationFailed { .. }
        )
    }
}
