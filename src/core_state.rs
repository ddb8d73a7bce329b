//! Shared application state handed to every request handler.
//!
//! Holds the storage location rather than a live connection: each handler
//! opens its own connection with `open_db()`, and SQLite's file locking
//! keeps writers serialized.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::{self, DatabaseError};

#[derive(Debug, Clone)]
pub struct RegisterState {
    db_path: PathBuf,
    /// Printed on report headers when set.
    pub facility_name: Option<String>,
}

impl RegisterState {
    pub fn new(db_path: impl Into<PathBuf>, facility_name: Option<String>) -> Self {
        Self {
            db_path: db_path.into(),
            facility_name,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.db_path.clone(), config.facility_name.clone())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a database connection, creating the file and schema on first use.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_database(&self.db_path)
    }
}
