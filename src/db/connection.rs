use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use rusqlite::Connection;

use super::migrations::run_migrations;
use crate::error::ForecastError;

/// The SQLite model store. Each pipeline stage opens it, runs its one-shot
/// statements, and drops it.
pub struct Database {
    pub(super) conn: Connection,
    db_path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the store at `db_path` and bring its schema
    /// up to date.
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create model store directory {}", parent.display())
            })?;
        }

        let mut conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open SQLite model store {}", db_path.display()))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("failed to enable foreign keys")?;
        run_migrations(&mut conn).context("failed to run model store migrations")?;

        debug!("Model store opened at {}", db_path.display());
        Ok(Self { conn, db_path })
    }

    /// Open a store that a training run already created. Never creates one.
    pub fn open_existing(db_path: PathBuf) -> Result<Self> {
        if !db_path.is_file() {
            return Err(ForecastError::missing("persisted model store", db_path).into());
        }
        Self::open(db_path.clone()).map_err(|err| {
            anyhow::Error::from(ForecastError::load(
                "persisted model store",
                db_path,
                format!("{err:#}"),
            ))
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_existing_never_creates_a_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sqlite3");

        let err = Database::open_existing(path.clone()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::MissingFile { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn garbage_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sqlite3");
        std::fs::write(&path, "definitely not sqlite, just some text padding it out").unwrap();

        let err = Database::open_existing(path).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::Load { .. })
        ));
    }
}
