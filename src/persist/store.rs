//! SQLite-based local storage for per-pane positions.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::PositionStore;
use crate::models::YearMonth;

/// SQLite-backed storage for the last month shown in each pane.
///
/// The database is stored at `XDG_CONFIG_HOME/monthgrid/positions.sqlite`.
pub struct SqlitePositionStore {
    conn: Connection,
}

impl SqlitePositionStore {
    /// Opens or creates the database at the default XDG location.
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_db_path()?;
        Self::open(&db_path)
    }

    /// Returns the default database path based on XDG directories.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "monthgrid")
            .context("Failed to determine project directories")?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

        Ok(config_dir.join("positions.sqlite"))
    }

    /// Opens or creates the database at the specified path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )
        .context("Failed to configure SQLite pragmas")?;

        let store = Self { conn };
        store.create_tables()?;

        info!("Opened position store at {:?}", path);
        Ok(store)
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS pane_positions (
                pane_key TEXT PRIMARY KEY NOT NULL,
                year_month TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
            )
            .context("Failed to create database tables")?;

        debug!("Position tables created/verified");
        Ok(())
    }

    /// Removes the stored position of a pane.
    pub fn clear(&self, pane: &str) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM pane_positions WHERE pane_key = ?1",
                params![pane],
            )
            .context("Failed to clear pane position")?;
        Ok(())
    }

    /// Last write time of a pane's position, seconds since the epoch.
    pub fn updated_at(&self, pane: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT updated_at FROM pane_positions WHERE pane_key = ?1",
                params![pane],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query pane position timestamp")
    }
}

impl PositionStore for SqlitePositionStore {
    fn read(&self, pane: &str) -> Result<Option<YearMonth>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT year_month FROM pane_positions WHERE pane_key = ?1",
                params![pane],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query pane position")?;

        Ok(raw.and_then(|raw| match raw.parse() {
            Ok(ym) => Some(ym),
            Err(e) => {
                warn!(pane, raw = %raw, "Ignoring stored position: {}", e);
                None
            }
        }))
    }

    fn write(&mut self, pane: &str, ym: YearMonth) -> Result<()> {
        self.conn
            .execute(
                "
            INSERT INTO pane_positions (pane_key, year_month, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(pane_key) DO UPDATE SET
                year_month = excluded.year_month,
                updated_at = excluded.updated_at
            ",
                params![pane, ym.key(), now_unix()],
            )
            .context("Failed to upsert pane position")?;
        Ok(())
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
