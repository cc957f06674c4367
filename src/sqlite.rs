// Persistent medium backed by SQLite

use crate::error::{StoreError, StoreResult};
use crate::medium::Medium;
use crate::now_ms;
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_VERSION: u32 = 1;

/// Name of the directory created under the path given to [`SqliteMedium::open`]
pub const STORE_DIR: &str = ".localstore";

/// Key-value medium that persists to `<path>/.localstore/localstore.db`
///
/// Holds an exclusive advisory lock on `<path>/.localstore/.lock` for as long
/// as it is alive, so only one medium (in any process) writes a directory at
/// a time. A second `open` on a locked directory fails with
/// [`StoreError::Locked`].
pub struct SqliteMedium {
    base_path: PathBuf,
    db: Connection,
    quota: Option<usize>,
    _lock: File,
}

impl SqliteMedium {
    /// Open or create a medium at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let base_path = path.as_ref().join(STORE_DIR);
        fs::create_dir_all(&base_path)?;

        let lock = Self::acquire_lock(&base_path)?;

        let db = Connection::open(base_path.join("localstore.db"))?;

        let medium = Self {
            base_path,
            db,
            quota: None,
            _lock: lock,
        };

        medium.create_schema()?;
        medium.create_gitignore()?;
        medium.write_version()?;

        info!(path = ?medium.base_path, "Opened SQLite medium");
        Ok(medium)
    }

    /// Limit total stored bytes (keys plus values)
    pub fn with_quota(mut self, limit: usize) -> Self {
        self.quota = Some(limit);
        self
    }

    /// Get the `.localstore` directory of this medium
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Bytes currently used (keys plus values)
    pub fn used_bytes(&self) -> StoreResult<usize> {
        self.used_bytes_except(None)
    }

    fn acquire_lock(base_path: &Path) -> StoreResult<File> {
        let lock_path = base_path.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;

        FileExt::try_lock_exclusive(&file).map_err(|e| {
            debug!(path = ?lock_path, error = ?e, "Lock held elsewhere");
            StoreError::Locked {
                path: base_path.to_path_buf(),
            }
        })?;

        Ok(file)
    }

    fn create_schema(&self) -> StoreResult<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn create_gitignore(&self) -> StoreResult<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(
                gitignore_path,
                "localstore.db\nlocalstore.db-shm\nlocalstore.db-wal\n.lock\n",
            )?;
        }
        Ok(())
    }

    fn write_version(&self) -> StoreResult<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }

    fn used_bytes_except(&self, key: Option<&str>) -> StoreResult<usize> {
        let used: i64 = self.db.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM items WHERE ?1 IS NULL OR key != ?1",
            [key],
            |row| row.get(0),
        )?;
        Ok(used as usize)
    }
}

impl Medium for SqliteMedium {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM items WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(limit) = self.quota {
            let needed = self.used_bytes_except(Some(key))? + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        debug!(key, bytes = value.len(), "SqliteMedium::set_item");
        self.db.execute(
            "INSERT OR REPLACE INTO items (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, now_ms()],
        )?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        let removed = self.db.execute("DELETE FROM items WHERE key = ?1", [key])?;
        debug!(key, removed, "SqliteMedium::remove_item");
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.db.prepare("SELECT key FROM items ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}
