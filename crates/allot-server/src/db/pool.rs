// crates/allot-server/src/db/pool.rs
// Pooled SQLite access for the allocation store
//
// Engine and handler code goes through `run` (errors become `AllotError`).
// Migrations and fixtures use `interact` (anyhow). Allocation writes that
// check capacity before inserting use `run_with_retry` and open a
// `BEGIN IMMEDIATE` transaction inside the closure, see
// `db::allocations::immediate_transaction`.

use crate::error::AllotError;
use anyhow::{Context, Result};
use deadpool_sqlite::{Config, Hook, HookError, Pool, Runtime};
use rusqlite::{Connection, ErrorCode};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const MAX_CONNECTIONS: usize = 8;

/// Waits between attempts when another writer holds the database
const BUSY_BACKOFF: [Duration; 3] = [
    Duration::from_millis(100),
    Duration::from_millis(500),
    Duration::from_millis(2000),
];

const FILE_PRAGMAS: &str = "PRAGMA journal_mode=WAL; \
                            PRAGMA foreign_keys=ON; \
                            PRAGMA busy_timeout=5000; \
                            PRAGMA synchronous=NORMAL;";

// WAL does not apply to in-memory databases
const MEMORY_PRAGMAS: &str = "PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;";

/// Where the store lives
#[derive(Debug, Clone)]
enum Storage {
    File(PathBuf),
    /// Shared-cache URI so every pooled connection sees the same data
    Memory(String),
}

/// Connection pool over the allocation store.
pub struct DatabasePool {
    pool: Pool,
    storage: Storage,
}

impl DatabasePool {
    /// Open (and migrate) the store at `path`, creating parent directories.
    pub async fn open(path: &Path) -> Result<Self> {
        ensure_parent_directory(path)?;
        Self::connect(Storage::File(path.to_path_buf())).await
    }

    /// Open a private in-memory store. Each call gets its own database.
    pub async fn open_in_memory() -> Result<Self> {
        let uri = format!(
            "file:allot_{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4().simple()
        );
        Self::connect(Storage::Memory(uri)).await
    }

    async fn connect(storage: Storage) -> Result<Self> {
        let target = match &storage {
            Storage::File(path) => path.to_string_lossy().into_owned(),
            Storage::Memory(uri) => uri.clone(),
        };
        let pool = Config::new(&target)
            .builder(Runtime::Tokio1)
            .context("Failed to create pool builder")?
            .max_size(MAX_CONNECTIONS)
            .post_create(post_create_hook(storage.clone()))
            .build()
            .context("Failed to build connection pool")?;

        let db = Self { pool, storage };
        db.interact(|conn| {
            super::schema::run_all_migrations(conn)?;
            if let Err(e) = conn.execute_batch("PRAGMA optimize") {
                debug!("PRAGMA optimize skipped: {}", e);
            }
            Ok(())
        })
        .await?;
        Ok(db)
    }

    /// Database file path (None for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::File(path) => Some(path),
            Storage::Memory(_) => None,
        }
    }

    /// Run `f` on a pooled connection (blocking thread), anyhow errors.
    pub async fn interact<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get connection from pool")?;

        conn.interact(move |conn| f(conn))
            .await
            .map_err(|e| anyhow::anyhow!("interact failed: {e}"))?
    }

    /// Run `f` on a pooled connection and convert every failure into `AllotError`.
    pub async fn run<F, R, E>(&self, f: F) -> Result<R, AllotError>
    where
        F: FnOnce(&Connection) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: Into<AllotError> + Send + 'static,
    {
        self.pool
            .get()
            .await
            .map_err(|e| AllotError::Other(format!("Failed to get connection: {}", e)))?
            .interact(move |conn| f(conn).map_err(Into::into))
            .await
            .map_err(|e| AllotError::Other(format!("Database error: {}", e)))?
    }

    /// [`run`](Self::run), re-attempted while SQLite reports the database busy.
    pub async fn run_with_retry<F, R, E>(&self, f: F) -> Result<R, AllotError>
    where
        F: FnOnce(&Connection) -> Result<R, E> + Send + Clone + 'static,
        R: Send + 'static,
        E: Into<AllotError> + Send + 'static,
    {
        for (attempt, delay) in BUSY_BACKOFF.iter().enumerate() {
            match self.run(f.clone()).await {
                Err(e) if is_busy(&e) => {
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Allocation store busy, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
                other => return other,
            }
        }
        self.run(f).await
    }

    pub fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }
}

/// Pool occupancy, reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub size: usize,
    pub available: usize,
    pub waiting: usize,
}

/// SQLITE_BUSY (file contention) or SQLITE_LOCKED (shared-cache table lock)
fn is_busy(err: &AllotError) -> bool {
    match err {
        AllotError::Db(rusqlite::Error::SqliteFailure(e, _)) => {
            matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        }
        _ => false,
    }
}

/// Parent directory is created owner-only on Unix
fn ensure_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
        #[cfg(unix)]
        std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

fn post_create_hook(storage: Storage) -> Hook {
    Hook::async_fn(move |conn, _metrics| {
        let storage = storage.clone();
        Box::pin(async move {
            conn.interact(move |conn| configure_connection(conn, &storage))
                .await
                .map_err(|e| HookError::Message(format!("interact failed: {e}").into()))?
                .map_err(|e| HookError::Message(format!("connection setup failed: {e}").into()))
        })
    })
}

fn configure_connection(conn: &Connection, storage: &Storage) -> rusqlite::Result<()> {
    match storage {
        Storage::Memory(_) => conn.execute_batch(MEMORY_PRAGMAS),
        Storage::File(path) => {
            conn.execute_batch(FILE_PRAGMAS)?;
            // student records: owner read/write only
            #[cfg(unix)]
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
                warn!("Failed to restrict database file permissions: {}", e);
            }
            #[cfg(not(unix))]
            let _ = path;
            Ok(())
        }
    }
}
