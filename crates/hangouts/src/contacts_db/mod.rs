//! Contacts database module - SQLite-based storage for contacts and their SMS threads
pub mod schema;
pub mod migration;
pub mod contact_store;
pub mod message_store;
pub use schema::*;
pub use migration::MigrationManager;
pub use contact_store::ContactStore;
pub use message_store::MessageStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;
use crate::config::Config;

pub type DbPool = Arc<Pool<SqliteConnectionManager>>;

const DEFAULT_POOL_SIZE: u32 = 4;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Data access facade over the contacts database.
pub struct ContactsDatabase {
    pub contacts: ContactStore,
    pub messages: MessageStore,
    pool: DbPool,
}

impl ContactsDatabase {
    /// Open (or create) the database file with default pool settings
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        Self::open(db_path, DEFAULT_POOL_SIZE, DEFAULT_BUSY_TIMEOUT_MS)
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::open(&config.db_path, config.pool_size, config.busy_timeout_ms)
    }

    pub fn open(db_path: &Path, pool_size: u32, busy_timeout_ms: u64) -> anyhow::Result<Self> {
        info!("Opening contacts database at: {}", db_path.display());
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(db_path)
            .with_flags(
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_FULL_MUTEX,
            )
            .with_init(move |conn| {
                conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
                conn.execute_batch(
                    "PRAGMA foreign_keys = ON;
                     PRAGMA synchronous = NORMAL;",
                )
            });
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(|e| anyhow::anyhow!("Failed to create connection pool: {}", e))?;

        {
            let mut conn = pool.get()?;
            conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
            let mut migrator = MigrationManager::new(&mut conn);
            migrator.initialize_database()?;
        }
        info!("Contacts database initialized successfully");
        Ok(Self::with_pool(Arc::new(pool)))
    }

    /// Private in-memory database. The pool holds a single connection because
    /// every in-memory SQLite connection is its own database.
    pub fn new_in_memory() -> anyhow::Result<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)?;
        {
            let mut conn = pool.get()?;
            MigrationManager::new(&mut conn).initialize_database()?;
        }
        Ok(Self::with_pool(Arc::new(pool)))
    }

    fn with_pool(pool: DbPool) -> Self {
        Self {
            contacts: ContactStore::new(Arc::clone(&pool)),
            messages: MessageStore::new(Arc::clone(&pool)),
            pool,
        }
    }

    pub fn get_stats(&self) -> anyhow::Result<DatabaseStats> {
        let conn = self.pool.get()?;
        Ok(migration::get_database_stats(&conn)?)
    }
}

impl Drop for ContactsDatabase {
    fn drop(&mut self) {
        if let Ok(conn) = self.pool.get() {
            let _ = conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()));
        }
    }
}
