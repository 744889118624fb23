//! # vault-db
//!
//! Store backends for docvault.
//!
//! This crate provides:
//! - PostgreSQL repositories for documents and violations
//! - Redis counter stores with atomic increment for multi-instance deployments
//! - In-memory repositories and counter stores for single-instance use and tests
//! - Filesystem and in-memory blob storage
//! - Connection pool management and SQL migrations
//!
//! ## Example
//!
//! ```rust,ignore
//! use vault_db::Database;
//!
//! let db = Database::connect("postgres://localhost/docvault").await?;
//! db.migrate().await?;
//! let page = db.documents().search(&filter, page).await?;
//! ```

pub mod documents;
pub mod file_storage;
pub mod memory;
pub mod pool;
pub mod redis_store;
pub mod violations;

pub use documents::PgDocumentRepository;
pub use file_storage::{
    compute_content_hash, generate_storage_path, FilesystemBackend, MemoryBlobStore,
};
pub use memory::{
    MemoryDocumentRepository, MemoryLoginAttemptStore, MemoryRateCounterStore,
    MemoryViolationRepository,
};
pub use pool::{connect_pool, PoolConfig};
pub use redis_store::{RedisLoginAttemptStore, RedisRateCounterStore};
pub use violations::PgViolationRepository;

use vault_core::{Error, Result};

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// PostgreSQL-backed repositories sharing one pool.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let pool = connect_pool(url, &PoolConfig::from_env()).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    pub fn documents(&self) -> PgDocumentRepository {
        PgDocumentRepository::new(self.pool.clone())
    }

    pub fn violations(&self) -> PgViolationRepository {
        PgViolationRepository::new(self.pool.clone())
    }

    /// Round-trip a trivial query.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\x"), "c:\\\\x");
        assert_eq!(escape_like("plain"), "plain");
    }
}
