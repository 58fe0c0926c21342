//! SQLite-backed store for posted deals, thread roots, and flags.

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::SqliteConnection;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{ConfigRow, PostedDealRow, ThreadRootRow};
use crate::adapter::outbound::sqlite::database::schema::{config, posted_deals, thread_roots};
use crate::domain::{Category, DealKey, Source};
use crate::error::{Error, Result};
use crate::port::outbound::{FlagStore, PostedStore, ThreadHandle, ThreadStore};

/// SQLite store implementing all three persistence ports.
///
/// Timestamps are stored as RFC 3339 text, which compares correctly as
/// strings because every value uses the same UTC offset format.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }
}

impl PostedStore for SqliteStore {
    async fn has_posted(&self, key: &DealKey) -> Result<bool> {
        let mut conn = self.conn()?;

        let row: Option<String> = posted_deals::table
            .find(key.as_str())
            .select(posted_deals::id)
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn mark_posted(&self, key: &DealKey, source: Source, title: &str) -> Result<()> {
        let row = PostedDealRow {
            id: key.as_str().to_string(),
            source: source.as_str().to_string(),
            title: title.to_string(),
            posted_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self.conn()?;

        diesel::insert_or_ignore_into(posted_deals::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn prune(&self, retention: chrono::Duration) -> Result<usize> {
        let cutoff = (Utc::now() - retention).to_rfc3339();
        let mut conn = self.conn()?;

        let deleted = diesel::delete(posted_deals::table.filter(posted_deals::posted_at.lt(&cutoff)))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(deleted)
    }
}

impl ThreadStore for SqliteStore {
    async fn thread_root(&self, category: Category) -> Result<Option<ThreadHandle>> {
        let mut conn = self.conn()?;

        let row: Option<ThreadRootRow> = thread_roots::table
            .find(category.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.map(|r| ThreadHandle::new(r.handle)))
    }

    async fn save_thread_root(&self, category: Category, handle: &ThreadHandle) -> Result<()> {
        let row = ThreadRootRow {
            category: category.as_str().to_string(),
            handle: handle.as_str().to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self.conn()?;

        // A mapping is trusted for the lifetime of the store, so an
        // existing row wins over a late duplicate write.
        diesel::insert_or_ignore_into(thread_roots::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }
}

impl FlagStore for SqliteStore {
    async fn flag(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn()?;

        let row: Option<ConfigRow> = config::table
            .find(key)
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.map(|r| r.value))
    }

    async fn set_flag(&self, key: &str, value: &str) -> Result<()> {
        let row = ConfigRow {
            key: key.to_string(),
            value: value.to_string(),
        };
        let mut conn = self.conn()?;

        diesel::replace_into(config::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }
}
