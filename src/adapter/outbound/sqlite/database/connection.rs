//! Database connection management using Diesel ORM.
//!
//! Provides connection pooling and embedded migration support for the
//! SQLite store.

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Error, Result};

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Create a connection pool for the given database URL.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(5)
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Run all pending database migrations.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Connection(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_pool_with_memory_db() {
        let pool = create_pool(":memory:");
        assert!(pool.is_ok());
    }

    #[test]
    fn run_migrations_creates_tables() {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();

        let mut conn = pool.get().unwrap();
        let tables: Vec<String> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name"
        )
        .load::<TableName>(&mut conn)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();

        assert!(tables.contains(&"posted_deals".to_string()));
        assert!(tables.contains(&"thread_roots".to_string()));
        assert!(tables.contains(&"config".to_string()));
    }

    #[test]
    fn run_migrations_is_idempotent() {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();

        let mut conn = pool.get().unwrap();
        let count: Vec<TableCount> = diesel::sql_query(
            "SELECT COUNT(*) as count FROM sqlite_master WHERE type='table' AND name='posted_deals'",
        )
        .load(&mut conn)
        .unwrap();

        assert_eq!(count[0].count, 1);
    }

    use diesel::prelude::*;

    #[derive(diesel::QueryableByName)]
    struct TableName {
        #[diesel(sql_type = diesel::sql_types::Text)]
        name: String,
    }

    #[derive(diesel::QueryableByName)]
    struct TableCount {
        #[diesel(sql_type = diesel::sql_types::BigInt)]
        count: i64,
    }
}
