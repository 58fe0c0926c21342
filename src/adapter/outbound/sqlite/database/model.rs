//! Database row types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{config, posted_deals, thread_roots};

/// Row recording one successfully delivered deal. Never mutated.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = posted_deals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PostedDealRow {
    pub id: String,
    pub source: String,
    pub title: String,
    pub posted_at: String,
}

/// Row mapping a category to its durable thread-root handle.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = thread_roots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ThreadRootRow {
    pub category: String,
    pub handle: String,
    pub created_at: String,
}

/// Key-value configuration row.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = config)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ConfigRow {
    pub key: String,
    pub value: String,
}
