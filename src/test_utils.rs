//! Test utilities: upstream schema fixtures and failing sources.
//!
//! The upstream rental schema is not owned by this crate, so tests build a
//! minimal copy of it here and seed it through [`SourceFixture`].

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{Hop, ReportError, Result};
use crate::source::{InMemoryRentalSource, RentalSelection, RentalSource, SourceRelations};
use crate::storage::create_report_tables;
use crate::window::{format_timestamp, parse_timestamp};

/// Minimal upstream DVD rental schema.
///
/// No foreign keys, so tests can seed broken joins.
pub const CREATE_SOURCE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS category (
    category_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS film (
    film_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    rating TEXT,
    rental_rate NUMERIC NOT NULL
);

CREATE TABLE IF NOT EXISTS film_category (
    film_id INTEGER NOT NULL,
    category_id INTEGER NOT NULL,
    PRIMARY KEY (film_id, category_id)
);

CREATE TABLE IF NOT EXISTS inventory (
    inventory_id INTEGER PRIMARY KEY,
    film_id INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rental (
    rental_id INTEGER PRIMARY KEY,
    rental_date TIMESTAMP NOT NULL,
    inventory_id INTEGER NOT NULL
);
"#;

/// Single-connection in-memory pool with upstream and report tables.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::query(CREATE_SOURCE_TABLES)
        .execute(&pool)
        .await
        .expect("Failed to create upstream tables");
    create_report_tables(&pool)
        .await
        .expect("Failed to create report tables");

    pool
}

/// Parse a `YYYY-MM-DD HH:MM:SS` literal.
pub fn ts(value: &str) -> NaiveDateTime {
    parse_timestamp(value).expect("Invalid timestamp literal")
}

/// Seeds the upstream tables.
pub struct SourceFixture<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SourceFixture<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn category(&self, category_id: i64, name: &str) -> &Self {
        sqlx::query("INSERT INTO category (category_id, name) VALUES (?, ?)")
            .bind(category_id)
            .bind(name)
            .execute(self.pool)
            .await
            .expect("Failed to insert category");
        self
    }

    /// Insert a film and link it to `category_id`.
    pub async fn film(&self, film_id: i64, title: &str, rate: f64, category_id: i64) -> &Self {
        self.film_without_category(film_id, title, rate).await;
        self.link(film_id, category_id).await
    }

    pub async fn film_without_category(&self, film_id: i64, title: &str, rate: f64) -> &Self {
        sqlx::query("INSERT INTO film (film_id, title, rating, rental_rate) VALUES (?, ?, 'PG', ?)")
            .bind(film_id)
            .bind(title)
            .bind(rate)
            .execute(self.pool)
            .await
            .expect("Failed to insert film");
        self
    }

    pub async fn link(&self, film_id: i64, category_id: i64) -> &Self {
        sqlx::query("INSERT INTO film_category (film_id, category_id) VALUES (?, ?)")
            .bind(film_id)
            .bind(category_id)
            .execute(self.pool)
            .await
            .expect("Failed to insert film_category");
        self
    }

    pub async fn inventory(&self, inventory_id: i64, film_id: i64) -> &Self {
        sqlx::query("INSERT INTO inventory (inventory_id, film_id) VALUES (?, ?)")
            .bind(inventory_id)
            .bind(film_id)
            .execute(self.pool)
            .await
            .expect("Failed to insert inventory");
        self
    }

    pub async fn rental(&self, rental_id: i64, inventory_id: i64, at: &str) -> &Self {
        sqlx::query("INSERT INTO rental (rental_id, rental_date, inventory_id) VALUES (?, ?, ?)")
            .bind(rental_id)
            .bind(format_timestamp(&ts(at)))
            .bind(inventory_id)
            .execute(self.pool)
            .await
            .expect("Failed to insert rental");
        self
    }

    /// Insert a rental with a raw, possibly malformed, timestamp.
    pub async fn raw_rental(&self, rental_id: i64, inventory_id: i64, rental_date: &str) -> &Self {
        sqlx::query("INSERT INTO rental (rental_id, rental_date, inventory_id) VALUES (?, ?, ?)")
            .bind(rental_id)
            .bind(rental_date)
            .bind(inventory_id)
            .execute(self.pool)
            .await
            .expect("Failed to insert rental");
        self
    }
}

/// Source that serves its relations for the first `loads` calls and fails
/// every call after that with a join-resolution error.
pub struct FailingRentalSource {
    inner: InMemoryRentalSource,
    loads: AtomicUsize,
}

impl FailingRentalSource {
    pub fn after(loads: usize, relations: SourceRelations) -> Self {
        Self {
            inner: InMemoryRentalSource::new(relations),
            loads: AtomicUsize::new(loads),
        }
    }
}

#[async_trait]
impl RentalSource for FailingRentalSource {
    async fn load(&self, conn: &mut SqliteConnection, selection: &RentalSelection) -> Result<SourceRelations> {
        let served = self
            .loads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if served.is_err() {
            return Err(ReportError::JoinResolution {
                rental_id: 0,
                hop: Hop::RentalToInventory,
                matches: 0,
            });
        }
        self.inner.load(conn, selection).await
    }
}
