//! Upstream rental data.
//!
//! The upstream schema is read-only. A [`RentalSource`] returns the slice of
//! each relation needed to resolve a selection of rentals; the join itself
//! runs in memory (see [`crate::report::extract`]).

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::SqliteConnection;

use crate::error::Result;
use crate::money::Money;
use crate::window::ReportWindow;

mod in_memory;
mod sqlite;

pub use in_memory::InMemoryRentalSource;
pub use sqlite::SqliteRentalSource;

/// Which rentals to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalSelection {
    /// Every rental whose timestamp falls inside the window.
    Window(ReportWindow),
    /// A single rental by id, regardless of its timestamp.
    Rental(i64),
}

impl RentalSelection {
    pub fn matches(&self, rental: &RentalRow) -> bool {
        match self {
            RentalSelection::Window(window) => window.contains(&rental.rental_date),
            RentalSelection::Rental(id) => rental.rental_id == *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RentalRow {
    pub rental_id: i64,
    pub inventory_id: i64,
    pub rental_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub inventory_id: i64,
    pub film_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilmRow {
    pub film_id: i64,
    pub title: String,
    pub rating: Option<String>,
    pub rental_rate: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilmCategoryRow {
    pub film_id: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub category_id: i64,
    pub name: String,
}

/// The upstream relations backing one extraction.
///
/// `rentals` holds only the selected rentals; the other relations hold at
/// least every row those rentals reach, and may hold more.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRelations {
    pub rentals: Vec<RentalRow>,
    pub inventory: Vec<InventoryRow>,
    pub films: Vec<FilmRow>,
    pub film_categories: Vec<FilmCategoryRow>,
    pub categories: Vec<CategoryRow>,
}

/// Read access to the upstream rental schema.
///
/// Loads run on the caller's connection so that a refresh reads and writes
/// inside one transaction.
#[async_trait]
pub trait RentalSource: Send + Sync {
    /// Load the relations needed to resolve `selection`.
    async fn load(&self, conn: &mut SqliteConnection, selection: &RentalSelection) -> Result<SourceRelations>;
}
