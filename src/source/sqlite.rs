//! SQLite RentalSource over the upstream DVD rental tables.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sea_query::{Alias, Expr, Func, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::money::Money;
use crate::storage::schema::{Category, Film, FilmCategory, Inventory, Rental};
use crate::window::{parse_timestamp, DATE_FORMAT};

use super::{
    CategoryRow, FilmCategoryRow, FilmRow, InventoryRow, RentalRow, RentalSelection, RentalSource,
    SourceRelations,
};

/// Reads the upstream tables from the same database as the report tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteRentalSource;

impl SqliteRentalSource {
    pub fn new() -> Self {
        Self
    }

    /// Day-level pre-filter. Upstream timestamps are TEXT in more than one
    /// layout, so only the date prefix is compared in SQL; the exact window
    /// check runs on the parsed value.
    fn rentals_sql(selection: &RentalSelection) -> String {
        let mut query = Query::select();
        query
            .columns([Rental::RentalId, Rental::InventoryId, Rental::RentalDate])
            .from(Rental::Table);

        match selection {
            RentalSelection::Window(window) => {
                query.and_where(Expr::cust_with_values(
                    "substr(rental_date, 1, 10) BETWEEN ? AND ?",
                    [
                        window.first_day().format(DATE_FORMAT).to_string(),
                        window.last_day().format(DATE_FORMAT).to_string(),
                    ],
                ));
            }
            RentalSelection::Rental(rental_id) => {
                query.and_where(Expr::col(Rental::RentalId).eq(*rental_id));
            }
        }

        query.to_string(SqliteQueryBuilder)
    }

    async fn fetch(conn: &mut SqliteConnection, sql: &str) -> Result<Vec<SqliteRow>> {
        Ok(sqlx::query(sql).fetch_all(&mut *conn).await?)
    }

    async fn load_rentals(conn: &mut SqliteConnection, selection: &RentalSelection) -> Result<Vec<RentalRow>> {
        let rows = Self::fetch(conn, &Self::rentals_sql(selection)).await?;

        let mut rentals = Vec::with_capacity(rows.len());
        for row in &rows {
            let rental_id: i64 = row.try_get("rental_id")?;
            let value: String = row.try_get("rental_date")?;
            let rental_date = parse_timestamp(&value)
                .ok_or(ReportError::InvalidTimestamp { rental_id, value })?;
            let rental = RentalRow {
                rental_id,
                inventory_id: row.try_get("inventory_id")?,
                rental_date,
            };
            if selection.matches(&rental) {
                rentals.push(rental);
            }
        }
        Ok(rentals)
    }

    async fn load_inventory(conn: &mut SqliteConnection, ids: &[i64]) -> Result<Vec<InventoryRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = Query::select()
            .columns([Inventory::InventoryId, Inventory::FilmId])
            .from(Inventory::Table)
            .and_where(Expr::col(Inventory::InventoryId).is_in(ids.iter().copied()))
            .to_string(SqliteQueryBuilder);

        let rows = Self::fetch(conn, &sql).await?;
        rows.iter()
            .map(|row| {
                Ok(InventoryRow {
                    inventory_id: row.try_get("inventory_id")?,
                    film_id: row.try_get("film_id")?,
                })
            })
            .collect()
    }

    async fn load_films(conn: &mut SqliteConnection, ids: &[i64]) -> Result<Vec<FilmRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // NUMERIC affinity stores whole rates as INTEGER; cast so every row decodes as f64.
        let sql = Query::select()
            .columns([Film::FilmId, Film::Title, Film::Rating])
            .expr_as(
                Func::cast_as(Expr::col(Film::RentalRate), Alias::new("REAL")),
                Alias::new("rental_rate"),
            )
            .from(Film::Table)
            .and_where(Expr::col(Film::FilmId).is_in(ids.iter().copied()))
            .to_string(SqliteQueryBuilder);

        let rows = Self::fetch(conn, &sql).await?;
        rows.iter()
            .map(|row| {
                let rate: f64 = row.try_get("rental_rate")?;
                Ok(FilmRow {
                    film_id: row.try_get("film_id")?,
                    title: row.try_get("title")?,
                    rating: row.try_get("rating")?,
                    rental_rate: Money::from_decimal(rate),
                })
            })
            .collect()
    }

    async fn load_film_categories(conn: &mut SqliteConnection, film_ids: &[i64]) -> Result<Vec<FilmCategoryRow>> {
        if film_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = Query::select()
            .columns([FilmCategory::FilmId, FilmCategory::CategoryId])
            .from(FilmCategory::Table)
            .and_where(Expr::col(FilmCategory::FilmId).is_in(film_ids.iter().copied()))
            .to_string(SqliteQueryBuilder);

        let rows = Self::fetch(conn, &sql).await?;
        rows.iter()
            .map(|row| {
                Ok(FilmCategoryRow {
                    film_id: row.try_get("film_id")?,
                    category_id: row.try_get("category_id")?,
                })
            })
            .collect()
    }

    async fn load_categories(conn: &mut SqliteConnection, ids: &[i64]) -> Result<Vec<CategoryRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = Query::select()
            .columns([Category::CategoryId, Category::Name])
            .from(Category::Table)
            .and_where(Expr::col(Category::CategoryId).is_in(ids.iter().copied()))
            .to_string(SqliteQueryBuilder);

        let rows = Self::fetch(conn, &sql).await?;
        rows.iter()
            .map(|row| {
                Ok(CategoryRow {
                    category_id: row.try_get("category_id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }
}

/// Distinct ids in ascending order.
fn distinct<T>(rows: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
    rows.iter().map(id).collect::<BTreeSet<_>>().into_iter().collect()
}

#[async_trait]
impl RentalSource for SqliteRentalSource {
    async fn load(&self, conn: &mut SqliteConnection, selection: &RentalSelection) -> Result<SourceRelations> {
        let rentals = Self::load_rentals(conn, selection).await?;
        let inventory = Self::load_inventory(conn, &distinct(&rentals, |r| r.inventory_id)).await?;
        let film_ids = distinct(&inventory, |i| i.film_id);
        let films = Self::load_films(conn, &film_ids).await?;
        let film_categories = Self::load_film_categories(conn, &film_ids).await?;
        let categories =
            Self::load_categories(conn, &distinct(&film_categories, |fc| fc.category_id)).await?;

        debug!(
            ?selection,
            rentals = rentals.len(),
            inventory = inventory.len(),
            films = films.len(),
            categories = categories.len(),
            "Loaded upstream relations"
        );

        Ok(SourceRelations {
            rentals,
            inventory,
            films,
            film_categories,
            categories,
        })
    }
}
