//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! The upstream tables are read-only; only the two report tables are created here.

use sea_query::{ColumnDef, Expr, Iden, SqliteQueryBuilder, Table};

use crate::classifier::TimeOfDay;

/// Upstream rental transactions.
#[derive(Iden)]
pub enum Rental {
    Table,
    #[iden = "rental_id"]
    RentalId,
    #[iden = "rental_date"]
    RentalDate,
    #[iden = "inventory_id"]
    InventoryId,
}

/// Upstream inventory items.
#[derive(Iden)]
pub enum Inventory {
    Table,
    #[iden = "inventory_id"]
    InventoryId,
    #[iden = "film_id"]
    FilmId,
}

/// Upstream films.
#[derive(Iden)]
pub enum Film {
    Table,
    #[iden = "film_id"]
    FilmId,
    #[iden = "title"]
    Title,
    #[iden = "rating"]
    Rating,
    #[iden = "rental_rate"]
    RentalRate,
}

/// Upstream film to category link.
#[derive(Iden)]
pub enum FilmCategory {
    Table,
    #[iden = "film_id"]
    FilmId,
    #[iden = "category_id"]
    CategoryId,
}

/// Upstream categories.
#[derive(Iden)]
pub enum Category {
    Table,
    #[iden = "category_id"]
    CategoryId,
    #[iden = "name"]
    Name,
}

/// Detail report table, one row per rental.
#[derive(Iden)]
pub enum DetailedReport {
    #[iden = "detailed_report"]
    Table,
    #[iden = "rental_id"]
    RentalId,
    #[iden = "film_id"]
    FilmId,
    #[iden = "title"]
    Title,
    #[iden = "category"]
    Category,
    #[iden = "rating"]
    Rating,
    #[iden = "rental_rate_cents"]
    RentalRateCents,
    #[iden = "rental_date"]
    RentalDate,
    #[iden = "time_of_day"]
    TimeOfDay,
}

/// Summary report table, one row per time-of-day label.
#[derive(Iden)]
pub enum SummaryReport {
    #[iden = "summary_report"]
    Table,
    #[iden = "time_of_day"]
    TimeOfDay,
    #[iden = "total_rentals"]
    TotalRentals,
    #[iden = "total_revenue_cents"]
    TotalRevenueCents,
}

fn label_check<T: Iden + 'static>(column: T) -> sea_query::SimpleExpr {
    Expr::col(column).is_in(TimeOfDay::ALL.map(|label| label.as_str()))
}

/// SQL for creating the detail report table.
pub fn create_detailed_report_table() -> String {
    Table::create()
        .table(DetailedReport::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(DetailedReport::RentalId)
                .integer()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(DetailedReport::FilmId).integer().not_null())
        .col(ColumnDef::new(DetailedReport::Title).text().not_null())
        .col(ColumnDef::new(DetailedReport::Category).text().not_null())
        .col(ColumnDef::new(DetailedReport::Rating).text())
        .col(
            ColumnDef::new(DetailedReport::RentalRateCents)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(DetailedReport::RentalDate).text().not_null())
        .col(
            ColumnDef::new(DetailedReport::TimeOfDay)
                .text()
                .not_null()
                .check(label_check(DetailedReport::TimeOfDay)),
        )
        .to_string(SqliteQueryBuilder)
}

/// SQL for creating the summary report table.
pub fn create_summary_report_table() -> String {
    Table::create()
        .table(SummaryReport::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(SummaryReport::TimeOfDay)
                .text()
                .not_null()
                .primary_key()
                .check(label_check(SummaryReport::TimeOfDay)),
        )
        .col(
            ColumnDef::new(SummaryReport::TotalRentals)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(SummaryReport::TotalRevenueCents)
                .big_integer()
                .not_null(),
        )
        .to_string(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pool_with_report_tables() -> sqlx::SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(&create_detailed_report_table()).execute(&pool).await.unwrap();
        sqlx::query(&create_summary_report_table()).execute(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let pool = pool_with_report_tables().await;
        sqlx::query(&create_detailed_report_table()).execute(&pool).await.unwrap();
        sqlx::query(&create_summary_report_table()).execute(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_summary_rejects_unknown_label() {
        let pool = pool_with_report_tables().await;
        let result = sqlx::query(
            "INSERT INTO summary_report (time_of_day, total_rentals, total_revenue_cents) VALUES ('Night', 1, 100)",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_summary_is_unique_on_label() {
        let pool = pool_with_report_tables().await;
        let insert = "INSERT INTO summary_report (time_of_day, total_rentals, total_revenue_cents) VALUES ('Morning', 1, 100)";
        sqlx::query(insert).execute(&pool).await.unwrap();
        assert!(sqlx::query(insert).execute(&pool).await.is_err());
    }
}
