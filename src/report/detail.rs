//! Detail table: one denormalized row per rental.

use sea_query::{Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::money::Money;
use crate::storage::schema::DetailedReport;
use crate::window::{format_timestamp, parse_timestamp};

use super::record::DetailRecord;
use super::summary::SummaryTable;

/// Store over the `detailed_report` table.
pub struct DetailTable;

impl DetailTable {
    /// Insert one detail row and fold it into the summary.
    ///
    /// Both writes go through `conn`, so inside a transaction they commit or
    /// roll back together.
    pub async fn insert(conn: &mut SqliteConnection, record: &DetailRecord) -> Result<()> {
        let query = Query::insert()
            .into_table(DetailedReport::Table)
            .columns([
                DetailedReport::RentalId,
                DetailedReport::FilmId,
                DetailedReport::Title,
                DetailedReport::Category,
                DetailedReport::Rating,
                DetailedReport::RentalRateCents,
                DetailedReport::RentalDate,
                DetailedReport::TimeOfDay,
            ])
            .values_panic([
                record.rental_id.into(),
                record.film_id.into(),
                record.title.as_str().into(),
                record.category.as_str().into(),
                record.rating.clone().into(),
                record.rental_rate.cents().into(),
                format_timestamp(&record.rental_date).into(),
                record.time_of_day.as_str().into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query)
            .execute(&mut *conn)
            .await
            .map_err(|e| insert_error(e, record.rental_id))?;

        debug!(
            rental_id = record.rental_id,
            time_of_day = %record.time_of_day,
            "Detail row inserted"
        );

        SummaryTable::record(conn, record).await
    }

    /// Remove every detail row.
    pub async fn clear(conn: &mut SqliteConnection) -> Result<u64> {
        let query = Query::delete()
            .from_table(DetailedReport::Table)
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    /// All detail rows by rental id.
    pub async fn load(conn: &mut SqliteConnection) -> Result<Vec<DetailRecord>> {
        let query = Query::select()
            .columns([
                DetailedReport::RentalId,
                DetailedReport::FilmId,
                DetailedReport::Title,
                DetailedReport::Category,
                DetailedReport::Rating,
                DetailedReport::RentalRateCents,
                DetailedReport::RentalDate,
                DetailedReport::TimeOfDay,
            ])
            .from(DetailedReport::Table)
            .order_by(DetailedReport::RentalId, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&mut *conn).await?;

        rows.iter()
            .map(|row| {
                let rental_id: i64 = row.try_get("rental_id")?;
                let value: String = row.try_get("rental_date")?;
                let rental_date = parse_timestamp(&value)
                    .ok_or(ReportError::InvalidTimestamp { rental_id, value })?;
                let label: String = row.try_get("time_of_day")?;

                Ok(DetailRecord {
                    rental_id,
                    film_id: row.try_get("film_id")?,
                    title: row.try_get("title")?,
                    category: row.try_get("category")?,
                    rating: row.try_get("rating")?,
                    rental_rate: Money::from_cents(row.try_get("rental_rate_cents")?),
                    rental_date,
                    time_of_day: label.parse()?,
                })
            })
            .collect()
    }
}

fn insert_error(e: sqlx::Error, rental_id: i64) -> ReportError {
    let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
    if duplicate {
        ReportError::DuplicateRental(rental_id)
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TimeOfDay;
    use crate::storage::create_report_tables;

    async fn setup() -> sqlx::pool::PoolConnection<sqlx::Sqlite> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_report_tables(&pool).await.unwrap();
        pool.acquire().await.unwrap()
    }

    fn detail(rental_id: i64, at: &str, cents: i64) -> DetailRecord {
        let rental_date = parse_timestamp(at).unwrap();
        DetailRecord {
            rental_id,
            film_id: 7,
            title: "Airplane Sierra".to_string(),
            category: "Comedy".to_string(),
            rating: None,
            rental_rate: Money::from_cents(cents),
            rental_date,
            time_of_day: TimeOfDay::classify(&rental_date),
        }
    }

    #[tokio::test]
    async fn test_insert_round_trips_and_aggregates() {
        let mut conn = setup().await;
        let record = detail(3, "2005-05-30 17:00:00", 499);

        DetailTable::insert(&mut conn, &record).await.unwrap();

        assert_eq!(DetailTable::load(&mut conn).await.unwrap(), vec![record]);
        let summary = SummaryTable::load(&mut conn).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].time_of_day, TimeOfDay::Evening);
        assert_eq!(summary[0].total_rentals, 1);
    }

    #[tokio::test]
    async fn test_duplicate_rental_is_rejected_without_aggregating() {
        let mut conn = setup().await;
        DetailTable::insert(&mut conn, &detail(3, "2005-05-30 09:00:00", 299))
            .await
            .unwrap();

        let err = DetailTable::insert(&mut conn, &detail(3, "2005-05-30 10:00:00", 299))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::DuplicateRental(3)));

        let summary = SummaryTable::load(&mut conn).await.unwrap();
        assert_eq!(summary[0].total_rentals, 1);
    }

    #[tokio::test]
    async fn test_clear_reports_removed_rows() {
        let mut conn = setup().await;
        DetailTable::insert(&mut conn, &detail(1, "2005-05-30 09:00:00", 299))
            .await
            .unwrap();
        DetailTable::insert(&mut conn, &detail(2, "2005-05-30 19:00:00", 99))
            .await
            .unwrap();

        assert_eq!(DetailTable::clear(&mut conn).await.unwrap(), 2);
        assert!(DetailTable::load(&mut conn).await.unwrap().is_empty());
    }
}
