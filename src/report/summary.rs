//! Summary table: running totals per time-of-day bucket.
//!
//! Rows are only ever written by [`SummaryTable::record`], which the detail
//! insert calls for every new detail row.

use std::collections::HashMap;

use sea_query::{Alias, Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::classifier::TimeOfDay;
use crate::error::Result;
use crate::money::Money;
use crate::storage::schema::{DetailedReport, SummaryReport};

use super::record::{DetailRecord, SummaryDrift, SummaryRecord};

/// Keyed store over the `summary_report` table.
pub struct SummaryTable;

impl SummaryTable {
    /// Fold one new detail row into its bucket.
    ///
    /// A single `INSERT .. ON CONFLICT DO UPDATE` statement: the first row for
    /// a bucket creates it with count 1, later rows bump count and revenue
    /// together.
    pub async fn record(conn: &mut SqliteConnection, record: &DetailRecord) -> Result<()> {
        let cents = record.rental_rate.cents();

        let query = Query::insert()
            .into_table(SummaryReport::Table)
            .columns([
                SummaryReport::TimeOfDay,
                SummaryReport::TotalRentals,
                SummaryReport::TotalRevenueCents,
            ])
            .values_panic([record.time_of_day.as_str().into(), 1i64.into(), cents.into()])
            .on_conflict(
                OnConflict::column(SummaryReport::TimeOfDay)
                    .value(
                        SummaryReport::TotalRentals,
                        Expr::col((SummaryReport::Table, SummaryReport::TotalRentals)).add(1i64),
                    )
                    .value(
                        SummaryReport::TotalRevenueCents,
                        Expr::col((SummaryReport::Table, SummaryReport::TotalRevenueCents)).add(cents),
                    )
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&mut *conn).await?;

        debug!(
            time_of_day = %record.time_of_day,
            rental_id = record.rental_id,
            rental_rate = %record.rental_rate,
            "Summary updated"
        );
        Ok(())
    }

    /// Remove every summary row.
    pub async fn clear(conn: &mut SqliteConnection) -> Result<u64> {
        let query = Query::delete()
            .from_table(SummaryReport::Table)
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    /// All summary rows, Morning first.
    pub async fn load(conn: &mut SqliteConnection) -> Result<Vec<SummaryRecord>> {
        let query = Query::select()
            .columns([
                SummaryReport::TimeOfDay,
                SummaryReport::TotalRentals,
                SummaryReport::TotalRevenueCents,
            ])
            .from(SummaryReport::Table)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&mut *conn).await?;

        let mut records = rows
            .iter()
            .map(|row| {
                let label: String = row.try_get("time_of_day")?;
                Ok(SummaryRecord {
                    time_of_day: label.parse()?,
                    total_rentals: row.try_get("total_rentals")?,
                    total_revenue: Money::from_cents(row.try_get("total_revenue_cents")?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        records.sort_by_key(|r| r.time_of_day);
        Ok(records)
    }

    /// Compare stored totals with totals recomputed from the detail table.
    ///
    /// Returns one entry per drifting bucket; empty means consistent.
    pub async fn audit(conn: &mut SqliteConnection) -> Result<Vec<SummaryDrift>> {
        let query = Query::select()
            .column(DetailedReport::TimeOfDay)
            .expr_as(Expr::col(DetailedReport::RentalId).count(), Alias::new("rentals"))
            .expr_as(Expr::col(DetailedReport::RentalRateCents).sum(), Alias::new("revenue"))
            .from(DetailedReport::Table)
            .group_by_col(DetailedReport::TimeOfDay)
            .order_by(DetailedReport::TimeOfDay, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&mut *conn).await?;

        let mut expected: HashMap<TimeOfDay, (i64, Money)> = HashMap::new();
        for row in &rows {
            let label: String = row.try_get("time_of_day")?;
            let rentals: i64 = row.try_get("rentals")?;
            let revenue: i64 = row.try_get("revenue")?;
            expected.insert(label.parse()?, (rentals, Money::from_cents(revenue)));
        }

        let stored: HashMap<TimeOfDay, (i64, Money)> = Self::load(conn)
            .await?
            .into_iter()
            .map(|r| (r.time_of_day, (r.total_rentals, r.total_revenue)))
            .collect();

        let none = (0, Money::ZERO);
        Ok(TimeOfDay::ALL
            .into_iter()
            .filter_map(|label| {
                let stored = stored.get(&label).copied().unwrap_or(none);
                let expected = expected.get(&label).copied().unwrap_or(none);
                (stored != expected).then_some(SummaryDrift {
                    time_of_day: label,
                    stored,
                    expected,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::detail::DetailTable;
    use crate::storage::create_report_tables;
    use crate::window::parse_timestamp;

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
            film_id: 1,
            title: "Academy Dinosaur".to_string(),
            category: "Documentary".to_string(),
            rating: Some("PG".to_string()),
            rental_rate: Money::from_cents(cents),
            rental_date,
            time_of_day: TimeOfDay::classify(&rental_date),
        }
    }

    #[tokio::test]
    async fn test_record_creates_then_accumulates() {
        let mut conn = setup().await;

        SummaryTable::record(&mut conn, &detail(1, "2005-05-30 09:00:00", 299))
            .await
            .unwrap();
        assert_eq!(
            SummaryTable::load(&mut conn).await.unwrap(),
            vec![SummaryRecord {
                time_of_day: TimeOfDay::Morning,
                total_rentals: 1,
                total_revenue: Money::from_cents(299),
            }]
        );

        SummaryTable::record(&mut conn, &detail(2, "2005-05-30 09:30:00", 199))
            .await
            .unwrap();
        let summary = SummaryTable::load(&mut conn).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].total_rentals, 2);
        assert_eq!(summary[0].total_revenue, Money::from_cents(498));
    }

    #[tokio::test]
    async fn test_load_orders_by_clock() {
        let mut conn = setup().await;
        for (id, at) in [(1, "2005-05-30 18:00:00"), (2, "2005-05-30 08:00:00"), (3, "2005-05-30 12:00:00")] {
            SummaryTable::record(&mut conn, &detail(id, at, 100)).await.unwrap();
        }

        let labels: Vec<_> = SummaryTable::load(&mut conn)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.time_of_day)
            .collect();
        assert_eq!(labels, TimeOfDay::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_audit_flags_drift() {
        let mut conn = setup().await;
        DetailTable::insert(&mut conn, &detail(1, "2005-05-30 13:00:00", 499))
            .await
            .unwrap();
        assert!(SummaryTable::audit(&mut conn).await.unwrap().is_empty());

        // A stray write that bypasses the detail table.
        SummaryTable::record(&mut conn, &detail(2, "2005-05-30 20:00:00", 99))
            .await
            .unwrap();

        let drift = SummaryTable::audit(&mut conn).await.unwrap();
        assert_eq!(
            drift,
            vec![SummaryDrift {
                time_of_day: TimeOfDay::Evening,
                stored: (1, Money::from_cents(99)),
                expected: (0, Money::ZERO),
            }]
        );
    }

    #[tokio::test]
    async fn test_clear_empties_table() {
        let mut conn = setup().await;
        SummaryTable::record(&mut conn, &detail(1, "2005-05-30 09:00:00", 299))
            .await
            .unwrap();

        assert_eq!(SummaryTable::clear(&mut conn).await.unwrap(), 1);
        assert!(SummaryTable::load(&mut conn).await.unwrap().is_empty());
    }
}
