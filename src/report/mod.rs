//! Time-of-day rental report.
//!
//! ```text
//! upstream tables --(RentalSource)--> extract::resolve --> DetailTable::insert
//!                                                               |
//!                                                               v
//!                                                      SummaryTable::record
//! ```
//!
//! [`RentalReport`] is the entry point. It owns the pool and serializes
//! writers; every write runs in one `BEGIN IMMEDIATE` transaction.

use std::sync::Arc;

use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{ReportError, Result};
use crate::source::{RentalSelection, RentalSource, SqliteRentalSource};
use crate::storage::{begin_immediate, create_report_tables, finish_transaction};
use crate::window::ReportWindow;

pub mod detail;
pub mod extract;
mod record;
pub mod refresh;
pub mod summary;

pub use detail::DetailTable;
pub use record::{DetailRecord, SummaryDrift, SummaryRecord};
pub use refresh::RefreshOutcome;
pub use summary::SummaryTable;

/// Report service over one database.
pub struct RentalReport {
    pool: SqlitePool,
    source: Arc<dyn RentalSource>,
    /// Held for the duration of every write; at most one refresh runs at a time.
    write_lock: Mutex<()>,
}

impl RentalReport {
    /// Report reading the upstream tables from the same database.
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_source(pool, Arc::new(SqliteRentalSource::new()))
    }

    pub fn with_source(pool: SqlitePool, source: Arc<dyn RentalSource>) -> Self {
        Self {
            pool,
            source,
            write_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the report tables if missing.
    pub async fn init(&self) -> Result<()> {
        create_report_tables(&self.pool).await
    }

    /// Rebuild the report for the day of `at`, up to `at`.
    pub async fn generate_reports(&self, at: NaiveDateTime) -> Result<RefreshOutcome> {
        self.generate_reports_for(&ReportWindow::day_until(at)).await
    }

    /// Rebuild the report for an arbitrary window.
    ///
    /// On any error both tables keep their pre-refresh contents.
    pub async fn generate_reports_for(&self, window: &ReportWindow) -> Result<RefreshOutcome> {
        let _guard = self.write_lock.lock().await;
        info!(%window, "Report refresh started");

        let mut conn = self.pool.acquire().await?;
        begin_immediate(&mut conn).await?;
        let result = refresh::run(&mut conn, self.source.as_ref(), window).await;
        let outcome = finish_transaction(&mut conn, result).await?;

        info!(
            %window,
            detail_rows = outcome.detail_rows,
            summary_rows = outcome.summary.len(),
            "Report refresh committed"
        );
        Ok(outcome)
    }

    /// Append one upstream rental to the current report.
    ///
    /// No window filter applies. Fails with `DuplicateRental` if the rental is
    /// already reported and `RentalNotFound` if it does not exist upstream.
    pub async fn append_rental(&self, rental_id: i64) -> Result<DetailRecord> {
        let _guard = self.write_lock.lock().await;

        let mut conn = self.pool.acquire().await?;
        begin_immediate(&mut conn).await?;
        let result = self.append_in_transaction(&mut conn, rental_id).await;
        let record = finish_transaction(&mut conn, result).await?;

        info!(
            rental_id,
            time_of_day = %record.time_of_day,
            "Rental appended to report"
        );
        Ok(record)
    }

    async fn append_in_transaction(
        &self,
        conn: &mut sqlx::SqliteConnection,
        rental_id: i64,
    ) -> Result<DetailRecord> {
        let relations = self
            .source
            .load(conn, &RentalSelection::Rental(rental_id))
            .await?;
        let record = extract::resolve(&relations)?
            .into_iter()
            .next()
            .ok_or(ReportError::RentalNotFound(rental_id))?;

        DetailTable::insert(conn, &record).await?;
        Ok(record)
    }

    /// All detail rows by rental id.
    pub async fn details(&self) -> Result<Vec<DetailRecord>> {
        let mut conn = self.pool.acquire().await?;
        DetailTable::load(&mut conn).await
    }

    /// All summary rows, Morning first.
    pub async fn summary(&self) -> Result<Vec<SummaryRecord>> {
        let mut conn = self.pool.acquire().await?;
        SummaryTable::load(&mut conn).await
    }

    /// Check the summary against the detail table, warning on each drift.
    pub async fn audit(&self) -> Result<Vec<SummaryDrift>> {
        let mut conn = self.pool.acquire().await?;
        let drift = SummaryTable::audit(&mut conn).await?;
        for d in &drift {
            warn!(
                time_of_day = %d.time_of_day,
                stored_rentals = d.stored.0,
                stored_revenue = %d.stored.1,
                expected_rentals = d.expected.0,
                expected_revenue = %d.expected.1,
                "Summary drift"
            );
        }
        Ok(drift)
    }
}
