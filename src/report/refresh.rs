//! Full refresh: rebuild both report tables for one window.

use sqlx::SqliteConnection;
use tracing::info;

use crate::error::Result;
use crate::source::{RentalSelection, RentalSource};
use crate::window::ReportWindow;

use super::detail::DetailTable;
use super::extract;
use super::record::SummaryRecord;
use super::summary::SummaryTable;

/// Result of a completed refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub window: ReportWindow,
    /// Detail rows written.
    pub detail_rows: usize,
    /// Summary rows after the rebuild, Morning first.
    pub summary: Vec<SummaryRecord>,
}

/// Clear both tables, then reload the window.
///
/// Runs on `conn` without managing the transaction; the caller wraps it so
/// a failure anywhere leaves the previous report in place. Both tables are
/// empty before the first insert, so the summary is rebuilt purely from the
/// inserts of this run.
pub async fn run(
    conn: &mut SqliteConnection,
    source: &dyn RentalSource,
    window: &ReportWindow,
) -> Result<RefreshOutcome> {
    let cleared_summary = SummaryTable::clear(conn).await?;
    let cleared_details = DetailTable::clear(conn).await?;
    info!(
        %window,
        cleared_details,
        cleared_summary,
        "Report tables cleared"
    );

    let relations = source.load(conn, &RentalSelection::Window(*window)).await?;
    let records = extract::resolve(&relations)?;

    for record in &records {
        DetailTable::insert(conn, record).await?;
    }

    let summary = SummaryTable::load(conn).await?;
    Ok(RefreshOutcome {
        window: *window,
        detail_rows: records.len(),
        summary,
    })
}
