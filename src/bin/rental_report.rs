//! rental-report: daily time-of-day rental report
//!
//! Rebuilds the `detailed_report` and `summary_report` tables from the
//! upstream rental schema. Intended to be run once per business day by an
//! external scheduler.
//!
//! ## Usage
//! ```text
//! rental-report                          # today, up to now
//! rental-report "2005-05-30 18:00:00"    # that day, up to that instant
//! rental-report 2005-05-30               # that whole day
//! rental-report 2005-05-24..2005-05-31   # closed range of days
//! ```
//!
//! ## Configuration
//! - RENTAL_REPORT_CONFIG: YAML config file (optional)
//! - RENTAL_REPORT__STORAGE__PATH: SQLite database path
//! - RENTAL_REPORT_LOG: tracing filter (default: info)
//!
//! Exits non-zero if the refresh fails; the previous report is then left
//! untouched.

use tracing::{error, info};

use rental_report::config::Config;
use rental_report::storage::init_storage;
use rental_report::utils::bootstrap::init_tracing;
use rental_report::{RentalReport, ReportWindow};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;

    let window = match std::env::args().nth(1) {
        Some(target) => target.parse::<ReportWindow>()?,
        None => ReportWindow::day_until(config.report.clock.now()),
    };

    let pool = init_storage(&config.storage).await?;
    let report = RentalReport::new(pool);

    let outcome = match report.generate_reports_for(&window).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, %window, "Report refresh failed");
            return Err(e.into());
        }
    };

    for row in &outcome.summary {
        info!(
            time_of_day = %row.time_of_day,
            total_rentals = row.total_rentals,
            total_revenue = %row.total_revenue,
            "Summary"
        );
    }

    if config.report.audit_after_refresh {
        let drift = report.audit().await?;
        if drift.is_empty() {
            info!("Summary consistent with detail table");
        }
    }

    Ok(())
}
