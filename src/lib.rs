//! Rental report - time-of-day rental summary for the DVD rental schema.
//!
//! Extracts the day's rentals from the upstream rental/inventory/film/category
//! tables, classifies each into Morning, Afternoon or Evening, and maintains a
//! detail table plus a per-bucket summary that is updated on every detail
//! insert.

pub mod classifier;
pub mod config;
pub mod error;
pub mod money;
pub mod report;
pub mod source;
pub mod storage;
pub mod utils;
pub mod window;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use classifier::TimeOfDay;
pub use error::{ReportError, Result};
pub use money::Money;
pub use report::{DetailRecord, RefreshOutcome, RentalReport, SummaryRecord};
pub use window::ReportWindow;
