//! Report run configuration.

use chrono::NaiveDateTime;
use serde::Deserialize;

/// Clock used to resolve "now" for the scheduled run.
///
/// Rental timestamps carry no zone, so this must match the zone the upstream
/// system records them in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clock {
    #[default]
    Local,
    Utc,
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::Local => chrono::Local::now().naive_local(),
            Clock::Utc => chrono::Utc::now().naive_utc(),
        }
    }
}

/// Report run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Clock for the default target instant.
    pub clock: Clock,
    /// Recompute the summary from the detail table after each refresh and
    /// warn on any drift.
    pub audit_after_refresh: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            clock: Clock::Local,
            audit_after_refresh: true,
        }
    }
}
