//! Report error types.

use std::fmt;

use chrono::NaiveDate;

/// One hop of the rental → category lookup chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    RentalToInventory,
    InventoryToFilm,
    FilmToFilmCategory,
    FilmCategoryToCategory,
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hop::RentalToInventory => "rental -> inventory",
            Hop::InventoryToFilm => "inventory -> film",
            Hop::FilmToFilmCategory => "film -> film_category",
            Hop::FilmCategoryToCategory => "film_category -> category",
        };
        f.write_str(name)
    }
}

/// Errors raised while building or reading the rental report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Join resolution failed for rental {rental_id}: {hop} matched {matches} rows")]
    JoinResolution {
        rental_id: i64,
        hop: Hop,
        matches: usize,
    },

    #[error("Duplicate rental in detail report: {0}")]
    DuplicateRental(i64),

    #[error("Invalid timestamp for rental {rental_id}: {value}")]
    InvalidTimestamp { rental_id: i64, value: String },

    #[error("Unknown time-of-day label: {0}")]
    UnknownLabel(String),

    #[error("Invalid report window: {first} is after {last}")]
    InvalidWindow { first: NaiveDate, last: NaiveDate },

    #[error("Invalid report target: {0}")]
    InvalidTarget(String),

    #[error("Rental not found: {0}")]
    RentalNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_resolution_message_names_hop() {
        let err = ReportError::JoinResolution {
            rental_id: 42,
            hop: Hop::InventoryToFilm,
            matches: 0,
        };
        assert_eq!(
            err.to_string(),
            "Join resolution failed for rental 42: inventory -> film matched 0 rows"
        );
    }
}
