//! In-memory RentalSource for tests and embedding.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::error::Result;

use super::{RentalSelection, RentalSource, SourceRelations};

/// RentalSource backed by fixed relations.
///
/// Only the rental list is filtered by the selection; lookup relations are
/// returned whole.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRentalSource {
    relations: SourceRelations,
}

impl InMemoryRentalSource {
    pub fn new(relations: SourceRelations) -> Self {
        Self { relations }
    }
}

#[async_trait]
impl RentalSource for InMemoryRentalSource {
    async fn load(&self, _conn: &mut SqliteConnection, selection: &RentalSelection) -> Result<SourceRelations> {
        let rentals = self
            .relations
            .rentals
            .iter()
            .filter(|rental| selection.matches(rental))
            .cloned()
            .collect();

        Ok(SourceRelations {
            rentals,
            ..self.relations.clone()
        })
    }
}
