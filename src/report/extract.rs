//! Detail extraction: the rental → inventory → film → category lookup pipeline.
//!
//! Every hop must match exactly one row. The upstream schema makes these
//! functional relations; a rental that breaks one is a data-integrity error
//! and fails the whole extraction.

use std::collections::HashMap;

use crate::classifier::TimeOfDay;
use crate::error::{Hop, ReportError, Result};
use crate::source::SourceRelations;

use super::record::DetailRecord;

/// Rows of one relation indexed by a key column.
struct Lookup<'a, T> {
    hop: Hop,
    rows: HashMap<i64, Vec<&'a T>>,
}

impl<'a, T> Lookup<'a, T> {
    fn build(hop: Hop, rows: &'a [T], key: impl Fn(&T) -> i64) -> Self {
        let mut index: HashMap<i64, Vec<&'a T>> = HashMap::with_capacity(rows.len());
        for row in rows {
            index.entry(key(row)).or_default().push(row);
        }
        Self { hop, rows: index }
    }

    fn exactly_one(&self, key: i64, rental_id: i64) -> Result<&'a T> {
        match self.rows.get(&key).map(Vec::as_slice).unwrap_or_default() {
            [row] => Ok(*row),
            matches => Err(ReportError::JoinResolution {
                rental_id,
                hop: self.hop,
                matches: matches.len(),
            }),
        }
    }
}

/// Resolve every rental in `relations` into a classified detail record.
///
/// Output order follows `relations.rentals` but callers must not rely on it.
pub fn resolve(relations: &SourceRelations) -> Result<Vec<DetailRecord>> {
    let inventory = Lookup::build(Hop::RentalToInventory, &relations.inventory, |i| i.inventory_id);
    let films = Lookup::build(Hop::InventoryToFilm, &relations.films, |f| f.film_id);
    let film_categories = Lookup::build(Hop::FilmToFilmCategory, &relations.film_categories, |fc| {
        fc.film_id
    });
    let categories = Lookup::build(Hop::FilmCategoryToCategory, &relations.categories, |c| {
        c.category_id
    });

    relations
        .rentals
        .iter()
        .map(|rental| {
            let id = rental.rental_id;
            let item = inventory.exactly_one(rental.inventory_id, id)?;
            let film = films.exactly_one(item.film_id, id)?;
            let link = film_categories.exactly_one(film.film_id, id)?;
            let category = categories.exactly_one(link.category_id, id)?;

            Ok(DetailRecord {
                rental_id: id,
                film_id: film.film_id,
                title: film.title.clone(),
                category: category.name.clone(),
                rating: film.rating.clone(),
                rental_rate: film.rental_rate,
                rental_date: rental.rental_date,
                time_of_day: TimeOfDay::classify(&rental.rental_date),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::source::{CategoryRow, FilmCategoryRow, FilmRow, InventoryRow, RentalRow};
    use crate::window::parse_timestamp;

    fn relations() -> SourceRelations {
        SourceRelations {
            rentals: vec![
                RentalRow {
                    rental_id: 1,
                    inventory_id: 10,
                    rental_date: parse_timestamp("2005-05-30 09:00:00").unwrap(),
                },
                RentalRow {
                    rental_id: 2,
                    inventory_id: 20,
                    rental_date: parse_timestamp("2005-05-30 13:00:00").unwrap(),
                },
            ],
            inventory: vec![
                InventoryRow {
                    inventory_id: 10,
                    film_id: 100,
                },
                InventoryRow {
                    inventory_id: 20,
                    film_id: 200,
                },
            ],
            films: vec![
                FilmRow {
                    film_id: 100,
                    title: "Academy Dinosaur".to_string(),
                    rating: Some("PG".to_string()),
                    rental_rate: Money::from_cents(99),
                },
                FilmRow {
                    film_id: 200,
                    title: "Ace Goldfinger".to_string(),
                    rating: None,
                    rental_rate: Money::from_cents(499),
                },
            ],
            film_categories: vec![
                FilmCategoryRow {
                    film_id: 100,
                    category_id: 6,
                },
                FilmCategoryRow {
                    film_id: 200,
                    category_id: 11,
                },
            ],
            categories: vec![
                CategoryRow {
                    category_id: 6,
                    name: "Documentary".to_string(),
                },
                CategoryRow {
                    category_id: 11,
                    name: "Horror".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_resolve_denormalizes_and_classifies() {
        let records = resolve(&relations()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.rental_id, 1);
        assert_eq!(first.film_id, 100);
        assert_eq!(first.title, "Academy Dinosaur");
        assert_eq!(first.category, "Documentary");
        assert_eq!(first.rating.as_deref(), Some("PG"));
        assert_eq!(first.rental_rate, Money::from_cents(99));
        assert_eq!(first.time_of_day, TimeOfDay::Morning);

        assert_eq!(records[1].category, "Horror");
        assert_eq!(records[1].rating, None);
        assert_eq!(records[1].time_of_day, TimeOfDay::Afternoon);
    }

    #[test]
    fn test_missing_inventory_fails() {
        let mut relations = relations();
        relations.inventory.retain(|i| i.inventory_id != 20);

        let err = resolve(&relations).unwrap_err();
        assert!(matches!(
            err,
            ReportError::JoinResolution {
                rental_id: 2,
                hop: Hop::RentalToInventory,
                matches: 0
            }
        ));
    }

    #[test]
    fn test_film_in_two_categories_fails() {
        let mut relations = relations();
        relations.film_categories.push(FilmCategoryRow {
            film_id: 100,
            category_id: 11,
        });

        let err = resolve(&relations).unwrap_err();
        assert!(matches!(
            err,
            ReportError::JoinResolution {
                rental_id: 1,
                hop: Hop::FilmToFilmCategory,
                matches: 2
            }
        ));
    }

    #[test]
    fn test_missing_category_fails() {
        let mut relations = relations();
        relations.categories.clear();

        let err = resolve(&relations).unwrap_err();
        assert!(matches!(
            err,
            ReportError::JoinResolution {
                hop: Hop::FilmCategoryToCategory,
                ..
            }
        ));
    }

    #[test]
    fn test_no_rentals_resolves_to_nothing() {
        let mut relations = relations();
        relations.rentals.clear();
        relations.films.clear();

        assert!(resolve(&relations).unwrap().is_empty());
    }
}
