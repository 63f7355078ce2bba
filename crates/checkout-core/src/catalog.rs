//! Course Catalog
//!
//! Immutable price table, built once at startup and shared behind an `Arc`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};
use crate::model::CourseId;

/// Price and display name for one course
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(rename = "id")]
    pub course_id: CourseId,
    pub price_in_cents: u32,
    pub name: String,
}

impl CatalogEntry {
    pub fn new(
        course_id: impl Into<CourseId>,
        price_in_cents: u32,
        name: impl Into<String>,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            price_in_cents,
            name: name.into(),
        }
    }
}

/// Lookup table from course id to catalog entry
#[derive(Clone, Debug, Default)]
pub struct CatalogPriceTable {
    entries: HashMap<CourseId, CatalogEntry>,
}

impl CatalogPriceTable {
    /// Build a table, rejecting duplicate course ids
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self> {
        let mut map = HashMap::new();
        for entry in entries {
            let id = entry.course_id;
            if map.insert(id, entry).is_some() {
                return Err(CheckoutError::Config(format!(
                    "duplicate catalog entry for course {id}"
                )));
            }
        }
        Ok(Self { entries: map })
    }

    /// The courses sold out of the box
    pub fn builtin() -> Self {
        let entries = [
            CatalogEntry::new(1, 0, "Mastering Algebra Fundamentals"),
            CatalogEntry::new(2, 2000, "Introduction to Creative Writing"),
            CatalogEntry::new(3, 2000, "Exploring Physics for Beginners"),
            CatalogEntry::new(4, 3000, "SAT Prep: Math and Reading"),
            CatalogEntry::new(5, 4000, "Introduction to Public Speaking"),
        ];
        Self {
            entries: entries.into_iter().map(|e| (e.course_id, e)).collect(),
        }
    }

    /// Parse a JSON array of `{ "id", "priceInCents", "name" }`
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// Load a catalog file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CheckoutError::Config(format!("cannot read catalog {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn get(&self, course_id: CourseId) -> Option<&CatalogEntry> {
        self.entries.get(&course_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries ordered by course id
    pub fn entries(&self) -> Vec<&CatalogEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|e| e.course_id);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prices() {
        let catalog = CatalogPriceTable::builtin();
        assert_eq!(catalog.len(), 5);

        let writing = catalog.get(CourseId(2)).unwrap();
        assert_eq!(writing.price_in_cents, 2000);
        assert_eq!(writing.name, "Introduction to Creative Writing");

        assert_eq!(catalog.get(CourseId(1)).unwrap().price_in_cents, 0);
        assert!(catalog.get(CourseId(99)).is_none());
    }

    #[test]
    fn test_from_json() {
        let catalog = CatalogPriceTable::from_json(
            r#"[
                {"id": 10, "priceInCents": 1500, "name": "Intro to Chemistry"},
                {"id": 11, "priceInCents": 2500, "name": "Organic Chemistry"}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let ids: Vec<_> = catalog.entries().iter().map(|e| e.course_id.0).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = CatalogPriceTable::new([
            CatalogEntry::new(1, 100, "A"),
            CatalogEntry::new(1, 200, "B"),
        ]);
        assert!(matches!(result, Err(CheckoutError::Config(_))));
    }

    #[test]
    fn test_negative_price_rejected() {
        let result =
            CatalogPriceTable::from_json(r#"[{"id": 1, "priceInCents": -5, "name": "A"}]"#);
        assert!(matches!(result, Err(CheckoutError::Json(_))));
    }
}
