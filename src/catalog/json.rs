use std::path::Path;

use super::{matching_entries, parse_pattern, Catalog, CatalogEntry};
use crate::error::StoreError;

/// Catalog held in memory, loaded from a JSON array of entries.
#[derive(Clone, Debug, Default)]
pub struct JsonCatalog {
    entries: Vec<CatalogEntry>,
}

impl JsonCatalog {
    #[cfg(test)]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        log::info!(
            "Loaded {} catalog entries from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self, StoreError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(content)?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Catalog for JsonCatalog {
    fn find_by_signature_substring(&self, pattern: &str) -> Result<Vec<CatalogEntry>, StoreError> {
        let pattern = parse_pattern(pattern)?;
        Ok(matching_entries(&pattern, self.entries.iter().cloned()))
    }
}
