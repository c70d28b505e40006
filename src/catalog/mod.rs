//! Song catalogs searchable by melody signature.

pub mod json;
pub mod sqlite;

pub use json::JsonCatalog;
pub use sqlite::SqliteCatalog;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::StoreError;
use crate::melody::Fingerprint;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub title: String,
    pub audio_url: String,
    /// Stored fingerprint string, e.g. `"1,2,-0.5"`.
    #[serde(alias = "melody_signature_str")]
    pub signature: String,
}

pub trait Catalog {
    /// Every entry whose signature contains `pattern` as a contiguous run of
    /// comma-separated steps, in the store's own order.
    fn find_by_signature_substring(&self, pattern: &str) -> Result<Vec<CatalogEntry>, StoreError>;
}

/// Open a catalog file, choosing the backend from its extension.
pub fn open(path: &Path) -> Result<Box<dyn Catalog>, StoreError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(Box::new(JsonCatalog::load(path)?)),
        "db" | "sqlite" | "sqlite3" => Ok(Box::new(SqliteCatalog::open(path)?)),
        _ => Err(StoreError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Split a query pattern into its comma tokens after checking it decodes as
/// a fingerprint.
pub(crate) fn parse_pattern(pattern: &str) -> Result<Vec<&str>, StoreError> {
    pattern
        .parse::<Fingerprint>()
        .map_err(|e| StoreError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: format!("{}", e),
        })?;
    Ok(pattern.split(',').collect())
}

/// Whether `signature` holds `pattern` as a contiguous run of comma tokens.
///
/// Tokens compare byte for byte: `"2.0"` is not `"2"` and `"12"` is not `"2"`.
pub(crate) fn signature_contains(signature: &str, pattern: &[&str]) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let tokens: Vec<&str> = signature.split(',').collect();
    tokens.windows(pattern.len()).any(|window| window == pattern)
}

/// Keep the entries whose signature contains `pattern`, in input order.
pub(crate) fn matching_entries<I>(pattern: &[&str], entries: I) -> Vec<CatalogEntry>
where
    I: IntoIterator<Item = CatalogEntry>,
{
    entries
        .into_iter()
        .filter(|entry| signature_contains(&entry.signature, pattern))
        .collect()
}
