use rusqlite::Connection;
use std::path::Path;

use super::{matching_entries, parse_pattern, Catalog, CatalogEntry};
use crate::error::StoreError;

/// Catalog backed by a SQLite `songs` table.
///
/// Signatures are read back and matched in Rust; the pattern never becomes
/// part of the SQL text.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        log::info!("Opened catalog database {}", path.display());
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    #[cfg(test)]
    pub fn create_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS songs (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                melody_signature_str TEXT NOT NULL,
                audio_url TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub fn insert(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO songs (id, title, melody_signature_str, audio_url) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![entry.id, entry.title, entry.signature, entry.audio_url],
        )?;
        Ok(())
    }

    /// Every row with all columns present; rows holding a NULL are skipped.
    fn all_entries(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, melody_signature_str, audio_url FROM songs")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            match row? {
                (id, Some(title), Some(signature), Some(audio_url)) => entries.push(CatalogEntry {
                    id,
                    title,
                    audio_url,
                    signature,
                }),
                (id, ..) => log::warn!("Skipping catalog row {}: NULL column", id),
            }
        }
        Ok(entries)
    }
}

impl Catalog for SqliteCatalog {
    fn find_by_signature_substring(&self, pattern: &str) -> Result<Vec<CatalogEntry>, StoreError> {
        let pattern = parse_pattern(pattern)?;
        let entries = self.all_entries()?;
        log::debug!("Scanning {} catalog rows for {:?}", entries.len(), pattern);
        Ok(matching_entries(&pattern, entries))
    }
}
