//! Persistence primitives for the catalog store.
//!
//! `Catalog` is the only way the ingestion pipeline touches the database.
//! Every write is idempotent: primary entities are keyed by their upstream
//! id, reference data is written with `ON CONFLICT DO UPDATE`, and join rows
//! use `INSERT OR IGNORE` against composite primary keys.
//!
//! The connection sits behind a mutex so a `Catalog` can be shared through
//! an `Arc` by the few fetchers that process items concurrently. Each call
//! holds the lock only for the duration of its statements.

mod anime;
mod characters;
mod episodes;
mod manga;
mod people;
mod reference;
mod relations;

use crate::Database;
use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, OptionalExtension, Params};
use std::sync::Mutex;

/// Repository layer over the catalog database
pub struct Catalog {
    db: Mutex<Database>,
}

impl Catalog {
    /// Wrap an opened database
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// In-memory catalog with the full schema, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Run `f` with exclusive access to the connection
    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut db = self
            .db
            .lock()
            .map_err(|_| anyhow!("Catalog database lock poisoned"))?;
        f(db.conn_mut())
    }

    /// True when `sql` (a `SELECT 1 ...` query) yields a row
    fn exists<P: Params>(&self, sql: &str, params: P) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(sql, params, |_| Ok(()))
                .optional()
                .with_context(|| format!("Existence check failed: {sql}"))?;
            Ok(found.is_some())
        })
    }

    /// All ids of a single-column query, in ascending order
    fn ids(&self, sql: &str) -> Result<Vec<u32>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let ids = stmt
                .query_map([], |row| row.get::<_, u32>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .with_context(|| format!("Failed to list ids: {sql}"))?;
            Ok(ids)
        })
    }

    /// Count rows of an arbitrary table, for diagnostics and tests
    pub fn count_rows(&self, table: &str) -> Result<u64> {
        if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(anyhow!("Invalid table name: {table}"));
        }
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }
}

/// Serialize a list column
fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("Failed to serialize list column")
}

/// Deserialize a list column; corrupt text reads back as empty
fn from_json<T: serde::de::DeserializeOwned + Default>(text: String) -> T {
    serde_json::from_str(&text).unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    pub fn anime(mal_id: u32, title: &str) -> AnimeRow {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        AnimeRow {
            mal_id,
            url: Some(format!("https://myanimelist.net/anime/{mal_id}")),
            image_url: None,
            title: title.to_string(),
            title_english: None,
            title_japanese: None,
            title_synonyms: vec!["Alt".to_string()],
            anime_type: Some("TV".to_string()),
            source: None,
            episodes: Some(12),
            status: Some("Finished Airing".to_string()),
            airing: false,
            aired_from: NaiveDate::from_ymd_opt(2020, 4, 1),
            aired_to: None,
            duration: None,
            rating: None,
            season: Some("spring".to_string()),
            year: Some(2020),
            score: Some(8.1),
            scored_by: None,
            rank: None,
            popularity: None,
            members: None,
            favorites: None,
            synopsis: None,
            background: None,
            fetched_at: at,
            updated_at: at,
        }
    }

    pub fn manga(mal_id: u32, title: &str) -> MangaRow {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        MangaRow {
            mal_id,
            url: None,
            image_url: None,
            title: title.to_string(),
            title_english: None,
            title_japanese: None,
            title_synonyms: Vec::new(),
            manga_type: Some("Manga".to_string()),
            chapters: Some(100),
            volumes: Some(10),
            status: None,
            publishing: true,
            published_from: None,
            published_to: None,
            score: None,
            scored_by: None,
            rank: None,
            popularity: None,
            members: None,
            favorites: None,
            synopsis: None,
            background: None,
            fetched_at: at,
            updated_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_rows_rejects_injection() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        assert_eq!(catalog.count_rows("anime")?, 0);
        assert!(catalog.count_rows("anime; DROP TABLE anime").is_err());
        Ok(())
    }

    #[test]
    fn test_list_columns_round_trip() -> Result<()> {
        let text = to_json(&vec!["a".to_string(), "b".to_string()])?;
        let back: Vec<String> = from_json(text);
        assert_eq!(back, vec!["a", "b"]);

        let garbage: Vec<String> = from_json("not json".to_string());
        assert!(garbage.is_empty());
        Ok(())
    }
}
