//! Reference data: producers, magazines and genres.
//!
//! These tables are written with true upserts. The upsert itself does not
//! report which branch fired, so callers check existence first when they
//! need to tell inserts from updates.

use super::{from_json, to_json, Catalog};
use crate::models::{GenreKind, GenreRow, MagazineRow, ProducerRow};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

const UPSERT_PRODUCER: &str = "INSERT INTO producers (
        mal_id, url, image_url, name, titles, established, favorites, count, about, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(mal_id) DO UPDATE SET
        url = excluded.url,
        image_url = excluded.image_url,
        name = excluded.name,
        titles = excluded.titles,
        established = excluded.established,
        favorites = excluded.favorites,
        count = excluded.count,
        about = excluded.about,
        updated_at = excluded.updated_at";

const UPSERT_MAGAZINE: &str = "INSERT INTO magazines (mal_id, name, url, count, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(mal_id) DO UPDATE SET
        name = excluded.name,
        url = excluded.url,
        count = excluded.count,
        updated_at = excluded.updated_at";

const UPSERT_GENRE: &str = "INSERT INTO genres (mal_id, kind, name, url, count, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(mal_id, kind) DO UPDATE SET
        name = excluded.name,
        url = excluded.url,
        count = excluded.count,
        updated_at = excluded.updated_at";

fn upsert_producer_with(conn: &Connection, producer: &ProducerRow) -> Result<()> {
    conn.execute(
        UPSERT_PRODUCER,
        params![
            producer.mal_id,
            producer.url,
            producer.image_url,
            producer.name,
            to_json(&producer.titles)?,
            producer.established,
            producer.favorites,
            producer.count,
            producer.about,
            producer.updated_at,
        ],
    )
    .with_context(|| format!("Failed to upsert producer {}", producer.mal_id))?;
    Ok(())
}

fn upsert_magazine_with(conn: &Connection, magazine: &MagazineRow) -> Result<()> {
    conn.execute(
        UPSERT_MAGAZINE,
        params![
            magazine.mal_id,
            magazine.name,
            magazine.url,
            magazine.count,
            magazine.updated_at,
        ],
    )
    .with_context(|| format!("Failed to upsert magazine {}", magazine.mal_id))?;
    Ok(())
}

fn upsert_genre_with(conn: &Connection, genre: &GenreRow) -> Result<()> {
    conn.execute(
        UPSERT_GENRE,
        params![
            genre.mal_id,
            genre.kind.as_str(),
            genre.name,
            genre.url,
            genre.count,
            genre.updated_at,
        ],
    )
    .with_context(|| format!("Failed to upsert {} genre {}", genre.kind, genre.mal_id))?;
    Ok(())
}

impl Catalog {
    pub fn find_producer(&self, mal_id: u32) -> Result<Option<ProducerRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT mal_id, url, image_url, name, titles, established, favorites,
                        count, about, updated_at
                 FROM producers WHERE mal_id = ?1",
                params![mal_id],
                |row| {
                    Ok(ProducerRow {
                        mal_id: row.get(0)?,
                        url: row.get(1)?,
                        image_url: row.get(2)?,
                        name: row.get(3)?,
                        titles: from_json(row.get(4)?),
                        established: row.get(5)?,
                        favorites: row.get(6)?,
                        count: row.get(7)?,
                        about: row.get(8)?,
                        updated_at: row.get(9)?,
                    })
                },
            )
            .optional()
            .context("Failed to query producer")
        })
    }

    pub fn producer_exists(&self, mal_id: u32) -> Result<bool> {
        self.exists("SELECT 1 FROM producers WHERE mal_id = ?1", params![mal_id])
    }

    pub fn upsert_producer(&self, producer: &ProducerRow) -> Result<()> {
        self.with_conn(|conn| upsert_producer_with(conn, producer))
    }

    /// Upsert a batch in one transaction
    pub fn upsert_producers(&self, producers: &[ProducerRow]) -> Result<usize> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for producer in producers {
                upsert_producer_with(&tx, producer)?;
            }
            tx.commit().context("Failed to commit producer batch")?;
            Ok(producers.len())
        })
    }

    pub fn find_magazine(&self, mal_id: u32) -> Result<Option<MagazineRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT mal_id, name, url, count, updated_at FROM magazines WHERE mal_id = ?1",
                params![mal_id],
                |row| {
                    Ok(MagazineRow {
                        mal_id: row.get(0)?,
                        name: row.get(1)?,
                        url: row.get(2)?,
                        count: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()
            .context("Failed to query magazine")
        })
    }

    pub fn magazine_exists(&self, mal_id: u32) -> Result<bool> {
        self.exists("SELECT 1 FROM magazines WHERE mal_id = ?1", params![mal_id])
    }

    pub fn upsert_magazine(&self, magazine: &MagazineRow) -> Result<()> {
        self.with_conn(|conn| upsert_magazine_with(conn, magazine))
    }

    pub fn upsert_magazines(&self, magazines: &[MagazineRow]) -> Result<usize> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for magazine in magazines {
                upsert_magazine_with(&tx, magazine)?;
            }
            tx.commit().context("Failed to commit magazine batch")?;
            Ok(magazines.len())
        })
    }

    pub fn find_genre(&self, mal_id: u32, kind: GenreKind) -> Result<Option<GenreRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT mal_id, name, url, count, updated_at
                 FROM genres WHERE mal_id = ?1 AND kind = ?2",
                params![mal_id, kind.as_str()],
                |row| {
                    Ok(GenreRow {
                        mal_id: row.get(0)?,
                        kind,
                        name: row.get(1)?,
                        url: row.get(2)?,
                        count: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()
            .context("Failed to query genre")
        })
    }

    pub fn genre_exists(&self, mal_id: u32, kind: GenreKind) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM genres WHERE mal_id = ?1 AND kind = ?2",
            params![mal_id, kind.as_str()],
        )
    }

    pub fn upsert_genre(&self, genre: &GenreRow) -> Result<()> {
        self.with_conn(|conn| upsert_genre_with(conn, genre))
    }

    pub fn upsert_genres(&self, genres: &[GenreRow]) -> Result<usize> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for genre in genres {
                upsert_genre_with(&tx, genre)?;
            }
            tx.commit().context("Failed to commit genre batch")?;
            Ok(genres.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn genre(mal_id: u32, kind: GenreKind, name: &str) -> GenreRow {
        GenreRow {
            mal_id,
            kind,
            name: name.to_string(),
            url: None,
            count: Some(1),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_genre_upsert_is_keyed_by_kind() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        catalog.upsert_genre(&genre(1, GenreKind::Anime, "Action"))?;
        catalog.upsert_genre(&genre(1, GenreKind::Manga, "Action"))?;
        catalog.upsert_genre(&genre(1, GenreKind::Anime, "Action!"))?;

        assert_eq!(catalog.count_rows("genres")?, 2);
        let stored = catalog.find_genre(1, GenreKind::Anime)?.expect("row exists");
        assert_eq!(stored.name, "Action!");
        assert!(catalog.genre_exists(1, GenreKind::Manga)?);
        Ok(())
    }

    #[test]
    fn test_producer_batch_upsert() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let producer = |mal_id: u32, name: &str| ProducerRow {
            mal_id,
            url: None,
            image_url: None,
            name: name.to_string(),
            titles: vec![("Default".to_string(), name.to_string())],
            established: None,
            favorites: None,
            count: None,
            about: None,
            updated_at: Utc::now(),
        };

        catalog.upsert_producers(&[producer(1, "Sunrise"), producer(2, "Bones")])?;
        catalog.upsert_producers(&[producer(2, "BONES")])?;

        assert_eq!(catalog.count_rows("producers")?, 2);
        let stored = catalog.find_producer(2)?.expect("row exists");
        assert_eq!(stored.name, "BONES");
        assert_eq!(stored.titles[0].0, "Default");
        Ok(())
    }

    #[test]
    fn test_magazine_upsert() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let mut magazine = MagazineRow {
            mal_id: 83,
            name: "Big Comic Original".to_string(),
            url: None,
            count: Some(10),
            updated_at: Utc::now(),
        };
        catalog.upsert_magazine(&magazine)?;
        magazine.count = Some(12);
        catalog.upsert_magazine(&magazine)?;

        assert_eq!(catalog.find_magazine(83)?.and_then(|m| m.count), Some(12));
        Ok(())
    }

    #[test]
    fn test_magazine_batch_upsert() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let magazine = |mal_id: u32, name: &str| MagazineRow {
            mal_id,
            name: name.to_string(),
            url: None,
            count: None,
            updated_at: Utc::now(),
        };

        let written = catalog.upsert_magazines(&[magazine(1, "Big Comic"), magazine(2, "Afternoon")])?;
        assert_eq!(written, 2);
        catalog.upsert_magazines(&[magazine(1, "Big Comic Spirits")])?;

        assert_eq!(catalog.count_rows("magazines")?, 2);
        assert_eq!(
            catalog.find_magazine(1)?.map(|m| m.name),
            Some("Big Comic Spirits".to_string())
        );
        assert_eq!(catalog.upsert_magazines(&[])?, 0);
        Ok(())
    }

    #[test]
    fn test_genre_batch_upsert() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let written = catalog.upsert_genres(&[
            genre(1, GenreKind::Anime, "Action"),
            genre(2, GenreKind::Anime, "Adventure"),
            genre(1, GenreKind::Manga, "Action"),
        ])?;
        assert_eq!(written, 3);

        catalog.upsert_genres(&[genre(2, GenreKind::Anime, "Adventure!")])?;
        assert_eq!(catalog.count_rows("genres")?, 3);
        assert_eq!(
            catalog.find_genre(2, GenreKind::Anime)?.map(|g| g.name),
            Some("Adventure!".to_string())
        );
        assert!(catalog.find_genre(2, GenreKind::Manga)?.is_none());
        Ok(())
    }
}
