//! Join rows between primary entities.
//!
//! All of these are re-derivable facts, so writes are insert-many with
//! conflicts ignored; the composite primary keys absorb duplicates. Each
//! method returns the number of rows that were actually new.

use super::Catalog;
use crate::models::{
    AnimeCharacterLink, AnimeGenreLink, AnimeProducerLink, AnimeRelationLink, AnimeStaffLink,
    MangaCharacterLink, VoiceActorLink,
};
use anyhow::{Context, Result};
use rusqlite::{params, Statement};

impl Catalog {
    /// Run one prepared `INSERT OR IGNORE` per item inside a transaction
    fn insert_ignoring<T>(
        &self,
        sql: &str,
        items: &[T],
        bind: impl Fn(&mut Statement<'_>, &T) -> rusqlite::Result<usize>,
    ) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut written = 0;
            {
                let mut stmt = tx.prepare(sql)?;
                for item in items {
                    written += bind(&mut stmt, item).with_context(|| format!("Insert failed: {sql}"))?;
                }
            }
            tx.commit()?;
            Ok(written)
        })
    }

    pub fn insert_anime_genres(&self, links: &[AnimeGenreLink]) -> Result<usize> {
        self.insert_ignoring(
            "INSERT OR IGNORE INTO anime_genres (anime_id, genre_id, role) VALUES (?1, ?2, ?3)",
            links,
            |stmt, l| stmt.execute(params![l.anime_id, l.genre_id, l.role.as_str()]),
        )
    }

    pub fn insert_anime_producers(&self, links: &[AnimeProducerLink]) -> Result<usize> {
        self.insert_ignoring(
            "INSERT OR IGNORE INTO anime_producers (anime_id, producer_id, role) VALUES (?1, ?2, ?3)",
            links,
            |stmt, l| stmt.execute(params![l.anime_id, l.producer_id, l.role.as_str()]),
        )
    }

    pub fn insert_anime_relations(&self, links: &[AnimeRelationLink]) -> Result<usize> {
        self.insert_ignoring(
            "INSERT OR IGNORE INTO anime_relations (anime_id, related_id, related_type, relation)
             VALUES (?1, ?2, ?3, ?4)",
            links,
            |stmt, l| {
                stmt.execute(params![l.anime_id, l.related_id, l.related_type, l.relation])
            },
        )
    }

    pub fn insert_anime_characters(&self, links: &[AnimeCharacterLink]) -> Result<usize> {
        self.insert_ignoring(
            "INSERT OR IGNORE INTO anime_characters (anime_id, character_id, role) VALUES (?1, ?2, ?3)",
            links,
            |stmt, l| stmt.execute(params![l.anime_id, l.character_id, l.role]),
        )
    }

    pub fn insert_anime_voice_actors(&self, links: &[VoiceActorLink]) -> Result<usize> {
        self.insert_ignoring(
            "INSERT OR IGNORE INTO anime_voice_actors (anime_id, character_id, person_id, language)
             VALUES (?1, ?2, ?3, ?4)",
            links,
            |stmt, l| {
                stmt.execute(params![l.anime_id, l.character_id, l.person_id, l.language])
            },
        )
    }

    pub fn insert_anime_staff(&self, links: &[AnimeStaffLink]) -> Result<usize> {
        self.insert_ignoring(
            "INSERT OR IGNORE INTO anime_staff (anime_id, person_id, position) VALUES (?1, ?2, ?3)",
            links,
            |stmt, l| stmt.execute(params![l.anime_id, l.person_id, l.position]),
        )
    }

    pub fn insert_manga_characters(&self, links: &[MangaCharacterLink]) -> Result<usize> {
        self.insert_ignoring(
            "INSERT OR IGNORE INTO manga_characters (manga_id, character_id, role) VALUES (?1, ?2, ?3)",
            links,
            |stmt, l| stmt.execute(params![l.manga_id, l.character_id, l.role]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;
    use crate::models::{GenreRole, ProducerRole};

    #[test]
    fn test_duplicate_links_are_ignored() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        catalog.insert_anime(&fixtures::anime(1, "Bebop"))?;

        let genres = vec![
            AnimeGenreLink { anime_id: 1, genre_id: 1, role: GenreRole::Genre },
            AnimeGenreLink { anime_id: 1, genre_id: 24, role: GenreRole::Genre },
        ];
        assert_eq!(catalog.insert_anime_genres(&genres)?, 2);
        assert_eq!(catalog.insert_anime_genres(&genres)?, 0);

        let studios = vec![AnimeProducerLink {
            anime_id: 1,
            producer_id: 14,
            role: ProducerRole::Studio,
        }];
        assert_eq!(catalog.insert_anime_producers(&studios)?, 1);
        assert_eq!(catalog.count_rows("anime_genres")?, 2);
        Ok(())
    }

    #[test]
    fn test_same_person_multiple_positions() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        catalog.insert_anime(&fixtures::anime(1, "Bebop"))?;

        let staff = vec![
            AnimeStaffLink { anime_id: 1, person_id: 7, position: "Director".to_string() },
            AnimeStaffLink { anime_id: 1, person_id: 7, position: "Storyboard".to_string() },
        ];
        assert_eq!(catalog.insert_anime_staff(&staff)?, 2);
        Ok(())
    }

    #[test]
    fn test_manga_characters_need_manga() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let links = vec![MangaCharacterLink { manga_id: 2, character_id: 1, role: None }];
        assert!(catalog.insert_manga_characters(&links).is_err());

        catalog.insert_manga(&fixtures::manga(2, "Berserk"))?;
        assert_eq!(catalog.insert_manga_characters(&links)?, 1);
        Ok(())
    }

    #[test]
    fn test_empty_batch_is_noop() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        assert_eq!(catalog.insert_anime_relations(&[])?, 0);
        Ok(())
    }
}
