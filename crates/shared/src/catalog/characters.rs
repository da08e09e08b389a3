use super::{from_json, to_json, Catalog};
use crate::models::CharacterRow;
use anyhow::{bail, Context, Result};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

impl Catalog {
    pub fn find_character(&self, mal_id: u32) -> Result<Option<CharacterRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT mal_id, url, image_url, name, name_kanji, nicknames, favorites,
                        about, fetched_at, updated_at
                 FROM characters WHERE mal_id = ?1",
                params![mal_id],
                |row| {
                    Ok(CharacterRow {
                        mal_id: row.get(0)?,
                        url: row.get(1)?,
                        image_url: row.get(2)?,
                        name: row.get(3)?,
                        name_kanji: row.get(4)?,
                        nicknames: from_json(row.get(5)?),
                        favorites: row.get(6)?,
                        about: row.get(7)?,
                        fetched_at: row.get(8)?,
                        updated_at: row.get(9)?,
                    })
                },
            )
            .optional()
            .context("Failed to query character")
        })
    }

    pub fn insert_character(&self, character: &CharacterRow) -> Result<()> {
        let nicknames = to_json(&character.nicknames)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO characters (
                    mal_id, url, image_url, name, name_kanji, nicknames, favorites,
                    about, fetched_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    character.mal_id,
                    character.url,
                    character.image_url,
                    character.name,
                    character.name_kanji,
                    nicknames,
                    character.favorites,
                    character.about,
                    character.fetched_at,
                    character.updated_at,
                ],
            )
            .with_context(|| format!("Failed to insert character {}", character.mal_id))?;

            debug!(mal_id = character.mal_id, name = %character.name, "Inserted character");
            Ok(())
        })
    }

    pub fn update_character(&self, character: &CharacterRow) -> Result<()> {
        let nicknames = to_json(&character.nicknames)?;
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE characters SET
                        url = ?2, image_url = ?3, name = ?4, name_kanji = ?5,
                        nicknames = ?6, favorites = ?7, about = ?8, updated_at = ?9
                     WHERE mal_id = ?1",
                    params![
                        character.mal_id,
                        character.url,
                        character.image_url,
                        character.name,
                        character.name_kanji,
                        nicknames,
                        character.favorites,
                        character.about,
                        character.updated_at,
                    ],
                )
                .with_context(|| format!("Failed to update character {}", character.mal_id))?;

            if changed == 0 {
                bail!("Character {} does not exist", character.mal_id);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_character_round_trip() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let now = Utc::now();
        let mut character = CharacterRow {
            mal_id: 1,
            url: None,
            image_url: None,
            name: "Spike Spiegel".to_string(),
            name_kanji: None,
            nicknames: vec!["Swimming Bird".to_string()],
            favorites: Some(10),
            about: None,
            fetched_at: now,
            updated_at: now,
        };
        catalog.insert_character(&character)?;

        character.favorites = Some(11);
        catalog.update_character(&character)?;

        let stored = catalog.find_character(1)?.expect("row exists");
        assert_eq!(stored.favorites, Some(11));
        assert_eq!(stored.nicknames, vec!["Swimming Bird"]);
        Ok(())
    }
}
