use super::{from_json, to_json, Catalog};
use crate::models::AnimeRow;
use anyhow::{bail, Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

const ANIME_COLUMNS: &str = "mal_id, url, image_url, title, title_english, title_japanese,
    title_synonyms, type, source, episodes, status, airing, aired_from, aired_to,
    duration, rating, season, year, score, scored_by, rank, popularity, members,
    favorites, synopsis, background, fetched_at, updated_at";

fn row_to_anime(row: &Row<'_>) -> rusqlite::Result<AnimeRow> {
    Ok(AnimeRow {
        mal_id: row.get(0)?,
        url: row.get(1)?,
        image_url: row.get(2)?,
        title: row.get(3)?,
        title_english: row.get(4)?,
        title_japanese: row.get(5)?,
        title_synonyms: from_json(row.get(6)?),
        anime_type: row.get(7)?,
        source: row.get(8)?,
        episodes: row.get(9)?,
        status: row.get(10)?,
        airing: row.get(11)?,
        aired_from: row.get(12)?,
        aired_to: row.get(13)?,
        duration: row.get(14)?,
        rating: row.get(15)?,
        season: row.get(16)?,
        year: row.get(17)?,
        score: row.get(18)?,
        scored_by: row.get(19)?,
        rank: row.get(20)?,
        popularity: row.get(21)?,
        members: row.get(22)?,
        favorites: row.get(23)?,
        synopsis: row.get(24)?,
        background: row.get(25)?,
        fetched_at: row.get(26)?,
        updated_at: row.get(27)?,
    })
}

impl Catalog {
    /// Look up an anime by upstream id
    pub fn find_anime(&self, mal_id: u32) -> Result<Option<AnimeRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ANIME_COLUMNS} FROM anime WHERE mal_id = ?1"),
                params![mal_id],
                row_to_anime,
            )
            .optional()
            .context("Failed to query anime")
        })
    }

    /// Cheap existence check, used by the relationship fetchers
    pub fn anime_exists(&self, mal_id: u32) -> Result<bool> {
        self.exists("SELECT 1 FROM anime WHERE mal_id = ?1", params![mal_id])
    }

    /// Insert a new anime row; fails on a duplicate id
    pub fn insert_anime(&self, anime: &AnimeRow) -> Result<()> {
        let synonyms = to_json(&anime.title_synonyms)?;
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO anime ({ANIME_COLUMNS}) VALUES (
                        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                        ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28
                    )"
                ),
                params![
                    anime.mal_id,
                    anime.url,
                    anime.image_url,
                    anime.title,
                    anime.title_english,
                    anime.title_japanese,
                    synonyms,
                    anime.anime_type,
                    anime.source,
                    anime.episodes,
                    anime.status,
                    anime.airing,
                    anime.aired_from,
                    anime.aired_to,
                    anime.duration,
                    anime.rating,
                    anime.season,
                    anime.year,
                    anime.score,
                    anime.scored_by,
                    anime.rank,
                    anime.popularity,
                    anime.members,
                    anime.favorites,
                    anime.synopsis,
                    anime.background,
                    anime.fetched_at,
                    anime.updated_at,
                ],
            )
            .with_context(|| format!("Failed to insert anime {}", anime.mal_id))?;

            debug!(mal_id = anime.mal_id, title = %anime.title, "Inserted anime");
            Ok(())
        })
    }

    /// Overwrite an existing anime row, keeping its original `fetched_at`
    pub fn update_anime(&self, anime: &AnimeRow) -> Result<()> {
        let synonyms = to_json(&anime.title_synonyms)?;
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE anime SET
                        url = ?2, image_url = ?3, title = ?4, title_english = ?5,
                        title_japanese = ?6, title_synonyms = ?7, type = ?8, source = ?9,
                        episodes = ?10, status = ?11, airing = ?12, aired_from = ?13,
                        aired_to = ?14, duration = ?15, rating = ?16, season = ?17,
                        year = ?18, score = ?19, scored_by = ?20, rank = ?21,
                        popularity = ?22, members = ?23, favorites = ?24, synopsis = ?25,
                        background = ?26, updated_at = ?27
                     WHERE mal_id = ?1",
                    params![
                        anime.mal_id,
                        anime.url,
                        anime.image_url,
                        anime.title,
                        anime.title_english,
                        anime.title_japanese,
                        synonyms,
                        anime.anime_type,
                        anime.source,
                        anime.episodes,
                        anime.status,
                        anime.airing,
                        anime.aired_from,
                        anime.aired_to,
                        anime.duration,
                        anime.rating,
                        anime.season,
                        anime.year,
                        anime.score,
                        anime.scored_by,
                        anime.rank,
                        anime.popularity,
                        anime.members,
                        anime.favorites,
                        anime.synopsis,
                        anime.background,
                        anime.updated_at,
                    ],
                )
                .with_context(|| format!("Failed to update anime {}", anime.mal_id))?;

            if changed == 0 {
                bail!("Anime {} does not exist", anime.mal_id);
            }
            debug!(mal_id = anime.mal_id, title = %anime.title, "Updated anime");
            Ok(())
        })
    }

    /// Every stored anime id, ascending
    pub fn anime_ids(&self) -> Result<Vec<u32>> {
        self.ids("SELECT mal_id FROM anime ORDER BY mal_id")
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[test]
    fn test_insert_and_find() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let anime = fixtures::anime(1, "Cowboy Bebop");

        assert!(catalog.find_anime(1)?.is_none());
        catalog.insert_anime(&anime)?;

        assert_eq!(catalog.find_anime(1)?, Some(anime));
        assert!(catalog.anime_exists(1)?);
        Ok(())
    }

    #[test]
    fn test_duplicate_insert_fails() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let anime = fixtures::anime(1, "Cowboy Bebop");
        catalog.insert_anime(&anime)?;
        assert!(catalog.insert_anime(&anime).is_err());
        assert_eq!(catalog.count_rows("anime")?, 1);
        Ok(())
    }

    #[test]
    fn test_update_keeps_fetched_at() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let original = fixtures::anime(5, "Old title");
        catalog.insert_anime(&original)?;

        let mut changed = fixtures::anime(5, "New title");
        changed.fetched_at = original.fetched_at + chrono::Duration::days(3);
        changed.updated_at = changed.fetched_at;
        catalog.update_anime(&changed)?;

        let stored = catalog.find_anime(5)?.expect("row exists");
        assert_eq!(stored.title, "New title");
        assert_eq!(stored.fetched_at, original.fetched_at);
        assert_eq!(stored.updated_at, changed.updated_at);
        Ok(())
    }

    #[test]
    fn test_update_missing_row_fails() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        assert!(catalog.update_anime(&fixtures::anime(9, "Ghost")).is_err());
        Ok(())
    }

    #[test]
    fn test_anime_ids_sorted() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        for id in [30, 2, 17] {
            catalog.insert_anime(&fixtures::anime(id, "x"))?;
        }
        assert_eq!(catalog.anime_ids()?, vec![2, 17, 30]);
        Ok(())
    }
}
