use super::{from_json, to_json, Catalog};
use crate::models::MangaRow;
use anyhow::{bail, Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

const MANGA_COLUMNS: &str = "mal_id, url, image_url, title, title_english, title_japanese,
    title_synonyms, type, chapters, volumes, status, publishing, published_from,
    published_to, score, scored_by, rank, popularity, members, favorites, synopsis,
    background, fetched_at, updated_at";

fn row_to_manga(row: &Row<'_>) -> rusqlite::Result<MangaRow> {
    Ok(MangaRow {
        mal_id: row.get(0)?,
        url: row.get(1)?,
        image_url: row.get(2)?,
        title: row.get(3)?,
        title_english: row.get(4)?,
        title_japanese: row.get(5)?,
        title_synonyms: from_json(row.get(6)?),
        manga_type: row.get(7)?,
        chapters: row.get(8)?,
        volumes: row.get(9)?,
        status: row.get(10)?,
        publishing: row.get(11)?,
        published_from: row.get(12)?,
        published_to: row.get(13)?,
        score: row.get(14)?,
        scored_by: row.get(15)?,
        rank: row.get(16)?,
        popularity: row.get(17)?,
        members: row.get(18)?,
        favorites: row.get(19)?,
        synopsis: row.get(20)?,
        background: row.get(21)?,
        fetched_at: row.get(22)?,
        updated_at: row.get(23)?,
    })
}

impl Catalog {
    pub fn find_manga(&self, mal_id: u32) -> Result<Option<MangaRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {MANGA_COLUMNS} FROM manga WHERE mal_id = ?1"),
                params![mal_id],
                row_to_manga,
            )
            .optional()
            .context("Failed to query manga")
        })
    }

    pub fn manga_exists(&self, mal_id: u32) -> Result<bool> {
        self.exists("SELECT 1 FROM manga WHERE mal_id = ?1", params![mal_id])
    }

    pub fn insert_manga(&self, manga: &MangaRow) -> Result<()> {
        let synonyms = to_json(&manga.title_synonyms)?;
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO manga ({MANGA_COLUMNS}) VALUES (
                        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                        ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
                    )"
                ),
                params![
                    manga.mal_id,
                    manga.url,
                    manga.image_url,
                    manga.title,
                    manga.title_english,
                    manga.title_japanese,
                    synonyms,
                    manga.manga_type,
                    manga.chapters,
                    manga.volumes,
                    manga.status,
                    manga.publishing,
                    manga.published_from,
                    manga.published_to,
                    manga.score,
                    manga.scored_by,
                    manga.rank,
                    manga.popularity,
                    manga.members,
                    manga.favorites,
                    manga.synopsis,
                    manga.background,
                    manga.fetched_at,
                    manga.updated_at,
                ],
            )
            .with_context(|| format!("Failed to insert manga {}", manga.mal_id))?;

            debug!(mal_id = manga.mal_id, title = %manga.title, "Inserted manga");
            Ok(())
        })
    }

    pub fn update_manga(&self, manga: &MangaRow) -> Result<()> {
        let synonyms = to_json(&manga.title_synonyms)?;
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE manga SET
                        url = ?2, image_url = ?3, title = ?4, title_english = ?5,
                        title_japanese = ?6, title_synonyms = ?7, type = ?8, chapters = ?9,
                        volumes = ?10, status = ?11, publishing = ?12, published_from = ?13,
                        published_to = ?14, score = ?15, scored_by = ?16, rank = ?17,
                        popularity = ?18, members = ?19, favorites = ?20, synopsis = ?21,
                        background = ?22, updated_at = ?23
                     WHERE mal_id = ?1",
                    params![
                        manga.mal_id,
                        manga.url,
                        manga.image_url,
                        manga.title,
                        manga.title_english,
                        manga.title_japanese,
                        synonyms,
                        manga.manga_type,
                        manga.chapters,
                        manga.volumes,
                        manga.status,
                        manga.publishing,
                        manga.published_from,
                        manga.published_to,
                        manga.score,
                        manga.scored_by,
                        manga.rank,
                        manga.popularity,
                        manga.members,
                        manga.favorites,
                        manga.synopsis,
                        manga.background,
                        manga.updated_at,
                    ],
                )
                .with_context(|| format!("Failed to update manga {}", manga.mal_id))?;

            if changed == 0 {
                bail!("Manga {} does not exist", manga.mal_id);
            }
            debug!(mal_id = manga.mal_id, "Updated manga");
            Ok(())
        })
    }

    pub fn manga_ids(&self) -> Result<Vec<u32>> {
        self.ids("SELECT mal_id FROM manga ORDER BY mal_id")
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[test]
    fn test_insert_update_round_trip() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        catalog.insert_manga(&fixtures::manga(2, "Berserk"))?;

        let mut changed = fixtures::manga(2, "Berserk");
        changed.chapters = Some(374);
        catalog.update_manga(&changed)?;

        let stored = catalog.find_manga(2)?.expect("row exists");
        assert_eq!(stored.chapters, Some(374));
        assert!(catalog.manga_exists(2)?);
        assert_eq!(catalog.manga_ids()?, vec![2]);
        Ok(())
    }
}
