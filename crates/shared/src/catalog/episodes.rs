use super::Catalog;
use crate::models::EpisodeRow;
use anyhow::{Context, Result};
use rusqlite::params;

impl Catalog {
    /// Insert episodes, ignoring ones already stored. Returns rows written.
    pub fn insert_episodes(&self, episodes: &[EpisodeRow]) -> Result<usize> {
        self.write_episodes(episodes, "INSERT OR IGNORE INTO episodes")
    }

    /// Insert or overwrite episodes. Returns rows written.
    pub fn upsert_episodes(&self, episodes: &[EpisodeRow]) -> Result<usize> {
        self.write_episodes(episodes, "INSERT OR REPLACE INTO episodes")
    }

    fn write_episodes(&self, episodes: &[EpisodeRow], verb: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut written = 0;
            {
                let mut stmt = tx.prepare(&format!(
                    "{verb} (
                        anime_id, mal_id, title, title_japanese, title_romanji, aired,
                        score, filler, recap, forum_url, updated_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ))?;
                for episode in episodes {
                    written += stmt
                        .execute(params![
                            episode.anime_id,
                            episode.mal_id,
                            episode.title,
                            episode.title_japanese,
                            episode.title_romanji,
                            episode.aired,
                            episode.score,
                            episode.filler,
                            episode.recap,
                            episode.forum_url,
                            episode.updated_at,
                        ])
                        .with_context(|| {
                            format!(
                                "Failed to write episode {} of anime {}",
                                episode.mal_id, episode.anime_id
                            )
                        })?;
                }
            }
            tx.commit().context("Failed to commit episodes")?;
            Ok(written)
        })
    }

    pub fn count_episodes(&self, anime_id: u32) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM episodes WHERE anime_id = ?1",
                params![anime_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    /// Stored title of one episode, mainly for verification
    pub fn episode_title(&self, anime_id: u32, mal_id: u32) -> Result<Option<String>> {
        use rusqlite::OptionalExtension;
        self.with_conn(|conn| {
            let title = conn
                .query_row(
                    "SELECT title FROM episodes WHERE anime_id = ?1 AND mal_id = ?2",
                    params![anime_id, mal_id],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?;
            Ok(title.flatten())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;
    use chrono::Utc;

    fn episode(anime_id: u32, mal_id: u32, title: &str) -> EpisodeRow {
        EpisodeRow {
            anime_id,
            mal_id,
            title: Some(title.to_string()),
            title_japanese: None,
            title_romanji: None,
            aired: None,
            score: None,
            filler: false,
            recap: false,
            forum_url: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_ignores_existing() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        catalog.insert_anime(&fixtures::anime(1, "Bebop"))?;

        let first = vec![episode(1, 1, "Asteroid Blues"), episode(1, 2, "Stray Dog Strut")];
        assert_eq!(catalog.insert_episodes(&first)?, 2);

        let again = vec![episode(1, 2, "Renamed"), episode(1, 3, "Honky Tonk Women")];
        assert_eq!(catalog.insert_episodes(&again)?, 1);
        assert_eq!(catalog.count_episodes(1)?, 3);
        assert_eq!(catalog.episode_title(1, 2)?.as_deref(), Some("Stray Dog Strut"));
        Ok(())
    }

    #[test]
    fn test_upsert_overwrites() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        catalog.insert_anime(&fixtures::anime(1, "Bebop"))?;
        catalog.insert_episodes(&[episode(1, 1, "Old")])?;
        catalog.upsert_episodes(&[episode(1, 1, "New")])?;
        assert_eq!(catalog.episode_title(1, 1)?.as_deref(), Some("New"));
        Ok(())
    }

    #[test]
    fn test_episodes_require_anime() -> Result<()> {
        let catalog = Catalog::open_in_memory()?;
        assert!(catalog.insert_episodes(&[episode(42, 1, "Orphan")]).is_err());
        Ok(())
    }
}
