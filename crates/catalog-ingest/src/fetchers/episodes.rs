//! Episode lists, scanned per anime id.
//!
//! `/anime/{id}/episodes` is itself paginated. All pages of one anime are
//! collected and written in a single bulk call.

use super::{fan_out_outcome, FetchMode, Fetcher, FetcherContext, ItemFetcher};
use crate::api::{EpisodePayload, PageResponse};
use crate::error::Result;
use crate::mappers::episode_rows;
use crate::result::DatabaseOperationResult;
use async_trait::async_trait;
use tracing::debug;

pub struct EpisodeFetcher {
    ctx: FetcherContext,
}

impl EpisodeFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }

    /// Follow `has_next_page` for one anime, starting after `first`
    async fn collect_pages(
        &self,
        anime_id: u32,
        first: PageResponse<EpisodePayload>,
    ) -> Result<Vec<EpisodePayload>> {
        let mut has_next_page = first.has_next_page();
        let mut episodes = first.data.unwrap_or_default();
        let mut page = 1;

        while has_next_page {
            page += 1;
            let url = format!("{}?page={}", self.item_url(anime_id), page);
            match self
                .ctx
                .client
                .fetch_json::<PageResponse<EpisodePayload>>(&url)
                .await?
            {
                Some(next) => {
                    has_next_page = next.has_next_page();
                    episodes.extend(next.data.unwrap_or_default());
                }
                None => break,
            }
        }

        debug!(anime_id = anime_id, pages = page, episodes = episodes.len(), "Collected episodes");
        Ok(episodes)
    }
}

impl Fetcher for EpisodeFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "episodes"
    }
}

#[async_trait]
impl ItemFetcher for EpisodeFetcher {
    type Payload = PageResponse<EpisodePayload>;

    fn item_path(&self) -> &'static str {
        "/anime"
    }

    fn item_suffix(&self) -> &'static str {
        "/episodes"
    }

    /// Episodes hang off a stored anime
    fn should_fetch(&self, id: u32) -> Result<bool> {
        let stored = self.ctx.catalog.anime_exists(id)?;
        if !stored {
            debug!(anime_id = id, "Anime not stored, skipping episodes");
        }
        Ok(stored)
    }

    async fn process_item(
        &self,
        id: u32,
        payload: PageResponse<EpisodePayload>,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        let catalog = &self.ctx.catalog;
        let episodes = self.collect_pages(id, payload).await?;
        let rows = episode_rows(id, &episodes);

        match mode {
            FetchMode::Insert => Ok(fan_out_outcome(id, catalog.insert_episodes(&rows)?)),
            FetchMode::Update if rows.is_empty() => Ok(DatabaseOperationResult::skipped(id)),
            FetchMode::Update => {
                catalog.upsert_episodes(&rows)?;
                Ok(DatabaseOperationResult::updated(id))
            }
        }
    }
}
