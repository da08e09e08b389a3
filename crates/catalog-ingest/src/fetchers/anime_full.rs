//! Genre, producer and relation associations from `/anime/{id}/full`.

use super::{fan_out_outcome, FetchMode, Fetcher, FetcherContext, ItemFetcher};
use crate::api::AnimeFullResponse;
use crate::error::Result;
use crate::mappers::anime_full_links;
use crate::result::DatabaseOperationResult;
use async_trait::async_trait;
use tracing::debug;

/// Fan-out only: the anime row itself must already be stored
pub struct AnimeFullFetcher {
    ctx: FetcherContext,
}

impl AnimeFullFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }
}

impl Fetcher for AnimeFullFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "anime-full"
    }
}

#[async_trait]
impl ItemFetcher for AnimeFullFetcher {
    type Payload = AnimeFullResponse;

    fn item_path(&self) -> &'static str {
        "/anime"
    }

    fn item_suffix(&self) -> &'static str {
        "/full"
    }

    fn should_fetch(&self, id: u32) -> Result<bool> {
        let stored = self.ctx.catalog.anime_exists(id)?;
        if !stored {
            debug!(anime_id = id, "Anime not stored, skipping associations");
        }
        Ok(stored)
    }

    async fn process_item(
        &self,
        id: u32,
        payload: AnimeFullResponse,
        _mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        let catalog = &self.ctx.catalog;
        let links = anime_full_links(&payload.data);
        let new_rows = catalog.insert_anime_genres(&links.genres)?
            + catalog.insert_anime_producers(&links.producers)?
            + catalog.insert_anime_relations(&links.relations)?;

        debug!(anime_id = id, links = links.len(), new_rows = new_rows, "Stored associations");
        Ok(fan_out_outcome(id, new_rows))
    }
}
