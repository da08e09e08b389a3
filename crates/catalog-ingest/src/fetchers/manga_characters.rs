//! Characters appearing in a manga.

use super::{fan_out_outcome, FetchMode, Fetcher, FetcherContext, ItemFetcher};
use crate::api::MangaCharactersResponse;
use crate::error::Result;
use crate::mappers::manga_character_links;
use crate::result::DatabaseOperationResult;
use async_trait::async_trait;

pub struct MangaCharacterFetcher {
    ctx: FetcherContext,
}

impl MangaCharacterFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }
}

impl Fetcher for MangaCharacterFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "manga-characters"
    }
}

#[async_trait]
impl ItemFetcher for MangaCharacterFetcher {
    type Payload = MangaCharactersResponse;

    fn item_path(&self) -> &'static str {
        "/manga"
    }

    fn item_suffix(&self) -> &'static str {
        "/characters"
    }

    fn should_fetch(&self, id: u32) -> Result<bool> {
        Ok(self.ctx.catalog.manga_exists(id)?)
    }

    async fn process_item(
        &self,
        id: u32,
        payload: MangaCharactersResponse,
        _mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        let catalog = &self.ctx.catalog;
        let links = manga_character_links(id, &payload.data);
        Ok(fan_out_outcome(id, catalog.insert_manga_characters(&links)?))
    }
}
