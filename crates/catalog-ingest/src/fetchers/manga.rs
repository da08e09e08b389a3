//! Manga records.

use super::{decide, FetchMode, Fetcher, FetcherContext, ItemFetcher, PageFetcher};
use crate::api::{MangaPayload, MangaResponse};
use crate::error::Result;
use crate::mappers::manga_row;
use crate::result::DatabaseOperationResult;
use async_trait::async_trait;

pub struct MangaFetcher {
    ctx: FetcherContext,
}

impl MangaFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }

    fn write(&self, payload: &MangaPayload, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let catalog = &self.ctx.catalog;
        let id = payload.mal_id;
        decide(
            id,
            catalog.manga_exists(id)?,
            mode,
            || catalog.insert_manga(&manga_row(payload)?),
            || catalog.update_manga(&manga_row(payload)?),
        )
    }
}

impl Fetcher for MangaFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "manga"
    }
}

#[async_trait]
impl ItemFetcher for MangaFetcher {
    type Payload = MangaResponse;

    fn item_path(&self) -> &'static str {
        "/manga"
    }

    async fn process_item(
        &self,
        _id: u32,
        payload: MangaResponse,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        self.write(&payload.data, mode)
    }
}

#[async_trait]
impl PageFetcher for MangaFetcher {
    type Item = MangaPayload;

    fn list_path(&self) -> &'static str {
        "/manga"
    }

    fn listed_id(item: &MangaPayload) -> u32 {
        item.mal_id
    }

    async fn process_listed(&self, item: MangaPayload, mode: FetchMode) -> Result<DatabaseOperationResult> {
        self.write(&item, mode)
    }
}
