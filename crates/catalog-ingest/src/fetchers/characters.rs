//! Character records.

use super::{decide, FetchMode, Fetcher, FetcherContext, ItemFetcher, PageFetcher};
use crate::api::{CharacterPayload, CharacterResponse};
use crate::error::Result;
use crate::mappers::character_row;
use crate::result::DatabaseOperationResult;
use async_trait::async_trait;

pub struct CharacterFetcher {
    ctx: FetcherContext,
}

impl CharacterFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }

    fn write(&self, payload: &CharacterPayload, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let catalog = &self.ctx.catalog;
        let id = payload.mal_id;
        decide(
            id,
            catalog.find_character(id)?.is_some(),
            mode,
            || catalog.insert_character(&character_row(payload)?),
            || catalog.update_character(&character_row(payload)?),
        )
    }
}

impl Fetcher for CharacterFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "characters"
    }
}

#[async_trait]
impl ItemFetcher for CharacterFetcher {
    type Payload = CharacterResponse;

    fn item_path(&self) -> &'static str {
        "/characters"
    }

    async fn process_item(
        &self,
        _id: u32,
        payload: CharacterResponse,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        self.write(&payload.data, mode)
    }
}

#[async_trait]
impl PageFetcher for CharacterFetcher {
    type Item = CharacterPayload;

    fn list_path(&self) -> &'static str {
        "/characters"
    }

    fn listed_id(item: &CharacterPayload) -> u32 {
        item.mal_id
    }

    async fn process_listed(
        &self,
        item: CharacterPayload,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        self.write(&item, mode)
    }
}
