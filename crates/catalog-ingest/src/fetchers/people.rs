//! People: voice actors, staff, authors.

use super::{decide, FetchMode, Fetcher, FetcherContext, ItemFetcher, PageFetcher};
use crate::api::{PersonPayload, PersonResponse};
use crate::error::Result;
use crate::mappers::person_row;
use crate::result::DatabaseOperationResult;
use async_trait::async_trait;

pub struct PersonFetcher {
    ctx: FetcherContext,
}

impl PersonFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }

    fn write(&self, payload: &PersonPayload, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let catalog = &self.ctx.catalog;
        let id = payload.mal_id;
        decide(
            id,
            catalog.find_person(id)?.is_some(),
            mode,
            || catalog.insert_person(&person_row(payload)?),
            || catalog.update_person(&person_row(payload)?),
        )
    }
}

impl Fetcher for PersonFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "people"
    }
}

#[async_trait]
impl ItemFetcher for PersonFetcher {
    type Payload = PersonResponse;

    fn item_path(&self) -> &'static str {
        "/people"
    }

    async fn process_item(
        &self,
        _id: u32,
        payload: PersonResponse,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        self.write(&payload.data, mode)
    }
}

#[async_trait]
impl PageFetcher for PersonFetcher {
    type Item = PersonPayload;

    fn list_path(&self) -> &'static str {
        "/people"
    }

    fn listed_id(item: &PersonPayload) -> u32 {
        item.mal_id
    }

    async fn process_listed(&self, item: PersonPayload, mode: FetchMode) -> Result<DatabaseOperationResult> {
        self.write(&item, mode)
    }
}
