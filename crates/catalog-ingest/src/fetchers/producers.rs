//! Producers, studios and licensors (reference data, upserted).

use super::{decide, FetchMode, Fetcher, FetcherContext, ItemFetcher, PageFetcher};
use crate::api::{ProducerPayload, ProducerResponse};
use crate::error::Result;
use crate::mappers::producer_row;
use crate::result::DatabaseOperationResult;
use async_trait::async_trait;

pub struct ProducerFetcher {
    ctx: FetcherContext,
}

impl ProducerFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }

    fn write(&self, payload: &ProducerPayload, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let catalog = &self.ctx.catalog;
        let id = payload.mal_id;
        let upsert = || catalog.upsert_producer(&producer_row(payload));
        decide(id, catalog.producer_exists(id)?, mode, upsert, upsert)
    }
}

impl Fetcher for ProducerFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "producers"
    }
}

#[async_trait]
impl ItemFetcher for ProducerFetcher {
    type Payload = ProducerResponse;

    fn item_path(&self) -> &'static str {
        "/producers"
    }

    async fn process_item(
        &self,
        _id: u32,
        payload: ProducerResponse,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        self.write(&payload.data, mode)
    }
}

#[async_trait]
impl PageFetcher for ProducerFetcher {
    type Item = ProducerPayload;

    fn list_path(&self) -> &'static str {
        "/producers"
    }

    fn listed_id(item: &ProducerPayload) -> u32 {
        item.mal_id
    }

    async fn process_listed(
        &self,
        item: ProducerPayload,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        self.write(&item, mode)
    }
}
