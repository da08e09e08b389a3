//! Manga magazines (reference data, upserted).
//!
//! The upstream has no per-id magazine endpoint. A single magazine is
//! looked up by fetching the one listing page that should contain it.
//! Magazine ids are sparse, so the target may be absent from that page; it
//! is then reported as an error of its own.

use super::{decide, FetchMode, Fetcher, FetcherContext, PageFetcher};
use crate::api::MagazinePayload;
use crate::error::{FetcherError, Result};
use crate::mappers::magazine_row;
use crate::result::DatabaseOperationResult;
use crate::traversal::{traverse_pages, PageRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Items per magazine listing page
pub const MAGAZINE_PAGE_SIZE: u32 = 25;

/// Listing page expected to hold `id` when ordered by id
pub fn page_for_id(id: u32) -> u32 {
    (id.saturating_sub(1)) / MAGAZINE_PAGE_SIZE + 1
}

pub struct MagazineFetcher {
    ctx: FetcherContext,
}

impl MagazineFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }

    fn write(&self, payload: &MagazinePayload, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let catalog = &self.ctx.catalog;
        let id = payload.mal_id;
        let upsert = || catalog.upsert_magazine(&magazine_row(payload)?);
        decide(id, catalog.magazine_exists(id)?, mode, upsert, upsert)
    }

    /// Write only `target` from a page; everything else is skipped
    async fn process_target_page(
        &self,
        items: Vec<MagazinePayload>,
        target: u32,
        mode: FetchMode,
        found: &AtomicBool,
    ) -> Result<DatabaseOperationResult> {
        let mut total = DatabaseOperationResult::default();
        for item in &items {
            if item.mal_id != target {
                total += DatabaseOperationResult::skipped(item.mal_id);
                continue;
            }
            found.store(true, Ordering::Relaxed);
            total += match self.write(item, mode) {
                Ok(result) => result,
                Err(e) => {
                    self.ctx
                        .progress
                        .warn(&format!("Failed to write magazine {}: {}", target, e));
                    DatabaseOperationResult::error(target)
                }
            };
        }
        Ok(total)
    }

    async fn single(&self, id: u32, mode: FetchMode) -> Result<DatabaseOperationResult> {
        if id == 0 {
            return Err(FetcherError::validation("magazine id must be positive"));
        }
        let ctx = &self.ctx;
        ctx.progress
            .begin(&format!("magazines {} single", mode.as_str()), 1);

        let url = ctx.client.url(self.list_path());
        let request = PageRequest::new(&url)
            .order_by(self.order_by())
            .start_page(page_for_id(id))
            .single_page(true);
        let found = AtomicBool::new(false);
        let mut total = traverse_pages(&ctx.client, ctx.progress.as_ref(), request, |items| {
            self.process_target_page(items, id, mode, &found)
        })
        .await?;

        if !found.load(Ordering::Relaxed) {
            ctx.progress.warn(&format!(
                "Magazine {} not on listing page {}",
                id,
                page_for_id(id)
            ));
            let missing = DatabaseOperationResult::error(id);
            ctx.progress.advance(1, &missing);
            total += missing;
        }
        Ok(total)
    }

    pub async fn insert_single(&self, id: u32) -> Result<DatabaseOperationResult> {
        self.single(id, FetchMode::Insert).await
    }

    pub async fn update_single(&self, id: u32) -> Result<DatabaseOperationResult> {
        self.single(id, FetchMode::Update).await
    }
}

impl Fetcher for MagazineFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "magazines"
    }
}

#[async_trait]
impl PageFetcher for MagazineFetcher {
    type Item = MagazinePayload;

    fn list_path(&self) -> &'static str {
        "/magazines"
    }

    fn listed_id(item: &MagazinePayload) -> u32 {
        item.mal_id
    }

    async fn process_listed(
        &self,
        item: MagazinePayload,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        self.write(&item, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_for_id() {
        assert_eq!(page_for_id(1), 1);
        assert_eq!(page_for_id(25), 1);
        assert_eq!(page_for_id(26), 2);
        assert_eq!(page_for_id(1000), 40);
    }
}
