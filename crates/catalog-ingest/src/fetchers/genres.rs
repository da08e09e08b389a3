//! Genre lists (reference data, upserted).
//!
//! `/genres/{anime|manga}` returns the whole list in one response, typically
//! well under a thousand items. Items are written on blocking threads by a
//! bounded pool; the bound is `traversal.batch_size`.

use super::{decide, FetchMode, Fetcher, FetcherContext};
use crate::api::{GenrePayload, PageResponse};
use crate::error::{FetcherError, Result};
use crate::mappers::genre_row;
use crate::result::DatabaseOperationResult;
use shared::{Catalog, GenreKind};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::info;

/// Run the blocking `worker` over `items` with at most `limit` in flight.
///
/// Results come back in input order.
pub(crate) async fn run_bounded<T, R, F>(
    items: Vec<T>,
    limit: usize,
    worker: F,
) -> Result<Vec<std::result::Result<R, JoinError>>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let worker = Arc::new(worker);
    let mut tasks = Vec::with_capacity(items.len());

    for item in items {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(FetcherError::unknown)?;
        let worker = worker.clone();

        tasks.push(tokio::task::spawn_blocking(move || {
            let result = worker(item);
            drop(permit);
            result
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await);
    }
    Ok(results)
}

fn write_genre(
    catalog: &Catalog,
    payload: &GenrePayload,
    kind: GenreKind,
    mode: FetchMode,
) -> Result<DatabaseOperationResult> {
    let id = payload.mal_id;
    let upsert = || catalog.upsert_genre(&genre_row(payload, kind)?);
    decide(id, catalog.genre_exists(id, kind)?, mode, upsert, upsert)
}

pub struct GenreFetcher {
    ctx: FetcherContext,
}

impl GenreFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }

    async fn fetch_kind(&self, kind: GenreKind, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let ctx = &self.ctx;
        let url = ctx.client.url(&format!("/genres/{}", kind));
        let Some(response) = ctx.client.fetch_json::<PageResponse<GenrePayload>>(&url).await? else {
            info!(kind = %kind, "Genre list not found");
            return Ok(DatabaseOperationResult::default());
        };
        let items = response.data.unwrap_or_default();
        ctx.progress.set_total(ctx.progress.snapshot().total + items.len() as u64);
        info!(kind = %kind, count = items.len(), workers = ctx.settings.batch_size, "Writing genres");

        let ids: Vec<u32> = items.iter().map(|g| g.mal_id).collect();
        let catalog = ctx.catalog.clone();
        let outcomes = run_bounded(items, ctx.settings.batch_size, move |payload| {
            write_genre(&catalog, &payload, kind, mode)
        })
        .await?;

        let mut total = DatabaseOperationResult::default();
        for (id, outcome) in ids.into_iter().zip(outcomes) {
            let result = match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    ctx.progress
                        .warn(&format!("Failed to write {} genre {}: {}", kind, id, e));
                    DatabaseOperationResult::error(id)
                }
                Err(e) => {
                    ctx.progress
                        .warn(&format!("Genre worker for {} {} failed: {}", kind, id, e));
                    DatabaseOperationResult::error(id)
                }
            };
            ctx.progress.advance(1, &result);
            total += result;
        }
        Ok(total)
    }

    async fn run(&self, kinds: &[GenreKind], mode: FetchMode) -> Result<DatabaseOperationResult> {
        self.ctx
            .progress
            .begin(&format!("genres {}", mode.as_str()), 0);
        let mut total = DatabaseOperationResult::default();
        for &kind in kinds {
            total += self.fetch_kind(kind, mode).await?;
        }
        Ok(total)
    }

    pub async fn insert_genres(&self, kind: GenreKind) -> Result<DatabaseOperationResult> {
        self.run(&[kind], FetchMode::Insert).await
    }

    pub async fn update_genres(&self, kind: GenreKind) -> Result<DatabaseOperationResult> {
        self.run(&[kind], FetchMode::Update).await
    }

    /// Anime and manga genre lists in one run
    pub async fn insert_all(&self) -> Result<DatabaseOperationResult> {
        self.run(&[GenreKind::Anime, GenreKind::Manga], FetchMode::Insert)
            .await
    }

    pub async fn update_all(&self) -> Result<DatabaseOperationResult> {
        self.run(&[GenreKind::Anime, GenreKind::Manga], FetchMode::Update)
            .await
    }
}

impl Fetcher for GenreFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "genres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_bounded_respects_limit() -> anyhow::Result<()> {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (counter, high) = (active.clone(), peak.clone());
        let results = run_bounded((0..50u32).collect(), 4, move |n| {
            let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
            high.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            counter.fetch_sub(1, Ordering::SeqCst);
            n * 2
        })
        .await?;

        assert!(peak.load(Ordering::SeqCst) <= 4);
        let values: Vec<u32> = results.into_iter().map(|r| r.unwrap_or(u32::MAX)).collect();
        assert_eq!(values, (0..50u32).map(|n| n * 2).collect::<Vec<_>>());
        Ok(())
    }

    #[tokio::test]
    async fn test_write_genre_decisions() -> anyhow::Result<()> {
        let catalog = Catalog::open_in_memory()?;
        let payload: GenrePayload =
            serde_json::from_value(serde_json::json!({"mal_id": 1, "name": "Action", "count": 10}))?;

        assert_eq!(write_genre(&catalog, &payload, GenreKind::Anime, FetchMode::Insert)?.inserted, 1);
        assert_eq!(write_genre(&catalog, &payload, GenreKind::Anime, FetchMode::Insert)?.skipped, 1);
        assert_eq!(write_genre(&catalog, &payload, GenreKind::Anime, FetchMode::Update)?.updated, 1);
        // same id, other catalog
        assert_eq!(write_genre(&catalog, &payload, GenreKind::Manga, FetchMode::Insert)?.inserted, 1);
        Ok(())
    }
}
