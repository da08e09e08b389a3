//! Entity fetchers.
//!
//! Each fetcher plugs its URLs, mapper and catalog calls into the shared
//! traversal engine. Two capability traits carry the command surface:
//!
//! - [`ItemFetcher`]: per-id detail endpoints, giving `*_single`,
//!   `*_range`, `*_between` and `*_from_list`;
//! - [`PageFetcher`]: paginated listing endpoints, giving `*_all`.
//!
//! Insert mode never overwrites a stored row; update mode does. Every id a
//! command touches lands in exactly one of the four result buckets.

pub mod anime;
pub mod anime_cast;
pub mod anime_full;
pub mod characters;
pub mod episodes;
pub mod genres;
pub mod magazines;
pub mod manga;
pub mod manga_characters;
pub mod people;
pub mod producers;

pub use anime::{AnimeFetcher, Season};
pub use anime_cast::AnimeCastFetcher;
pub use anime_full::AnimeFullFetcher;
pub use characters::CharacterFetcher;
pub use episodes::EpisodeFetcher;
pub use genres::GenreFetcher;
pub use magazines::MagazineFetcher;
pub use manga::MangaFetcher;
pub use manga_characters::MangaCharacterFetcher;
pub use people::PersonFetcher;
pub use producers::ProducerFetcher;

use crate::api::FetchClient;
use crate::error::Result;
use crate::progress::ProgressReporter;
use crate::result::DatabaseOperationResult;
use crate::traversal::{traverse_pages, traverse_range_filtered, PageRequest, RangeRequest};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use shared::config::TraversalConfig;
use shared::Catalog;
use std::sync::Arc;

/// Whether stored rows are left alone or overwritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Insert,
    Update,
}

impl FetchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Insert => "insert",
            FetchMode::Update => "update",
        }
    }
}

/// Everything a fetcher needs, shared by all fetchers of one run
#[derive(Clone)]
pub struct FetcherContext {
    pub client: Arc<FetchClient>,
    pub catalog: Arc<Catalog>,
    pub settings: TraversalConfig,
    pub progress: Arc<dyn ProgressReporter>,
}

impl FetcherContext {
    pub fn new(
        client: Arc<FetchClient>,
        catalog: Arc<Catalog>,
        settings: TraversalConfig,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            client,
            catalog,
            settings,
            progress,
        }
    }
}

/// Apply the insert/update decision for one primary row.
///
/// | stored | mode   | action | bucket   |
/// |--------|--------|--------|----------|
/// | no     | any    | insert | inserted |
/// | yes    | insert | none   | skipped  |
/// | yes    | update | update | updated  |
///
/// Reference data written with an upsert passes the same call for both
/// closures; existence is looked up first so the split stays observable.
pub(crate) fn decide(
    id: u32,
    stored: bool,
    mode: FetchMode,
    insert: impl FnOnce() -> anyhow::Result<()>,
    update: impl FnOnce() -> anyhow::Result<()>,
) -> Result<DatabaseOperationResult> {
    match (stored, mode) {
        (false, _) => {
            insert()?;
            Ok(DatabaseOperationResult::inserted(id))
        }
        (true, FetchMode::Insert) => Ok(DatabaseOperationResult::skipped(id)),
        (true, FetchMode::Update) => {
            update()?;
            Ok(DatabaseOperationResult::updated(id))
        }
    }
}

/// Outcome of a join-row fan-out: anything new counts as inserted
pub(crate) fn fan_out_outcome(id: u32, new_rows: usize) -> DatabaseOperationResult {
    if new_rows > 0 {
        DatabaseOperationResult::inserted(id)
    } else {
        DatabaseOperationResult::skipped(id)
    }
}

/// Common accessors of every fetcher
pub trait Fetcher: Send + Sync {
    fn context(&self) -> &FetcherContext;

    /// Name used in progress output
    fn label(&self) -> &'static str;
}

/// Fetcher over a per-id endpoint `{item_path}/{id}{item_suffix}`
#[async_trait]
pub trait ItemFetcher: Fetcher {
    /// Decoded response body of the per-id endpoint
    type Payload: DeserializeOwned + Send + 'static;

    /// Collection path, e.g. `/anime`
    fn item_path(&self) -> &'static str;

    /// Appended after the id, e.g. `/characters`
    fn item_suffix(&self) -> &'static str {
        ""
    }

    /// Write one fetched record and report its bucket
    async fn process_item(
        &self,
        id: u32,
        payload: Self::Payload,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult>;

    /// Local check before requesting `id`; `false` skips it without a request
    fn should_fetch(&self, _id: u32) -> Result<bool> {
        Ok(true)
    }

    fn item_url(&self, id: u32) -> String {
        format!(
            "{}/{}{}",
            self.context().client.url(self.item_path()),
            id,
            self.item_suffix()
        )
    }

    /// Fetch and process one id without touching progress; 404 is skipped
    async fn fetch_item(&self, id: u32, mode: FetchMode) -> Result<DatabaseOperationResult> {
        if !self.should_fetch(id)? {
            return Ok(DatabaseOperationResult::skipped(id));
        }
        let url = self.item_url(id);
        match self.context().client.fetch_json::<Self::Payload>(&url).await? {
            Some(payload) => self.process_item(id, payload, mode).await,
            None => Ok(DatabaseOperationResult::skipped(id)),
        }
    }

    /// [`fetch_item`](Self::fetch_item) with any failure but rate limiting
    /// counted as one error, then reported to progress
    async fn fetch_counted(&self, id: u32, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let progress = self.context().progress.as_ref();
        let outcome = match self.fetch_item(id, mode).await {
            Ok(result) => result,
            Err(e) if e.is_rate_limit() => return Err(e),
            Err(e) => {
                progress.warn(&format!("Failed to process id {}: {}", id, e));
                DatabaseOperationResult::error(id)
            }
        };
        progress.advance(1, &outcome);
        Ok(outcome)
    }

    async fn single(&self, id: u32, mode: FetchMode) -> Result<DatabaseOperationResult> {
        self.context()
            .progress
            .begin(&format!("{} {} single", self.label(), mode.as_str()), 1);
        self.fetch_counted(id, mode).await
    }

    async fn range(
        &self,
        start_id: u32,
        end_id: Option<u32>,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        let ctx = self.context();
        let base_url = ctx.client.url(self.item_path());
        let request = RangeRequest {
            base_url: &base_url,
            suffix: self.item_suffix(),
            start_id,
            end_id,
        };
        request.validate()?;

        ctx.progress
            .begin(&format!("{} {} range", self.label(), mode.as_str()), 0);
        traverse_range_filtered(
            &ctx.client,
            ctx.progress.as_ref(),
            &ctx.settings,
            request,
            |id| self.should_fetch(id),
            |id, payload| self.process_item(id, payload, mode),
        )
        .await
    }

    /// Process caller-supplied ids in order, e.g. the failures of a previous run
    async fn from_list(&self, ids: &[u32], mode: FetchMode) -> Result<DatabaseOperationResult> {
        let progress = self.context().progress.as_ref();
        progress.begin(
            &format!("{} {} list", self.label(), mode.as_str()),
            ids.len() as u64,
        );

        let mut total = DatabaseOperationResult::default();
        for &id in ids {
            total += self.fetch_counted(id, mode).await?;
        }
        Ok(total)
    }

    async fn insert_single(&self, id: u32) -> Result<DatabaseOperationResult> {
        self.single(id, FetchMode::Insert).await
    }

    async fn update_single(&self, id: u32) -> Result<DatabaseOperationResult> {
        self.single(id, FetchMode::Update).await
    }

    /// Open-ended scan from `start_id`
    async fn insert_range(&self, start_id: u32) -> Result<DatabaseOperationResult> {
        self.range(start_id, None, FetchMode::Insert).await
    }

    async fn update_range(&self, start_id: u32) -> Result<DatabaseOperationResult> {
        self.range(start_id, None, FetchMode::Update).await
    }

    /// Bounded scan over `[start_id, end_id]`
    async fn insert_between(&self, start_id: u32, end_id: u32) -> Result<DatabaseOperationResult> {
        self.range(start_id, Some(end_id), FetchMode::Insert).await
    }

    async fn update_between(&self, start_id: u32, end_id: u32) -> Result<DatabaseOperationResult> {
        self.range(start_id, Some(end_id), FetchMode::Update).await
    }

    async fn insert_from_list(&self, ids: &[u32]) -> Result<DatabaseOperationResult> {
        self.from_list(ids, FetchMode::Insert).await
    }

    async fn update_from_list(&self, ids: &[u32]) -> Result<DatabaseOperationResult> {
        self.from_list(ids, FetchMode::Update).await
    }
}

/// Fetcher over a paginated listing endpoint
#[async_trait]
pub trait PageFetcher: Fetcher {
    /// One element of a listing page
    type Item: DeserializeOwned + Send + 'static;

    /// Listing path, e.g. `/anime`
    fn list_path(&self) -> &'static str;

    /// Stable ordering field, so pages do not shift during a long run
    fn order_by(&self) -> Option<&'static str> {
        Some("mal_id")
    }

    fn listed_id(item: &Self::Item) -> u32;

    /// Write one listed record and report its bucket
    async fn process_listed(&self, item: Self::Item, mode: FetchMode) -> Result<DatabaseOperationResult>;

    /// Process a page item by item; a failing item is counted, not fatal
    async fn process_page(&self, items: Vec<Self::Item>, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let mut total = DatabaseOperationResult::default();
        for item in items {
            let id = Self::listed_id(&item);
            total += match self.process_listed(item, mode).await {
                Ok(result) => result,
                Err(e) if e.is_rate_limit() => return Err(e),
                Err(e) => {
                    self.context()
                        .progress
                        .warn(&format!("Failed to process id {}: {}", id, e));
                    DatabaseOperationResult::error(id)
                }
            };
        }
        Ok(total)
    }

    /// Page through `url` from `start_page`
    async fn traverse_listing(
        &self,
        url: &str,
        start_page: u32,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        let ctx = self.context();
        let request = PageRequest::new(url)
            .order_by(self.order_by())
            .start_page(start_page);
        traverse_pages(&ctx.client, ctx.progress.as_ref(), request, |items| {
            self.process_page(items, mode)
        })
        .await
    }

    async fn all(&self, start_page: u32, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let ctx = self.context();
        ctx.progress
            .begin(&format!("{} {} pages", self.label(), mode.as_str()), 0);
        let url = ctx.client.url(self.list_path());
        self.traverse_listing(&url, start_page, mode).await
    }

    async fn insert_all(&self, start_page: u32) -> Result<DatabaseOperationResult> {
        self.all(start_page, FetchMode::Insert).await
    }

    async fn update_all(&self, start_page: u32) -> Result<DatabaseOperationResult> {
        self.all(start_page, FetchMode::Update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_table() -> anyhow::Result<()> {
        let ok = || -> anyhow::Result<()> { Ok(()) };
        let never = || -> anyhow::Result<()> { anyhow::bail!("must not be called") };

        assert_eq!(decide(1, false, FetchMode::Insert, ok, never)?.inserted, 1);
        assert_eq!(decide(1, false, FetchMode::Update, ok, never)?.inserted, 1);
        assert_eq!(decide(1, true, FetchMode::Insert, never, never)?.skipped, 1);
        assert_eq!(decide(1, true, FetchMode::Update, never, ok)?.updated, 1);
        Ok(())
    }

    #[test]
    fn test_decide_surfaces_database_error() {
        let err = decide(3, false, FetchMode::Insert, || anyhow::bail!("disk full"), || Ok(()))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::FetcherErrorKind::Database);
    }

    #[test]
    fn test_fan_out_outcome() {
        assert_eq!(fan_out_outcome(5, 3).inserted, 1);
        assert_eq!(fan_out_outcome(5, 0).skipped, 1);
    }
}
