//! Anime records: per-id, listing and season traversal.

use super::{decide, FetchMode, Fetcher, FetcherContext, ItemFetcher, PageFetcher};
use crate::api::{AnimePayload, AnimeResponse};
use crate::error::{FetcherError, Result};
use crate::mappers::anime_row;
use crate::result::DatabaseOperationResult;
use crate::traversal::{traverse_pages, PageRequest};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Broadcast season of the year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = FetcherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" => Ok(Season::Fall),
            _ => Err(FetcherError::validation(format!(
                "unknown season '{}', expected winter, spring, summer or fall",
                s
            ))),
        }
    }
}

pub struct AnimeFetcher {
    ctx: FetcherContext,
}

impl AnimeFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }

    fn write(&self, payload: &AnimePayload, mode: FetchMode) -> Result<DatabaseOperationResult> {
        let catalog = &self.ctx.catalog;
        let id = payload.mal_id;
        decide(
            id,
            catalog.anime_exists(id)?,
            mode,
            || catalog.insert_anime(&anime_row(payload)?),
            || catalog.update_anime(&anime_row(payload)?),
        )
    }

    async fn season(&self, year: u32, season: &str, mode: FetchMode) -> Result<DatabaseOperationResult> {
        if year == 0 {
            return Err(FetcherError::validation("season year must be non-zero"));
        }
        let season: Season = season.parse()?;

        let ctx = &self.ctx;
        ctx.progress
            .begin(&format!("anime {} season {} {}", mode.as_str(), season, year), 0);
        info!(year = year, season = %season, "Fetching season listing");

        let url = ctx.client.url(&format!("/seasons/{}/{}", year, season));
        let request = PageRequest::new(&url).order_by(None);
        traverse_pages(&ctx.client, ctx.progress.as_ref(), request, |items| {
            self.process_page(items, mode)
        })
        .await
    }

    /// Store every anime of a broadcast season
    pub async fn insert_season(&self, year: u32, season: &str) -> Result<DatabaseOperationResult> {
        self.season(year, season, FetchMode::Insert).await
    }

    pub async fn update_season(&self, year: u32, season: &str) -> Result<DatabaseOperationResult> {
        self.season(year, season, FetchMode::Update).await
    }
}

impl Fetcher for AnimeFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "anime"
    }
}

#[async_trait]
impl ItemFetcher for AnimeFetcher {
    type Payload = AnimeResponse;

    fn item_path(&self) -> &'static str {
        "/anime"
    }

    async fn process_item(
        &self,
        _id: u32,
        payload: AnimeResponse,
        mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        self.write(&payload.data, mode)
    }
}

#[async_trait]
impl PageFetcher for AnimeFetcher {
    type Item = AnimePayload;

    fn list_path(&self) -> &'static str {
        "/anime"
    }

    fn listed_id(item: &AnimePayload) -> u32 {
        item.mal_id
    }

    async fn process_listed(&self, item: AnimePayload, mode: FetchMode) -> Result<DatabaseOperationResult> {
        self.write(&item, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetcherErrorKind;

    #[test]
    fn test_season_parse_is_case_insensitive() -> Result<()> {
        assert_eq!("Spring".parse::<Season>()?, Season::Spring);
        assert_eq!(" FALL ".parse::<Season>()?, Season::Fall);
        Ok(())
    }

    #[test]
    fn test_unknown_season_is_validation_error() {
        let err = "autumn".parse::<Season>().unwrap_err();
        assert_eq!(err.kind(), FetcherErrorKind::Validation);
    }
}
