//! Characters, voice actors and staff of an anime.

use super::{fan_out_outcome, FetchMode, Fetcher, FetcherContext, ItemFetcher};
use crate::api::{AnimeCharactersResponse, AnimeStaffResponse};
use crate::error::Result;
use crate::mappers::{anime_character_links, anime_staff_links};
use crate::result::DatabaseOperationResult;
use async_trait::async_trait;
use tracing::debug;

/// Fan-out from `/anime/{id}/characters` plus `/anime/{id}/staff`
pub struct AnimeCastFetcher {
    ctx: FetcherContext,
}

impl AnimeCastFetcher {
    pub fn new(ctx: FetcherContext) -> Self {
        Self { ctx }
    }
}

impl Fetcher for AnimeCastFetcher {
    fn context(&self) -> &FetcherContext {
        &self.ctx
    }

    fn label(&self) -> &'static str {
        "anime-cast"
    }
}

#[async_trait]
impl ItemFetcher for AnimeCastFetcher {
    type Payload = AnimeCharactersResponse;

    fn item_path(&self) -> &'static str {
        "/anime"
    }

    fn item_suffix(&self) -> &'static str {
        "/characters"
    }

    fn should_fetch(&self, id: u32) -> Result<bool> {
        let stored = self.ctx.catalog.anime_exists(id)?;
        if !stored {
            debug!(anime_id = id, "Anime not stored, skipping cast");
        }
        Ok(stored)
    }

    async fn process_item(
        &self,
        id: u32,
        payload: AnimeCharactersResponse,
        _mode: FetchMode,
    ) -> Result<DatabaseOperationResult> {
        let ctx = &self.ctx;
        let staff_url = ctx.client.url(&format!("/anime/{}/staff", id));
        let staff = ctx
            .client
            .fetch_json::<AnimeStaffResponse>(&staff_url)
            .await?
            .map(|response| response.data)
            .unwrap_or_default();

        let (characters, voice_actors) = anime_character_links(id, &payload.data);
        let staff = anime_staff_links(id, &staff);

        let new_rows = ctx.catalog.insert_anime_characters(&characters)?
            + ctx.catalog.insert_anime_voice_actors(&voice_actors)?
            + ctx.catalog.insert_anime_staff(&staff)?;

        debug!(
            anime_id = id,
            characters = characters.len(),
            voice_actors = voice_actors.len(),
            staff = staff.len(),
            new_rows = new_rows,
            "Stored cast"
        );
        Ok(fan_out_outcome(id, new_rows))
    }
}
