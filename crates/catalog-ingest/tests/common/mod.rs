#![allow(dead_code)]

use std::sync::Arc;

use catalog_ingest::api::AnimePayload;
use catalog_ingest::mappers::anime_row;
use catalog_ingest::{FetchClient, FetcherContext, TrackingProgress};
use serde_json::{json, Value};
use shared::config::{CatalogApiConfig, TraversalConfig};
use shared::{Catalog, Config};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// API settings pointing at the mock server: no client-side throttling,
/// millisecond backoff
pub fn api_config(uri: &str) -> CatalogApiConfig {
    let mut config = Config::default().catalog_api;
    config.base_url = uri.to_string();
    config.timeout_secs = 5;
    config.max_retries = 2;
    config.retry_delay_ms = 1;
    config.rate_limit.requests_per_second = 0.0;
    config.rate_limit.requests_per_minute = 0;
    config
}

pub struct Harness {
    pub server: MockServer,
    pub client: Arc<FetchClient>,
    pub catalog: Arc<Catalog>,
    pub progress: Arc<TrackingProgress>,
    pub ctx: FetcherContext,
}

impl Harness {
    pub async fn start() -> anyhow::Result<Self> {
        Self::with_settings(TraversalConfig::default()).await
    }

    pub async fn with_settings(settings: TraversalConfig) -> anyhow::Result<Self> {
        let server = MockServer::start().await;
        let client = Arc::new(FetchClient::new(&api_config(&server.uri()))?);
        let catalog = Arc::new(Catalog::open_in_memory()?);
        let progress = Arc::new(TrackingProgress::silent());
        let ctx = FetcherContext::new(client.clone(), catalog.clone(), settings, progress.clone());
        Ok(Self {
            server,
            client,
            catalog,
            progress,
            ctx,
        })
    }

    pub async fn requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }

    pub async fn requests_to(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }

    /// Serve `body` as JSON on every GET of `request_path`
    pub async fn serve(&self, request_path: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn serve_status(&self, request_path: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Put an anime row straight into the catalog
    pub fn store_anime(&self, id: u32, title: &str) -> anyhow::Result<()> {
        let payload: AnimePayload = serde_json::from_value(anime(id, title))?;
        self.catalog.insert_anime(&anime_row(&payload)?)
    }
}

pub fn anime(id: u32, title: &str) -> Value {
    json!({
        "mal_id": id,
        "url": format!("https://myanimelist.net/anime/{}", id),
        "title": title,
        "type": "TV",
        "episodes": 12,
        "airing": false,
        "aired": {"from": "2020-04-01T00:00:00+00:00", "to": null},
        "score": 7.5
    })
}

pub fn data(value: Value) -> Value {
    json!({ "data": value })
}

pub fn page(items: Vec<Value>, has_next_page: bool, total: u64) -> Value {
    let count = items.len();
    json!({
        "pagination": {
            "last_visible_page": 2,
            "has_next_page": has_next_page,
            "current_page": 1,
            "items": {"count": count, "total": total, "per_page": 25}
        },
        "data": items
    })
}
