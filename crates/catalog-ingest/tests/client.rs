mod common;

use catalog_ingest::api::AnimeResponse;
use catalog_ingest::FetcherErrorKind;
use common::{anime, data, Harness};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn fetch_json_decodes_success() -> anyhow::Result<()> {
    let h = Harness::start().await?;
    h.serve("/anime/1", data(anime(1, "Cowboy Bebop"))).await;

    let response: Option<AnimeResponse> = h.client.fetch_json(&h.client.url("/anime/1")).await?;
    let response = response.expect("anime 1 should be found");
    assert_eq!(response.data.title.as_deref(), Some("Cowboy Bebop"));
    Ok(())
}

#[tokio::test]
async fn not_found_is_none_and_never_retried() -> anyhow::Result<()> {
    let h = Harness::start().await?;
    h.serve_status("/anime/2", 404).await;

    let response: Option<AnimeResponse> = h.client.fetch_json(&h.client.url("/anime/2")).await?;
    assert!(response.is_none());
    assert_eq!(h.requests().await, 1);
    Ok(())
}

#[tokio::test]
async fn server_errors_are_retried() -> anyhow::Result<()> {
    let h = Harness::start().await?;
    Mock::given(method("GET"))
        .and(path("/anime/3"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&h.server)
        .await;
    h.serve("/anime/3", data(anime(3, "Trigun"))).await;

    let response: Option<AnimeResponse> = h.client.fetch_json(&h.client.url("/anime/3")).await?;
    assert_eq!(response.map(|r| r.data.mal_id), Some(3));
    assert_eq!(h.requests().await, 3);
    Ok(())
}

#[tokio::test]
async fn persistent_server_error_is_network_error() -> anyhow::Result<()> {
    let h = Harness::start().await?;
    h.serve_status("/anime/4", 500).await;

    let err = h
        .client
        .fetch_json::<AnimeResponse>(&h.client.url("/anime/4"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FetcherErrorKind::Network);
    // first attempt plus max_retries
    assert_eq!(h.requests().await, 3);
    Ok(())
}

#[tokio::test]
async fn persistent_429_surfaces_as_rate_limit() -> anyhow::Result<()> {
    let h = Harness::start().await?;
    h.serve_status("/anime/5", 429).await;

    let err = h
        .client
        .fetch_json::<AnimeResponse>(&h.client.url("/anime/5"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FetcherErrorKind::RateLimit);
    assert!(err.is_rate_limit());
    assert_eq!(h.requests().await, 3);
    Ok(())
}

#[tokio::test]
async fn transient_429_recovers() -> anyhow::Result<()> {
    let h = Harness::start().await?;
    Mock::given(method("GET"))
        .and(path("/anime/6"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    h.serve("/anime/6", data(anime(6, "Planetes"))).await;

    let response: Option<AnimeResponse> = h.client.fetch_json(&h.client.url("/anime/6")).await?;
    assert!(response.is_some());
    assert_eq!(h.requests().await, 2);
    Ok(())
}

#[tokio::test]
async fn client_error_is_not_retried() -> anyhow::Result<()> {
    let h = Harness::start().await?;
    h.serve_status("/anime/7", 400).await;

    let err = h
        .client
        .fetch_json::<AnimeResponse>(&h.client.url("/anime/7"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FetcherErrorKind::Network);
    assert_eq!(h.requests().await, 1);
    Ok(())
}

#[tokio::test]
async fn undecodable_body_is_network_error() -> anyhow::Result<()> {
    let h = Harness::start().await?;
    Mock::given(method("GET"))
        .and(path("/anime/8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&h.server)
        .await;

    let err = h
        .client
        .fetch_json::<AnimeResponse>(&h.client.url("/anime/8"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FetcherErrorKind::Network);
    Ok(())
}
