use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    error::{CatalogError, Result},
    models::{Game, GameId, Genre, Page, Publisher, Screenshot},
    paging::PageRequest,
};

use super::{
    query::Query,
    transport::{HttpTransport, Transport},
};

/// Screenshots fetched for a game detail when the caller does not choose.
pub const DEFAULT_SCREENSHOT_COUNT: u32 = 12;

/// Thin request builder over the upstream REST API.
///
/// Every operation performs exactly one GET. There is no caching, retry or
/// request deduplication; callers decide what to do with failures.
#[derive(Debug, Clone)]
pub struct CatalogClient<T = HttpTransport> {
    transport: T,
    base_url: String,
    api_key: Option<String>,
}

impl CatalogClient<HttpTransport> {
    /// Build a client from configuration using the reqwest transport.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::with_transport(
            config.api_base_url.clone(),
            config.api_key().map(str::to_string),
            HttpTransport::new()?,
        ))
    }
}

impl<T: Transport> CatalogClient<T> {
    /// Build a client over an arbitrary transport.
    pub fn with_transport(base_url: impl Into<String>, api_key: Option<String>, transport: T) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Root URL requests are built against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `base + path + ?query&key=...`.
    pub fn build_url(&self, path: &str, query: &Query) -> Result<Url> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            CatalogError::Configuration(
                "missing API key; set RAWG_API_KEY before starting".to_string(),
            )
        })?;

        let raw = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|err| {
            CatalogError::Configuration(format!("invalid API base URL {}: {err}", self.base_url))
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query.pairs() {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("key", key);
        }
        Ok(url)
    }

    /// Issue a GET and return the JSON body unchanged.
    pub async fn request(&self, path: &str, query: &Query) -> Result<Value> {
        let url = self.build_url(path, query)?;
        debug!(path, params = ?query.pairs(), "catalog request");

        let response = self.transport.get(url).await.map_err(|err| {
            warn!(path, %err, "catalog request failed");
            err
        })?;
        if !response.is_success() {
            warn!(path, status = response.status, "catalog request rejected");
            return Err(CatalogError::Http {
                status: response.status,
            });
        }

        serde_json::from_slice(&response.body).map_err(|err| {
            warn!(path, %err, "catalog response is not JSON");
            CatalogError::from(err)
        })
    }

    async fn fetch<R: DeserializeOwned>(&self, path: &str, query: Query) -> Result<R> {
        let body = self.request(path, &query).await?;
        serde_json::from_value(body).map_err(|err| {
            warn!(path, %err, "catalog response has an unexpected shape");
            CatalogError::from(err)
        })
    }

    /// Games ordered by descending rating.
    pub async fn popular_games(&self, page: PageRequest) -> Result<Page<Game>> {
        let query = Query::new().param("ordering", "-rating").page(page);
        self.fetch("/games", query).await
    }

    /// Games whose name matches `term`. Blank terms are passed through.
    pub async fn search_games(&self, term: &str, page: PageRequest) -> Result<Page<Game>> {
        let query = Query::new().param("search", term).page(page);
        self.fetch("/games", query).await
    }

    /// A single game with its description and publishers.
    pub async fn game_detail(&self, id: GameId) -> Result<Game> {
        self.fetch(&format!("/games/{id}"), Query::new()).await
    }

    /// Up to `count` screenshots for a game.
    pub async fn game_screenshots(&self, id: GameId, count: u32) -> Result<Page<Screenshot>> {
        let query = Query::new().param("page_size", count.max(1));
        self.fetch(&format!("/games/{id}/screenshots"), query).await
    }

    /// Games carrying the tag `slug`.
    pub async fn games_by_tag(&self, slug: &str, page: PageRequest) -> Result<Page<Game>> {
        let query = Query::new().param("tags", slug).page(page);
        self.fetch("/games", query).await
    }

    /// Games in the genre `slug` (upstream also accepts the numeric id).
    pub async fn games_by_genre(&self, slug: &str, page: PageRequest) -> Result<Page<Game>> {
        let query = Query::new().param("genres", slug).page(page);
        self.fetch("/games", query).await
    }

    /// A single genre.
    pub async fn genre_detail(&self, id: u64) -> Result<Genre> {
        self.fetch(&format!("/genres/{id}"), Query::new()).await
    }

    /// Publishers, optionally filtered by a free-text term.
    pub async fn publishers(&self, term: Option<&str>, page: PageRequest) -> Result<Page<Publisher>> {
        let query = Query::new().param_if_present("search", term).page(page);
        self.fetch("/publishers", query).await
    }

    /// A single publisher.
    pub async fn publisher_detail(&self, id: u64) -> Result<Publisher> {
        self.fetch(&format!("/publishers/{id}"), Query::new()).await
    }

    /// Games released by the publisher `id`.
    pub async fn publisher_games(&self, id: u64, page: PageRequest) -> Result<Page<Game>> {
        let query = Query::new().param("publishers", id).page(page);
        self.fetch("/games", query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TransportResponse;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    const BASE: &str = "https://api.rawg.io/api";

    #[derive(Clone)]
    struct StubTransport {
        status: u16,
        body: String,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl StubTransport {
        fn new(status: u16, body: Value) -> Self {
            Self {
                status,
                body: body.to_string(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn raw(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl Transport for StubTransport {
        async fn get(&self, url: Url) -> Result<TransportResponse> {
            self.calls.lock().push(url.to_string());
            Ok(TransportResponse {
                status: self.status,
                body: self.body.clone().into_bytes(),
            })
        }
    }

    fn client(transport: StubTransport) -> CatalogClient<StubTransport> {
        CatalogClient::with_transport(BASE, Some("test-key".to_string()), transport)
    }

    fn empty_page() -> Value {
        json!({"count": 0, "next": null, "results": []})
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let transport = StubTransport::new(200, empty_page());
        let client = CatalogClient::with_transport(BASE, None, transport.clone());

        let err = client
            .request("/games", &Query::new())
            .await
            .expect_err("request without key must fail");
        assert!(matches!(err, CatalogError::Configuration(_)));
        assert!(transport.calls().is_empty());

        let blank = CatalogClient::with_transport(BASE, Some("  ".to_string()), transport.clone());
        assert!(matches!(
            blank.popular_games(PageRequest::default()).await,
            Err(CatalogError::Configuration(_))
        ));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let transport = StubTransport::raw(404, r#"{"detail": "Not found."}"#);
        let client = client(transport.clone());

        let err = client.game_detail(1).await.expect_err("404 must fail");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "API error (404)");
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn success_body_is_returned_unchanged() -> Result<()> {
        let body = json!({"count": 0, "results": []});
        let transport = StubTransport::new(200, body.clone());
        let value = client(transport).request("/games", &Query::new()).await?;
        assert_eq!(value, body);
        Ok(())
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let transport = StubTransport::raw(200, "<html>oops</html>");
        let err = client(transport)
            .request("/games", &Query::new())
            .await
            .expect_err("html must not decode");
        assert!(matches!(err, CatalogError::Decode(_)));
    }

    #[tokio::test]
    async fn unexpected_shape_is_decode_error() {
        let transport = StubTransport::new(200, json!({"id": "not-a-number"}));
        let err = client(transport)
            .game_detail(7)
            .await
            .expect_err("string id must not decode");
        assert!(matches!(err, CatalogError::Decode(_)));
    }

    #[tokio::test]
    async fn null_counts_still_decode_listings() -> Result<()> {
        let transport = StubTransport::new(
            200,
            json!({"count": null, "next": null, "results": [{"id": 1, "name": "Ubisoft", "games_count": null}]}),
        );
        let page = client(transport)
            .publishers(None, PageRequest::default())
            .await?;
        assert_eq!(page.count, 0);
        assert_eq!(page.results[0].games_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn search_builds_expected_url() -> Result<()> {
        let transport = StubTransport::new(200, empty_page());
        let client = client(transport.clone());

        let page = client.search_games("mario", PageRequest::new(1, 24)).await?;
        assert!(page.results.is_empty());
        assert_eq!(
            transport.calls(),
            vec![format!("{BASE}/games?search=mario&page=1&page_size=24&key=test-key")]
        );

        client.search_games("elden ring", PageRequest::default()).await?;
        assert_eq!(
            transport.calls()[1],
            format!("{BASE}/games?search=elden+ring&page=1&page_size=20&key=test-key")
        );
        Ok(())
    }

    #[tokio::test]
    async fn publisher_games_builds_expected_url() -> Result<()> {
        let transport = StubTransport::new(200, empty_page());
        client(transport.clone())
            .publisher_games(42, PageRequest::new(2, 20))
            .await?;
        assert_eq!(
            transport.calls(),
            vec![format!("{BASE}/games?publishers=42&page=2&page_size=20&key=test-key")]
        );
        Ok(())
    }

    #[tokio::test]
    async fn listing_operations_build_expected_urls() -> Result<()> {
        let transport = StubTransport::new(200, empty_page());
        let client = client(transport.clone());

        client.popular_games(PageRequest::first(16)).await?;
        client.games_by_tag("open world", PageRequest::new(3, 20)).await?;
        client.games_by_genre("action", PageRequest::default()).await?;
        client.game_screenshots(3498, DEFAULT_SCREENSHOT_COUNT).await?;
        client.publishers(None, PageRequest::new(2, 20)).await?;
        client.publishers(Some("ubi"), PageRequest::default()).await?;

        assert_eq!(
            transport.calls(),
            vec![
                format!("{BASE}/games?ordering=-rating&page=1&page_size=16&key=test-key"),
                format!("{BASE}/games?tags=open+world&page=3&page_size=20&key=test-key"),
                format!("{BASE}/games?genres=action&page=1&page_size=20&key=test-key"),
                format!("{BASE}/games/3498/screenshots?page_size=12&key=test-key"),
                format!("{BASE}/publishers?page=2&page_size=20&key=test-key"),
                format!("{BASE}/publishers?search=ubi&page=1&page_size=20&key=test-key"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn detail_operations_append_key_only() -> Result<()> {
        let game = StubTransport::new(200, json!({"id": 3498, "name": "Grand Theft Auto V"}));
        let detail = client(game.clone()).game_detail(3498).await?;
        assert_eq!(detail.name, "Grand Theft Auto V");
        assert_eq!(game.calls(), vec![format!("{BASE}/games/3498?key=test-key")]);

        let genre = StubTransport::new(200, json!({"id": 4, "name": "Action", "slug": "action"}));
        let detail = client(genre.clone()).genre_detail(4).await?;
        assert_eq!(detail.slug, "action");
        assert_eq!(genre.calls(), vec![format!("{BASE}/genres/4?key=test-key")]);

        let publisher = StubTransport::new(
            200,
            json!({"id": 42, "name": "Nintendo", "games_count": 1200, "description": "<p>Kyoto</p>"}),
        );
        let detail = client(publisher.clone()).publisher_detail(42).await?;
        assert_eq!(detail.games_count, 1200);
        assert_eq!(detail.plain_description().as_deref(), Some("Kyoto"));
        assert_eq!(publisher.calls(), vec![format!("{BASE}/publishers/42?key=test-key")]);
        Ok(())
    }

    #[tokio::test]
    async fn trailing_slash_in_base_is_tolerated() -> Result<()> {
        let transport = StubTransport::new(200, empty_page());
        let client = CatalogClient::with_transport(
            format!("{BASE}/"),
            Some("k".to_string()),
            transport.clone(),
        );
        client.request("games", &Query::new()).await?;
        assert_eq!(transport.calls(), vec![format!("{BASE}/games?key=k")]);
        Ok(())
    }

    #[test]
    fn invalid_base_is_configuration_error() {
        let client = CatalogClient::with_transport(
            "not a url",
            Some("k".to_string()),
            StubTransport::new(200, empty_page()),
        );
        assert!(matches!(
            client.build_url("/games", &Query::new()),
            Err(CatalogError::Configuration(_))
        ));
    }
}
