//! Download API client: fetches a media document from a third-party API
//! and hands it to the extractor.
//!
//! Features:
//! - Bounded request timeout (see `config::network`)
//! - 4xx bodies are still decoded: many providers report errors as JSON
//! - 5xx and transport failures surface as errors, never retried here

use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::download::extractor::{download_link, extract_download_url, extract_media, ExtractionResult, MediaDocument};
use crate::download::platform::Platform;

pub struct MediaApiClient {
    client: Client,
}

impl MediaApiClient {
    pub fn new() -> AppResult<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; hybridbot/0.1)")
            .timeout(config::network::download_api_timeout())
            .build()?;
        Ok(Self { client })
    }

    /// Uses a caller-supplied client (shared pools, tests).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// GETs `api_url` and decodes the body as a media document.
    ///
    /// A body that is not JSON decodes to `Value::Null`, which the extractor
    /// treats as "nothing found".
    pub async fn fetch_document(&self, api_url: &Url) -> AppResult<MediaDocument> {
        let response = self.client.get(api_url.clone()).send().await?;
        let status = response.status();
        if status.is_server_error() {
            log::warn!("Download API {} returned {}", api_url.host_str().unwrap_or("?"), status);
            return Err(AppError::HttpStatus(status));
        }

        let body = response.text().await?;
        match serde_json::from_str::<Value>(&body) {
            Ok(document) => {
                log::debug!("Download API responded {} with {} bytes", status, body.len());
                Ok(document)
            }
            Err(e) => {
                log::warn!("Download API returned non-JSON body ({}): {}", status, e);
                Ok(Value::Null)
            }
        }
    }

    /// Fetches and extracts all media URLs. An empty extraction is `NotFound`.
    pub async fn resolve_media(&self, api_url: &Url) -> AppResult<ExtractionResult> {
        let document = self.fetch_document(api_url).await?;
        let media = extract_media(&document);
        log::info!(
            "Extracted {} video(s), {} audio(s) from download API response",
            media.videos.len(),
            media.audios.len()
        );
        if media.is_empty() {
            return Err(AppError::NotFound("no video or audio found in the response".to_string()));
        }
        Ok(media)
    }

    /// Fetches and resolves the single download link of a pass-through endpoint.
    pub async fn resolve_download_url(&self, api_url: &Url) -> AppResult<String> {
        let document = self.fetch_document(api_url).await?;
        let resolved = extract_download_url(&document);
        download_link(&resolved).ok_or_else(|| {
            log::debug!("No download link, API answered: {}", resolved);
            AppError::NotFound("no download link in the response".to_string())
        })
    }

    /// Detects the platform of a user-supplied `link`, queries its endpoint
    /// under `base` and extracts the media. Unsupported links are rejected
    /// before any request is made.
    pub async fn resolve_link(
        &self,
        base: &str,
        api_key: Option<&str>,
        link: &str,
    ) -> AppResult<(Platform, ExtractionResult)> {
        let platform = Platform::detect(link).ok_or_else(|| {
            AppError::Validation(format!("Unsupported platform. Supported: {}", Platform::supported_list()))
        })?;
        let api_url = platform_api_url(platform, base, api_key, link)?;
        log::info!("Resolving {} link via /{}", platform, platform.api_endpoint());
        let media = self.resolve_media(&api_url).await?;
        Ok((platform, media))
    }
}

/// Endpoint URL for `platform`: `base/<endpoint>?apikey=..&url=..` plus the
/// platform's extra parameters.
pub fn platform_api_url(platform: Platform, base: &str, api_key: Option<&str>, target: &str) -> AppResult<Url> {
    let endpoint = format!("{}/{}", base.trim_end_matches('/'), platform.api_endpoint());
    let mut url = build_api_url(&endpoint, api_key, target)?;
    url.query_pairs_mut().extend_pairs(platform.api_params());
    Ok(url)
}

/// Builds `base?apikey=..&url=..` with the target link URL-encoded.
pub fn build_api_url(base: &str, api_key: Option<&str>, target: &str) -> AppResult<Url> {
    let mut url = Url::parse(base)?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(key) = api_key {
            query.append_pair("apikey", key);
        }
        query.append_pair("url", target);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer, route: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
    }

    #[test]
    fn test_build_api_url_encodes_target() {
        let url = build_api_url("https://api.example/dl/tiktok", Some("k"), "https://vm.tiktok.com/a?b=c&d").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("apikey".to_string(), "k".to_string()),
                ("url".to_string(), "https://vm.tiktok.com/a?b=c&d".to_string())
            ]
        );
    }

    #[test]
    fn test_build_api_url_rejects_bad_base() {
        assert!(matches!(build_api_url("::not a url", None, "x"), Err(AppError::Url(_))));
    }

    #[tokio::test]
    async fn test_resolve_media_from_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dl"))
            .and(query_param("url", "https://x.com/a/status/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "result": {"media": [{"video_url": "https://v.example/a.mp4"}]}
            })))
            .mount(&server)
            .await;

        let client = MediaApiClient::new().unwrap();
        let url = build_api_url(&format!("{}/dl", server.uri()), None, "https://x.com/a/status/1").unwrap();
        let media = client.resolve_media(&url).await.unwrap();
        assert_eq!(media.videos, vec!["https://v.example/a.mp4"]);
    }

    #[tokio::test]
    async fn test_client_error_body_is_still_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dl"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
            .mount(&server)
            .await;

        let client = MediaApiClient::new().unwrap();
        let doc = client.fetch_document(&api(&server, "/dl")).await.unwrap();
        assert_eq!(doc, json!({"error": "not found"}));

        let err = client.resolve_media(&api(&server, "/dl")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = MediaApiClient::new().unwrap();
        let err = client.fetch_document(&api(&server, "/dl")).await.unwrap_err();
        assert!(matches!(err, AppError::HttpStatus(s) if s.as_u16() == 503));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_non_json_body_is_null_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let client = MediaApiClient::new().unwrap();
        assert_eq!(client.fetch_document(&api(&server, "/dl")).await.unwrap(), Value::Null);
    }

    #[test]
    fn test_platform_api_url_adds_endpoint_and_params() {
        let url = platform_api_url(Platform::TikTok, "https://api.example/dl/", Some("k"), "https://vm.tiktok.com/a").unwrap();
        assert_eq!(url.path(), "/dl/tiktok");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs.last(), Some(&("noWatermark".to_string(), "true".to_string())));
    }

    #[tokio::test]
    async fn test_resolve_link_queries_platform_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/download/instadl"))
            .and(query_param("apikey", "k"))
            .and(query_param("url", "https://www.instagram.com/reel/xyz/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{"download_url": "https://ig.example/p/1.mp4"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MediaApiClient::new().unwrap();
        let base = format!("{}/api/download", server.uri());
        let (platform, media) = client
            .resolve_link(&base, Some("k"), "https://www.instagram.com/reel/xyz/")
            .await
            .unwrap();
        assert_eq!(platform, Platform::Instagram);
        assert_eq!(media.videos, vec!["https://ig.example/p/1.mp4"]);
    }

    #[tokio::test]
    async fn test_resolve_link_rejects_unsupported_platform() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = MediaApiClient::new().unwrap();
        let err = client
            .resolve_link(&server.uri(), None, "https://example.com/video")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("TikTok")));
    }

    #[tokio::test]
    async fn test_resolve_download_url_without_link_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": false, "message": "quota"})))
            .mount(&server)
            .await;

        let client = MediaApiClient::new().unwrap();
        let err = client.resolve_download_url(&api(&server, "/ytmp3")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_download_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ytmp3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": {"download_url": "https://cdn.example/s.mp3"}})),
            )
            .mount(&server)
            .await;

        let client = MediaApiClient::new().unwrap();
        let link = client.resolve_download_url(&api(&server, "/ytmp3")).await.unwrap();
        assert_eq!(link, "https://cdn.example/s.mp3");
    }
}
