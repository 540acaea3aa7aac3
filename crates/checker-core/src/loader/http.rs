use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use super::{PlaylistLoader, SourceError};

/// HTTP playlist loader. One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Self::build_client(timeout)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &crate::config::CheckerConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.fetch_timeout)
    }

    /// Every request made by the returned client is bounded by `timeout`.
    pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
        Client::builder().timeout(timeout).gzip(true).build()
    }
}

/// True when the content type belongs to the M3U (`mpegurl`) MIME family.
pub(crate) fn is_playlist_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("mpegurl")
}

#[async_trait]
impl PlaylistLoader for HttpLoader {
    async fn load(&self, url: &str) -> Result<String, SourceError> {
        debug!(url, "Fetching playlist");

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, timeout = e.is_timeout(), "Playlist fetch failed");
                return Err(SourceError::Fetch);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Playlist fetch returned error status");
            return Err(SourceError::Fetch);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_playlist_content_type(&content_type) {
            warn!(url, content_type = %content_type, "Response is not an M3U playlist");
            return Err(SourceError::NotPlaylist);
        }

        response.text().await.map_err(|e| {
            warn!(url, error = %e, "Failed to read playlist body");
            SourceError::Fetch
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = "#EXTM3U\n#EXTINF:-1,A\nhttp://x/a.m3u8\n";

    #[test]
    fn content_type_family() {
        assert!(is_playlist_content_type("application/x-mpegurl"));
        assert!(is_playlist_content_type("application/vnd.apple.mpegURL; charset=utf-8"));
        assert!(is_playlist_content_type("audio/mpegurl"));
        assert!(!is_playlist_content_type("text/html"));
        assert!(!is_playlist_content_type(""));
    }

    #[tokio::test]
    async fn load_returns_body_for_mpegurl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.m3u"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(BODY, "application/x-mpegurl"),
            )
            .mount(&server)
            .await;

        let loader = HttpLoader::new(Duration::from_secs(5)).unwrap();
        let body = loader
            .load(&format!("{}/list.m3u", server.uri()))
            .await
            .unwrap();
        assert!(body.contains("#EXTM3U"));
    }

    #[tokio::test]
    async fn load_rejects_other_content_types() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let loader = HttpLoader::new(Duration::from_secs(5)).unwrap();
        let err = loader
            .load(&format!("{}/page.html", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotPlaylist));
        assert_eq!(err.to_string(), "URL is not an .m3u playlist file");
    }

    #[tokio::test]
    async fn load_hides_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.m3u"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = HttpLoader::new(Duration::from_secs(5)).unwrap();
        let err = loader
            .load(&format!("{}/missing.m3u", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Fetch));
        assert_eq!(err.to_string(), "Error fetching playlist");
    }

    #[tokio::test]
    async fn load_maps_timeout_to_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.m3u"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(BODY, "application/x-mpegurl")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let loader = HttpLoader::new(Duration::from_millis(50)).unwrap();
        let err = loader
            .load(&format!("{}/slow.m3u", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Fetch));
    }

    #[tokio::test]
    async fn from_config_applies_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.m3u"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(BODY, "application/x-mpegurl")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = crate::config::CheckerConfig::default().with_fetch_timeout(50);
        let loader = HttpLoader::from_config(&config).unwrap();
        let started = std::time::Instant::now();
        let err = loader
            .load(&format!("{}/slow.m3u", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Fetch));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
