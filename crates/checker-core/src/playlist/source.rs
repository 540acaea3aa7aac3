use std::path::Path;

use tracing::debug;
use url::Url;

use super::{parse, Playlist};
use crate::loader::{PlaylistLoader, SourceError};

/// Everything a caller may hand to [`normalize`].
#[derive(Debug, Clone)]
pub enum PlaylistInput {
    /// An already-parsed playlist, returned unchanged.
    Parsed(Playlist),
    /// UTF-8 encoded playlist text.
    Bytes(Vec<u8>),
    /// An http(s) URL, a filesystem path, or raw playlist text, tried in that order.
    Source(String),
}

impl From<Playlist> for PlaylistInput {
    fn from(p: Playlist) -> Self {
        Self::Parsed(p)
    }
}

impl From<Vec<u8>> for PlaylistInput {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<String> for PlaylistInput {
    fn from(s: String) -> Self {
        Self::Source(s)
    }
}

impl From<&str> for PlaylistInput {
    fn from(s: &str) -> Self {
        Self::Source(s.to_string())
    }
}

fn is_web_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// Resolve any supported input into a parsed playlist.
pub async fn normalize(
    input: PlaylistInput,
    loader: &dyn PlaylistLoader,
) -> Result<Playlist, SourceError> {
    let text = match input {
        PlaylistInput::Parsed(playlist) => return Ok(playlist),
        PlaylistInput::Bytes(bytes) => String::from_utf8(bytes)?,
        PlaylistInput::Source(s) if is_web_url(&s) => loader.load(&s).await?,
        PlaylistInput::Source(s) => {
            let path = Path::new(&s);
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                debug!(path = %path.display(), "Reading playlist file");
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SourceError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?
            } else {
                s
            }
        }
    };

    Ok(parse(&text)?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::playlist::PlaylistItem;

    const TEXT: &str = "#EXTM3U\n#EXTINF:-1,A\nhttp://x/a.m3u8\n";

    #[derive(Default)]
    struct CountingLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PlaylistLoader for CountingLoader {
        async fn load(&self, _url: &str) -> Result<String, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TEXT.to_string())
        }
    }

    struct FailingLoader;

    #[async_trait]
    impl PlaylistLoader for FailingLoader {
        async fn load(&self, _url: &str) -> Result<String, SourceError> {
            Err(SourceError::NotPlaylist)
        }
    }

    #[test]
    fn web_url_detection() {
        assert!(is_web_url("http://example.com/list.m3u"));
        assert!(is_web_url("https://example.com/"));
        assert!(!is_web_url("ftp://example.com/list.m3u"));
        assert!(!is_web_url("/tmp/list.m3u"));
        assert!(!is_web_url("#EXTM3U"));
    }

    #[tokio::test]
    async fn parsed_input_is_returned_unchanged() {
        let playlist = Playlist::new(vec![PlaylistItem::new("http://x/a.m3u8")]);
        let loader = CountingLoader::default();
        let out = normalize(playlist.clone().into(), &loader).await.unwrap();
        assert_eq!(out, playlist);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bytes_are_decoded() {
        let loader = CountingLoader::default();
        let out = normalize(TEXT.as_bytes().to_vec().into(), &loader).await.unwrap();
        assert_eq!(out.items[0].url, "http://x/a.m3u8");
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_source_error() {
        let loader = CountingLoader::default();
        let err = normalize(vec![0xffu8, 0xfe, 0xfd].into(), &loader).await.unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[tokio::test]
    async fn urls_go_through_the_loader() {
        let loader = CountingLoader::default();
        let out = normalize("http://example.com/list.m3u".into(), &loader).await.unwrap();
        assert_eq!(out.items.len(), 1);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn loader_errors_propagate() {
        let err = normalize("https://example.com/index.html".into(), &FailingLoader)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "URL is not an .m3u playlist file");
    }

    #[tokio::test]
    async fn existing_path_is_read() {
        let path = std::env::temp_dir().join(format!("normalize-{}.m3u", std::process::id()));
        tokio::fs::write(&path, TEXT).await.unwrap();

        let loader = CountingLoader::default();
        let out = normalize(path.to_string_lossy().into_owned().into(), &loader).await;
        tokio::fs::remove_file(&path).await.ok();

        let out = out.unwrap();
        assert_eq!(out.items[0].name, "A");
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn other_strings_are_raw_text() {
        let loader = CountingLoader::default();
        let out = normalize(TEXT.into(), &loader).await.unwrap();
        assert_eq!(out.items.len(), 1);
    }

    #[tokio::test]
    async fn unparseable_text_is_a_source_error() {
        let loader = CountingLoader::default();
        let err = normalize("not a playlist".into(), &loader).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
