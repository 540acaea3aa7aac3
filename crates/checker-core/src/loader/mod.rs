mod http;

pub use http::HttpLoader;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::playlist::ParseError;

/// Reasons a playlist source could not be turned into a [`crate::Playlist`].
///
/// Remote failures deliberately carry no transport detail.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("URL is not an .m3u playlist file")]
    NotPlaylist,
    #[error("Error fetching playlist")]
    Fetch,
    #[error("Failed to read playlist file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Playlist is not valid UTF-8")]
    Decode(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Trait for fetching remote playlist text.
///
/// Implementations perform the request and validate that the response is an
/// M3U playlist. The trait is object-safe and Send + Sync for use across async tasks.
#[async_trait]
pub trait PlaylistLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<String, SourceError>;
}
