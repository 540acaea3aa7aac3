mod m3u;
mod source;

pub use m3u::{parse, ParseError};
pub use source::{normalize, PlaylistInput};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-item HTTP overrides taken from `#EXTVLCOPT` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOptions {
    #[serde(default)]
    pub referrer: String,
    #[serde(default, rename = "user-agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tvg {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub url: String,
}

/// A single playlist entry: a stream URL plus the metadata it was declared with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub url: String,
    #[serde(default)]
    pub http: HttpOptions,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tvg: Tvg,
    #[serde(default)]
    pub group_title: String,
    /// Source lines of the entry, newline separated. Empty for items built in code.
    #[serde(default)]
    pub raw: String,
}

impl PlaylistItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.http.referrer = referrer.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http.user_agent = user_agent.into();
        self
    }

    /// Text of this entry as it should appear in an M3U file.
    pub fn to_m3u_entry(&self) -> String {
        if !self.raw.is_empty() {
            return self.raw.clone();
        }
        let mut out = format!("#EXTINF:-1,{}\n", self.name);
        if !self.http.referrer.is_empty() {
            out.push_str(&format!("#EXTVLCOPT:http-referrer={}\n", self.http.referrer));
        }
        if !self.http.user_agent.is_empty() {
            out.push_str(&format!("#EXTVLCOPT:http-user-agent={}\n", self.http.user_agent));
        }
        out.push_str(&self.url);
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistHeader {
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub header: PlaylistHeader,
    pub items: Vec<PlaylistItem>,
}

impl Playlist {
    pub fn new(items: Vec<PlaylistItem>) -> Self {
        Self {
            header: PlaylistHeader::default(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Render the header followed by the given entries as M3U text.
    pub fn render<'a>(&self, items: impl IntoIterator<Item = &'a PlaylistItem>) -> String {
        let mut out = if self.header.raw.is_empty() {
            "#EXTM3U".to_string()
        } else {
            self.header.raw.clone()
        };
        out.push('\n');
        for item in items {
            out.push_str(&item.to_m3u_entry());
            out.push('\n');
        }
        out
    }
}
