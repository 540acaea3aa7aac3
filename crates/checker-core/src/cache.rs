use dashmap::DashSet;

use crate::playlist::PlaylistItem;

/// Deterministic cache key for a URL: lowercase hex of its bytes.
pub fn fingerprint(url: &str) -> String {
    hex::encode(url.as_bytes())
}

/// Set of URLs already checked during a run. Grows monotonically, never evicts.
#[derive(Debug, Default)]
pub struct UrlCache {
    seen: DashSet<String>,
}

impl UrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, item: &PlaylistItem) {
        self.seen.insert(fingerprint(&item.url));
    }

    pub fn contains(&self, item: &PlaylistItem) -> bool {
        self.seen.contains(&fingerprint(&item.url))
    }

    /// Insert the item's URL, returning `true` only for the call that inserted it.
    pub fn claim(&self, item: &PlaylistItem) -> bool {
        self.seen.insert(fingerprint(&item.url))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
