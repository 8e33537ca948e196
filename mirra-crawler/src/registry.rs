use std::collections::HashSet;
use tokio::sync::RwLock;
use url::Url;

/// Session-wide set of URLs already claimed for fetching.
///
/// Entries are never removed, so a URL can be claimed at most once per session.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    visited: RwLock<HashSet<String>>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized registry key: the serialized URL without its fragment
    pub fn key(url: &Url) -> String {
        let mut url = url.clone();
        url.set_fragment(None);
        url.to_string()
    }

    /// Record `url` and return true, or return false if it was already claimed.
    /// The membership check and the insert happen under one write lock.
    pub async fn claim(&self, url: &Url) -> bool {
        let key = Self::key(url);
        let mut visited = self.visited.write().await;
        visited.insert(key)
    }

    pub async fn contains(&self, url: &Url) -> bool {
        self.visited.read().await.contains(&Self::key(url))
    }

    pub async fn len(&self) -> usize {
        self.visited.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.visited.read().await.is_empty()
    }
}
