use crate::result::SkipReason;
use url::Url;

/// Host identity used for scoping and for the mirror directory name:
/// the host, plus `:port` when the URL carries a non-default port.
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Crawl policy: depth ceiling, host scope, rejected suffixes and excluded prefixes.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    root_host: String,
    max_depth: usize,
    reject: Vec<String>,
    exclude: Vec<String>,
}

impl UrlFilter {
    pub fn new(root_host: impl Into<String>, max_depth: usize) -> Self {
        Self {
            root_host: root_host.into(),
            max_depth,
            reject: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_reject(mut self, suffixes: Vec<String>) -> Self {
        self.reject = suffixes
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn with_exclude(mut self, prefixes: Vec<String>) -> Self {
        self.exclude = prefixes
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    pub fn root_host(&self) -> &str {
        &self.root_host
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_root_host(&self, url: &Url) -> bool {
        host_key(url).is_some_and(|host| host == self.root_host)
    }

    /// Apply the rules in order and report the first one that prunes the URL.
    pub fn check(&self, url: &Url, depth: usize) -> Result<(), SkipReason> {
        if depth >= self.max_depth {
            return Err(SkipReason::Depth);
        }

        if !self.is_root_host(url) {
            return Err(SkipReason::OffHost);
        }

        let path = url.path();
        let lowered = path.to_lowercase();
        if let Some(ext) = self.reject.iter().find(|ext| lowered.ends_with(ext.as_str())) {
            return Err(SkipReason::Rejected(ext.clone()));
        }

        if let Some(prefix) = self.exclude.iter().find(|prefix| path.starts_with(prefix.as_str())) {
            return Err(SkipReason::Excluded(prefix.clone()));
        }

        Ok(())
    }

    pub fn allow(&self, url: &Url, depth: usize) -> bool {
        self.check(url, depth).is_ok()
    }
}
