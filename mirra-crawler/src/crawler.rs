use crate::error::{MirrorError, Result};
use crate::event::{EventCallback, MirrorEvent};
use crate::extract::extract_links;
use crate::fetcher::{FetchedPage, Fetcher};
use crate::filter::{UrlFilter, host_key};
use crate::paths::PathMapper;
use crate::registry::VisitedRegistry;
use crate::result::{MirrorResult, MirrorStats, MirrorSummary, NodeStatus, SkipReason};
use crate::rewrite::LinkRewriter;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_DEPTH: usize = 1000;
pub const DEFAULT_WORKERS: usize = 10;

/// Outcome of one visit: the node's record plus the child URLs its body referenced
#[derive(Debug)]
pub struct Visit {
    pub result: MirrorResult,
    pub children: Vec<Url>,
}

impl Visit {
    fn leaf(result: MirrorResult) -> Self {
        Self {
            result,
            children: Vec::new(),
        }
    }
}

/// One mirror session rooted at a single URL.
///
/// The session owns the visited registry, so every URL is fetched at most once
/// per session no matter how many pages reference it.
#[derive(Clone)]
pub struct Mirror {
    root: Url,
    fetcher: Fetcher,
    filter: UrlFilter,
    mapper: PathMapper,
    registry: Arc<VisitedRegistry>,
    convert_links: bool,
    workers: usize,
    event_callback: Option<EventCallback>,
    cancel: CancellationToken,
}

impl Mirror {
    pub fn new(root_url: &str) -> Result<Self> {
        Self::with_timeout(root_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(root_url: &str, timeout_secs: u64) -> Result<Self> {
        let root = Url::parse(root_url)
            .map_err(|e| MirrorError::InvalidUrl(format!("Invalid URL: {}", e)))?;
        if !matches!(root.scheme(), "http" | "https") {
            return Err(MirrorError::InvalidUrl(format!("Unsupported scheme: {}", root.scheme())));
        }
        let root_host = host_key(&root)
            .ok_or_else(|| MirrorError::InvalidUrl(format!("{} has no host", root)))?;

        Ok(Self {
            fetcher: Fetcher::new(&root_host, timeout_secs)?,
            filter: UrlFilter::new(root_host, DEFAULT_MAX_DEPTH),
            mapper: PathMapper::new("."),
            registry: Arc::new(VisitedRegistry::new()),
            convert_links: false,
            workers: DEFAULT_WORKERS,
            event_callback: None,
            cancel: CancellationToken::new(),
            root,
        })
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.mapper = PathMapper::new(base_dir);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.filter = self.filter.with_max_depth(depth);
        self
    }

    pub fn with_reject(mut self, suffixes: Vec<String>) -> Self {
        self.filter = self.filter.with_reject(suffixes);
        self
    }

    pub fn with_exclude(mut self, prefixes: Vec<String>) -> Self {
        self.filter = self.filter.with_exclude(prefixes);
        self
    }

    pub fn with_convert_links(mut self, convert_links: bool) -> Self {
        self.convert_links = convert_links;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn root_host(&self) -> &str {
        self.filter.root_host()
    }

    pub fn base_dir(&self) -> &Path {
        self.mapper.base_dir()
    }

    pub async fn get_visited_count(&self) -> usize {
        self.registry.len().await
    }

    /// Mirror the whole site reachable from the root URL.
    ///
    /// A single coordinator owns the frontier; at most `workers` visits are in
    /// flight at once. Children are enqueued only after their parent's visit
    /// finished. Returns once the frontier is empty and nothing is in flight,
    /// or once the cancellation token fired and in-flight visits drained.
    pub async fn run(&self) -> Result<MirrorSummary> {
        info!("Starting mirror of {} with {} workers", self.root, self.workers);
        self.emit(MirrorEvent::Started {
            url: self.root.to_string(),
        });

        let this = Arc::new(self.clone());
        let mut frontier: VecDeque<(Url, usize)> = VecDeque::from([(self.root.clone(), 0)]);
        let mut in_flight: JoinSet<Visit> = JoinSet::new();
        let mut results = Vec::new();
        let mut stats = MirrorStats::default();

        loop {
            while in_flight.len() < self.workers && !self.cancel.is_cancelled() {
                let Some((url, depth)) = frontier.pop_front() else {
                    break;
                };
                let this = this.clone();
                in_flight.spawn(async move { this.visit(&url, depth).await });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            let visit = match joined {
                Ok(visit) => visit,
                Err(e) => {
                    warn!("Visit task failed: {}", e);
                    stats.failed += 1;
                    continue;
                }
            };

            stats.record(&visit.result);
            let child_depth = visit.result.depth + 1;
            for child in visit.children {
                match self.filter.check(&child, child_depth) {
                    Ok(()) => {
                        if !self.registry.contains(&child).await {
                            frontier.push_back((child, child_depth));
                        }
                    }
                    Err(reason) => {
                        stats.filtered += 1;
                        self.log_skip(&child, &reason);
                    }
                }
            }

            if !matches!(visit.result.status, NodeStatus::Filtered(_) | NodeStatus::Duplicate) {
                results.push(visit.result);
            }
        }

        let cancelled = self.cancel.is_cancelled();
        if cancelled {
            warn!("Mirror of {} cancelled with {} URLs still queued", self.root, frontier.len());
        }
        info!(
            "Mirror complete. Saved {} files, {} failed",
            stats.saved, stats.failed
        );
        self.emit(MirrorEvent::Finished {
            url: self.root.to_string(),
        });

        Ok(MirrorSummary {
            root: self.root.to_string(),
            results,
            stats,
            cancelled,
        })
    }

    /// Process one crawl node: filter, claim, fetch, store, convert, scan.
    ///
    /// Failures end only this node; they are reported in the returned record.
    pub async fn visit(&self, url: &Url, depth: usize) -> Visit {
        if let Err(reason) = self.filter.check(url, depth) {
            self.log_skip(url, &reason);
            return Visit::leaf(MirrorResult::new(url.to_string(), depth, NodeStatus::Filtered(reason)));
        }

        if !self.registry.claim(url).await {
            debug!("Already claimed: {}", url);
            return Visit::leaf(MirrorResult::new(url.to_string(), depth, NodeStatus::Duplicate));
        }

        match self.process(url, depth).await {
            Ok(visit) => visit,
            Err(e) => {
                warn!("Mirror error for {}: {}", url, e);
                self.emit(MirrorEvent::Failed {
                    url: url.to_string(),
                    error: e.to_string(),
                });
                let mut result = MirrorResult::with_error(url.to_string(), depth, e.to_string());
                if let MirrorError::Status { status, .. } = e {
                    result.status_code = status;
                }
                Visit::leaf(result)
            }
        }
    }

    async fn process(&self, url: &Url, depth: usize) -> Result<Visit> {
        if self.cancel.is_cancelled() {
            return Err(MirrorError::Cancelled);
        }
        let page = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(MirrorError::Cancelled),
            page = self.fetcher.fetch(url) => page?,
        };

        self.emit(MirrorEvent::Response {
            url: url.to_string(),
            status: page.status_code,
        });
        self.emit(MirrorEvent::Size {
            url: url.to_string(),
            bytes: page.body.len() as u64,
        });

        let local_path = self.mapper.local_path(url, &page.content_type)?;
        self.store(&local_path, &page.body).await?;
        self.emit(MirrorEvent::Saved {
            url: url.to_string(),
            path: local_path.clone(),
        });

        if self.convert_links && (page.is_html() || page.is_css()) {
            self.convert(&page, &local_path).await;
        }

        let mut result = MirrorResult::new(url.to_string(), depth, NodeStatus::Saved);
        result.status_code = page.status_code;
        result.content_type = Some(page.content_type.clone()).filter(|ct| !ct.is_empty());
        result.content_length = Some(page.body.len() as u64);
        result.response_time = page.response_time;
        result.local_path = Some(local_path);

        let mut children = Vec::new();
        if page.is_html() || page.is_css() {
            // Scan the body as served, not the converted copy
            let body = String::from_utf8_lossy(&page.body);
            children.extend(extract_links(&body, &page.content_type, &page.url));
            result.status = NodeStatus::Scanned;
            result.links_found = children.len();
            debug!("{} references {} resources", url, children.len());
        }

        Ok(Visit { result, children })
    }

    async fn store(&self, local_path: &Path, body: &[u8]) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(MirrorError::Cancelled);
        }
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, body).await?;
        Ok(())
    }

    /// Overwrite the saved copy with offline-converted links. A failure here
    /// keeps the unconverted file.
    async fn convert(&self, page: &FetchedPage, local_path: &Path) {
        let Ok(text) = std::str::from_utf8(&page.body) else {
            info!("{} is not UTF-8, leaving links unconverted", page.url);
            self.emit(MirrorEvent::Unconverted {
                url: page.url.to_string(),
                reason: "body is not UTF-8".to_string(),
            });
            return;
        };

        let rewriter = LinkRewriter::new(&self.mapper, self.filter.root_host());
        let converted = if page.is_html() {
            rewriter.rewrite_html(text, &page.url, local_path)
        } else {
            rewriter.rewrite_css(text, &page.url, local_path)
        };

        if converted == text {
            return;
        }
        if let Err(e) = self.store(local_path, converted.as_bytes()).await {
            warn!("Failed to write converted file {}: {}", local_path.display(), e);
            self.emit(MirrorEvent::Failed {
                url: page.url.to_string(),
                error: format!("link conversion: {}", e),
            });
        }
    }

    fn log_skip(&self, url: &Url, reason: &SkipReason) {
        match reason {
            SkipReason::Rejected(_) | SkipReason::Excluded(_) => {
                info!("Skipping {} due to {}", url, reason);
                self.emit(MirrorEvent::Skipped {
                    url: url.to_string(),
                    reason: reason.clone(),
                });
            }
            SkipReason::Depth | SkipReason::OffHost => debug!("Skipping {} ({})", url, reason),
        }
    }

    fn emit(&self, event: MirrorEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(&event);
        }
    }
}
