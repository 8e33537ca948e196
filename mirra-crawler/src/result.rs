use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Why the filter chain pruned a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Discovered at or beyond the depth ceiling
    Depth,
    /// Host differs from the session's root host
    OffHost,
    /// Path ends with a rejected suffix
    Rejected(String),
    /// Path starts with an excluded prefix
    Excluded(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Depth => write!(f, "depth limit"),
            SkipReason::OffHost => write!(f, "off-host"),
            SkipReason::Rejected(ext) => write!(f, "reject rule ({})", ext),
            SkipReason::Excluded(prefix) => write!(f, "exclude path prefix ({})", prefix),
        }
    }
}

/// Terminal state of one crawl node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Filtered(SkipReason),
    /// Already claimed by another visit in this session
    Duplicate,
    Failed,
    /// Written to disk, body was not scanned for references
    Saved,
    /// Written to disk and scanned for child references
    Scanned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorResult {
    pub url: String,
    pub depth: usize,
    pub status: NodeStatus,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub response_time: Duration,
    pub local_path: Option<PathBuf>,
    pub links_found: usize,
    pub error: Option<String>,
}

impl MirrorResult {
    pub fn new(url: String, depth: usize, status: NodeStatus) -> Self {
        Self {
            url,
            depth,
            status,
            status_code: 0,
            content_type: None,
            content_length: None,
            response_time: Duration::from_secs(0),
            local_path: None,
            links_found: 0,
            error: None,
        }
    }

    pub fn with_error(url: String, depth: usize, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url, depth, NodeStatus::Failed)
        }
    }

    /// True once the body has been written to disk
    pub fn is_saved(&self) -> bool {
        matches!(self.status, NodeStatus::Saved | NodeStatus::Scanned)
    }
}

/// Counters for a finished (or cancelled) mirror session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorStats {
    pub saved: usize,
    pub failed: usize,
    pub filtered: usize,
    pub duplicates: usize,
    pub bytes_written: u64,
}

impl MirrorStats {
    pub fn record(&mut self, result: &MirrorResult) {
        match result.status {
            NodeStatus::Filtered(_) => self.filtered += 1,
            NodeStatus::Duplicate => self.duplicates += 1,
            NodeStatus::Failed => self.failed += 1,
            NodeStatus::Saved | NodeStatus::Scanned => {
                self.saved += 1;
                self.bytes_written += result.content_length.unwrap_or(0);
            }
        }
    }
}

/// Everything a finished mirror session produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSummary {
    pub root: String,
    pub results: Vec<MirrorResult>,
    pub stats: MirrorStats,
    pub cancelled: bool,
}

impl MirrorSummary {
    /// Result for the seed URL (the only node at depth 0)
    pub fn seed_result(&self) -> Option<&MirrorResult> {
        self.results.iter().find(|r| r.depth == 0)
    }
}
