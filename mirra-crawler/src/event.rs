use crate::result::SkipReason;
use std::path::PathBuf;
use std::sync::Arc;

/// Discrete notifications emitted while a mirror runs.
///
/// The engine never formats these; a sink (terminal, log file, progress bar)
/// renders them.
#[derive(Debug, Clone)]
pub enum MirrorEvent {
    Started { url: String },
    Response { url: String, status: u16 },
    Size { url: String, bytes: u64 },
    Saved { url: String, path: PathBuf },
    Skipped { url: String, reason: SkipReason },
    /// Saved page whose links were left pointing at the remote site
    Unconverted { url: String, reason: String },
    Failed { url: String, error: String },
    Finished { url: String },
}

pub type EventCallback = Arc<dyn Fn(&MirrorEvent) + Send + Sync>;
