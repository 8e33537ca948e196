use indicatif::{ProgressBar, ProgressStyle};
use mirra_crawler::{
    CancellationToken, EventCallback, Mirror, MirrorEvent, MirrorSummary, NodeStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

pub const DEFAULT_MAX_DEPTH: usize = mirra_crawler::crawler::DEFAULT_MAX_DEPTH;
pub const DEFAULT_WORKERS: usize = mirra_crawler::crawler::DEFAULT_WORKERS;
pub const DEFAULT_TIMEOUT_SECS: u64 = mirra_crawler::crawler::DEFAULT_TIMEOUT_SECS;

/// Options for configuring a mirror session
pub struct MirrorOptions {
    pub url: String,
    pub base_dir: PathBuf,
    pub max_depth: usize,
    pub workers: usize,
    pub timeout_secs: u64,
    pub reject: Vec<String>,
    pub exclude: Vec<String>,
    pub convert_links: bool,
    pub show_progress_bars: bool,
}

impl MirrorOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            base_dir: PathBuf::from("."),
            max_depth: DEFAULT_MAX_DEPTH,
            workers: DEFAULT_WORKERS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            reject: Vec::new(),
            exclude: Vec::new(),
            convert_links: false,
            show_progress_bars: false,
        }
    }
}

/// Split a comma-separated option value, trimming entries and dropping empty ones
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Run one mirror session with the given options.
///
/// `event_callback` receives every engine event; when the spinner is shown the
/// callback runs with the spinner suspended so its output is not torn.
/// Returns an error only when the session could not be set up.
pub async fn execute_mirror(
    options: MirrorOptions,
    event_callback: Option<EventCallback>,
    cancel: CancellationToken,
) -> Result<MirrorSummary, String> {
    let MirrorOptions {
        url,
        base_dir,
        max_depth,
        workers,
        timeout_secs,
        reject,
        exclude,
        convert_links,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| format!("Invalid progress template: {}", e))?,
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        pb.set_message(format!("Mirroring {}...", url));
        Some(pb)
    } else {
        None
    };

    let saved_count = Arc::new(AtomicUsize::new(0));
    let count_clone = saved_count.clone();
    let pb_clone = progress_bar.clone();
    let callback: EventCallback = Arc::new(move |event: &MirrorEvent| {
        if let MirrorEvent::Saved { .. } = event {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!("Mirroring... {} files saved", count));
            }
        }

        if let Some(ref cb) = event_callback {
            match pb_clone {
                Some(ref pb) => pb.suspend(|| cb(event)),
                None => cb(event),
            }
        }
    });

    let mirror = Mirror::with_timeout(&url, timeout_secs)
        .map_err(|e| format!("Failed to start mirror of {}: {}", url, e))?
        .with_base_dir(base_dir)
        .with_max_depth(max_depth)
        .with_workers(workers)
        .with_reject(reject)
        .with_exclude(exclude)
        .with_convert_links(convert_links)
        .with_event_callback(callback)
        .with_cancellation(cancel);

    let summary = mirror
        .run()
        .await
        .map_err(|e| format!("Mirror of {} failed: {}", url, e))?;

    if let Some(ref pb) = progress_bar {
        let total = saved_count.load(Ordering::Relaxed);
        if summary.cancelled {
            pb.abandon_with_message(format!("Mirror cancelled after {} files", total));
        } else {
            pb.finish_with_message(format!("Mirror complete! {} files saved", total));
        }
    }

    Ok(summary)
}

/// True when the seed URL itself could not be mirrored
pub fn seed_failed(summary: &MirrorSummary) -> bool {
    summary
        .seed_result()
        .is_none_or(|seed| seed.status == NodeStatus::Failed)
}
