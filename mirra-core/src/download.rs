// Plain single-file downloads (the `get` command)

use crate::log::{LogSink, status_text};
use anyhow::{Context, Result, anyhow, bail};
use futures::StreamExt;
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use mirra_crawler::fetcher::USER_AGENT;
use mirra_crawler::host_key;
use mirra_crawler::paths::{INDEX_FILE, normalize_segments};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

pub struct DownloadOptions {
    pub urls: Vec<String>,
    /// `-O`: file name inside `dir`, only valid for a single URL
    pub output_name: Option<String>,
    pub dir: PathBuf,
    /// Bytes per second
    pub rate_limit: Option<u64>,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub url: String,
    pub path: Option<PathBuf>,
    pub bytes: u64,
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Parse `--limit-rate` values such as `512`, `200k` or `2M` into bytes per second.
pub fn parse_rate_limit(value: &str) -> Result<u64> {
    let value = value.trim();
    let (number, multiplier) = match value.chars().last() {
        Some('k' | 'K') => (&value[..value.len() - 1], 1024.0),
        Some('m' | 'M') => (&value[..value.len() - 1], 1024.0 * 1024.0),
        _ => (value, 1.0),
    };

    let number: f64 = number
        .trim()
        .parse()
        .with_context(|| format!("invalid rate limit: {:?}", value))?;
    if !number.is_finite() || number <= 0.0 {
        bail!("rate limit must be positive: {:?}", value);
    }

    Ok(((number * multiplier) as u64).max(1))
}

/// Destination for a download: `dir/<name>` with `-O`, otherwise the same
/// `dir/<host>/<path>` tree a mirror would produce (no extension inference).
pub fn output_path(url: &Url, dir: &Path, output_name: Option<&str>) -> Result<PathBuf> {
    if let Some(name) = output_name {
        return Ok(dir.join(name));
    }

    let host = host_key(url).ok_or_else(|| anyhow!("{} has no host", url))?;
    let mut segments = normalize_segments(url.path());
    if segments.is_empty() || url.path().ends_with('/') {
        segments.push(INDEX_FILE.to_string());
    }

    let mut path = dir.join(host);
    for segment in segments {
        path.push(segment);
    }
    Ok(path)
}

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

/// Stream `url` to `path`, sleeping after each chunk to honor `rate_limit`.
/// Returns the number of bytes written.
pub async fn download_file(
    client: &Client,
    url: &Url,
    path: &Path,
    rate_limit: Option<u64>,
    sink: &LogSink,
    progress: &MultiProgress,
) -> Result<u64> {
    progress.suspend(|| sink.start());

    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    progress.suspend(|| sink.request(status.as_u16()));
    if !status.is_success() {
        bail!("{} returned {}", url, status_text(status.as_u16()));
    }

    let total = response.content_length();
    if let Some(total) = total {
        progress.suspend(|| sink.size(total));
    }
    progress.suspend(|| sink.saving(path));

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("failed to create {}", path.display()))?;

    let bar = progress.add(ProgressBar::new(total.unwrap_or(0)));
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        )?
        .progress_chars("=> "),
    );

    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("failed reading body of {}", url))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        bar.inc(chunk.len() as u64);

        if let Some(rate) = rate_limit {
            tokio::time::sleep(Duration::from_secs_f64(chunk.len() as f64 / rate as f64)).await;
        }
    }
    file.flush().await?;
    bar.finish();

    debug!("Wrote {} bytes to {}", written, path.display());
    progress.suspend(|| {
        sink.downloaded(url.as_str());
        sink.finished();
    });
    Ok(written)
}

/// Download every URL concurrently. Individual failures are reported in the
/// outcomes; an error is returned only for invalid options.
pub async fn execute_download(options: DownloadOptions, sink: &LogSink) -> Result<Vec<DownloadOutcome>> {
    let DownloadOptions {
        urls,
        output_name,
        dir,
        rate_limit,
        timeout_secs,
        show_progress_bars,
    } = options;

    if output_name.is_some() && urls.len() > 1 {
        bail!("-O can only be used with a single URL");
    }

    let client = build_client(timeout_secs)?;
    let progress = if show_progress_bars {
        MultiProgress::new()
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    };

    let downloads = urls.iter().map(|raw| {
        let client = &client;
        let progress = &progress;
        let dir = &dir;
        let output_name = output_name.as_deref();
        async move {
            let result = async {
                let url = Url::parse(raw).with_context(|| format!("invalid URL: {}", raw))?;
                let path = output_path(&url, dir, output_name)?;
                let bytes = download_file(client, &url, &path, rate_limit, sink, progress).await?;
                Ok::<_, anyhow::Error>((path, bytes))
            }
            .await;

            match result {
                Ok((path, bytes)) => DownloadOutcome {
                    url: raw.clone(),
                    path: Some(path),
                    bytes,
                    error: None,
                },
                Err(e) => {
                    warn!("Download of {} failed: {:#}", raw, e);
                    progress.suspend(|| sink.error(&format!("{:#}", e)));
                    DownloadOutcome {
                        url: raw.clone(),
                        path: None,
                        bytes: 0,
                        error: Some(format!("{:#}", e)),
                    }
                }
            }
        }
    });

    Ok(join_all(downloads).await)
}
