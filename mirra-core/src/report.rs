// Mirror session reports

use crate::log::human_size;
use crate::mirror::extract_url_path;
use mirra_crawler::{MirrorResult, MirrorSummary, NodeStatus, host_key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Text summary of a mirror session, grouped by host.
///
/// Status codes are ANSI-colored; failed nodes show their error.
pub fn generate_mirror_report(summary: &MirrorSummary) -> String {
    let mut report = String::new();
    report.push_str(RULE);
    report.push_str("\n\n# Summary:\n");
    report.push_str(&format!("  Root: {}\n", summary.root));
    report.push_str(&format!("  Files saved: {}\n", summary.stats.saved));
    report.push_str(&format!("  Failures: {}\n", summary.stats.failed));
    report.push_str(&format!("  Skipped by filters: {}\n", summary.stats.filtered));
    report.push_str(&format!(
        "  Bytes written: {} [~{}]\n",
        summary.stats.bytes_written,
        human_size(summary.stats.bytes_written)
    ));
    if summary.cancelled {
        report.push_str("  Status: cancelled\n");
    }
    report.push('\n');
    report.push_str(RULE);
    report.push_str("\n\n");

    let mut by_host: BTreeMap<String, Vec<&MirrorResult>> = BTreeMap::new();
    for result in &summary.results {
        if let Ok(url) = Url::parse(&result.url)
            && let Some(host) = host_key(&url)
        {
            by_host.entry(host).or_default().push(result);
        }
    }

    for (host, mut host_results) in by_host {
        host_results.sort_by(|a, b| a.url.cmp(&b.url));
        let saved = host_results.iter().filter(|r| r.is_saved()).count();

        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} files saved\n\n", saved));

        for result in host_results {
            let path = extract_url_path(&result.url);
            let status_str = match result.status_code {
                100..=199 => format!("\x1b[37m{}\x1b[0m", result.status_code),
                200..=299 => format!("\x1b[32m{}\x1b[0m", result.status_code),
                300..=399 => format!("\x1b[36m{}\x1b[0m", result.status_code),
                400..=499 => format!("\x1b[33m{}\x1b[0m", result.status_code),
                500..=599 => format!("\x1b[31m{}\x1b[0m", result.status_code),
                _ => "\x1b[31mERR\x1b[0m".to_string(),
            };

            let mut line = format!("  {} {}", status_str, path);
            match result.status {
                NodeStatus::Failed => {
                    if let Some(ref error) = result.error {
                        line.push_str(&format!(" \x1b[90m{}\x1b[0m", error));
                    }
                }
                _ => {
                    if let Some(ref local_path) = result.local_path {
                        line.push_str(&format!(" -> {}", local_path.display()));
                    }
                }
            }

            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report
}

pub fn generate_json_report(summary: &MirrorSummary) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Mirra",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json",
            },
            "root": summary.root,
            "cancelled": summary.cancelled,
            "summary": summary.stats,
            "results": summary.results,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_report(summary: &MirrorSummary, format: ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(generate_mirror_report(summary)),
        ReportFormat::Json => generate_json_report(summary).map_err(|e| format!("Failed to encode report: {}", e)),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
