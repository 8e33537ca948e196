// Tests for mirror report generation

use mirra_core::report::{
    ReportFormat, generate_json_report, generate_mirror_report, generate_report, save_report,
};
use mirra_crawler::{MirrorResult, MirrorStats, MirrorSummary, NodeStatus};
use std::path::PathBuf;
use tempfile::TempDir;

fn sample_summary() -> MirrorSummary {
    let mut index = MirrorResult::new("http://example.com/".to_string(), 0, NodeStatus::Scanned);
    index.status_code = 200;
    index.content_type = Some("text/html".to_string());
    index.content_length = Some(1024);
    index.local_path = Some(PathBuf::from("./example.com/index.html"));

    let mut logo = MirrorResult::new("http://example.com/img/logo.png".to_string(), 1, NodeStatus::Saved);
    logo.status_code = 200;
    logo.content_length = Some(2048);
    logo.local_path = Some(PathBuf::from("./example.com/img/logo.png"));

    let mut missing = MirrorResult::with_error(
        "http://example.com/missing".to_string(),
        1,
        "HTTP 404 for http://example.com/missing".to_string(),
    );
    missing.status_code = 404;

    let results = vec![index, logo, missing];
    let mut stats = MirrorStats::default();
    for result in &results {
        stats.record(result);
    }

    MirrorSummary {
        root: "http://example.com/".to_string(),
        results,
        stats,
        cancelled: false,
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("csv"), None);
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_summary() {
    let report = generate_mirror_report(&sample_summary());

    assert!(report.contains("Files saved: 2"));
    assert!(report.contains("Failures: 1"));
    assert!(report.contains("Bytes written: 3072 [~3.00KB]"));
    assert!(report.contains("## example.com"));
    assert!(!report.contains("cancelled"));
}

#[test]
fn test_text_report_lines() {
    let report = generate_mirror_report(&sample_summary());

    assert!(report.contains("/img/logo.png -> ./example.com/img/logo.png"));
    assert!(report.contains("\x1b[33m404\x1b[0m /missing"));
    assert!(report.contains("HTTP 404 for http://example.com/missing"));
}

#[test]
fn test_text_report_cancelled() {
    let mut summary = sample_summary();
    summary.cancelled = true;
    assert!(generate_mirror_report(&summary).contains("Status: cancelled"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_structure() {
    let json = generate_json_report(&sample_summary()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["report"]["metadata"]["generator"], "Mirra");
    assert_eq!(value["report"]["root"], "http://example.com/");
    assert_eq!(value["report"]["summary"]["saved"], 2);
    assert_eq!(value["report"]["summary"]["failed"], 1);
    assert_eq!(value["report"]["results"].as_array().unwrap().len(), 3);
}

#[test]
fn test_generate_report_dispatch() {
    let summary = sample_summary();
    assert!(generate_report(&summary, ReportFormat::Text).unwrap().contains("# Summary:"));
    assert!(generate_report(&summary, ReportFormat::Json).unwrap().starts_with('{'));
}

#[test]
fn test_save_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.txt");

    save_report("hello report", &path).unwrap();

    assert_eq!(std::fs::read_to_string(path).unwrap(), "hello report");
}
