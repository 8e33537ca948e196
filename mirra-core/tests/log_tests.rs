// Tests for the wget-style log sink

use mirra_core::log::{
    LOG_FILE, LineKind, LogSink, human_size, render_event, request_line, size_line, status_text,
};
use mirra_crawler::{MirrorEvent, SkipReason};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_human_size_units() {
    assert_eq!(human_size(0), "0B");
    assert_eq!(human_size(1023), "1023B");
    assert_eq!(human_size(1024), "1.00KB");
    assert_eq!(human_size(1536), "1.50KB");
    assert_eq!(human_size(5 * 1024 * 1024), "5.00MB");
    assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.00GB");
}

#[test]
fn test_status_text() {
    assert_eq!(status_text(200), "200 OK");
    assert_eq!(status_text(404), "404 Not Found");
    assert_eq!(status_text(599), "599");
}

#[test]
fn test_request_and_size_lines() {
    assert_eq!(request_line(200), "sending request, awaiting response... status 200 OK");
    assert_eq!(size_line(56370), "content size: 56370 [~55.05KB]");
}

#[test]
fn test_render_saved_event() {
    let lines = render_event(&MirrorEvent::Saved {
        url: "http://example.com/a.html".to_string(),
        path: PathBuf::from("./example.com/a.html"),
    });

    assert_eq!(
        lines,
        vec![
            (LineKind::Info, "saving file to: ./example.com/a.html".to_string()),
            (LineKind::Success, "Downloaded [http://example.com/a.html]".to_string()),
        ]
    );
}

#[test]
fn test_render_failed_and_skipped_events() {
    let failed = render_event(&MirrorEvent::Failed {
        url: "http://example.com/x".to_string(),
        error: "HTTP 404 for http://example.com/x".to_string(),
    });
    assert_eq!(failed[0].0, LineKind::Error);
    assert!(failed[0].1.starts_with("ERROR: http://example.com/x"));

    let skipped = render_event(&MirrorEvent::Skipped {
        url: "http://example.com/doc.pdf".to_string(),
        reason: SkipReason::Rejected(".pdf".to_string()),
    });
    assert_eq!(skipped[0].0, LineKind::Skip);
    assert!(skipped[0].1.contains("reject rule (.pdf)"));
}

#[test]
fn test_render_unconverted_event() {
    let lines = render_event(&MirrorEvent::Unconverted {
        url: "http://example.com/latin1.html".to_string(),
        reason: "body is not UTF-8".to_string(),
    });
    assert_eq!(
        lines,
        vec![(
            LineKind::Skip,
            "Links not converted in http://example.com/latin1.html (body is not UTF-8)".to_string()
        )]
    );
}

#[test]
fn test_render_session_bounds() {
    let start = render_event(&MirrorEvent::Started {
        url: "http://example.com/".to_string(),
    });
    assert!(start[0].1.starts_with("start at "));

    let finish = render_event(&MirrorEvent::Finished {
        url: "http://example.com/".to_string(),
    });
    assert!(finish[0].1.starts_with("finished at "));
}

#[test]
fn test_background_sink_appends_plain_lines() {
    let dir = TempDir::new().unwrap();

    {
        let sink = LogSink::background(dir.path()).unwrap();
        assert!(!sink.is_terminal());
        sink.request(200);
        sink.error("boom");
    }
    {
        let sink = LogSink::background(dir.path()).unwrap();
        sink.downloaded("http://example.com/");
    }

    let log = std::fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
    assert_eq!(
        log,
        "sending request, awaiting response... status 200 OK\nERROR: boom\nDownloaded [http://example.com/]\n"
    );
}
