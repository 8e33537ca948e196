// wget-style progress lines for the terminal or the background log file

use chrono::Local;
use colored::Colorize;
use mirra_crawler::MirrorEvent;
use reqwest::StatusCode;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Log file used in background mode, created in the working directory
pub const LOG_FILE: &str = "wget-log";

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Info,
    Success,
    Skip,
    Error,
}

enum Target {
    Terminal,
    Writer(Mutex<Box<dyn Write + Send>>),
    Quiet,
}

/// Where user-facing progress lines go.
///
/// On the terminal lines are colored and errors go to stderr; any other writer
/// (the `wget-log` file in background mode) receives plain text.
pub struct LogSink {
    target: Target,
}

impl LogSink {
    pub fn terminal() -> Self {
        Self {
            target: Target::Terminal,
        }
    }

    pub fn quiet() -> Self {
        Self { target: Target::Quiet }
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            target: Target::Writer(Mutex::new(writer)),
        }
    }

    /// Append to `<dir>/wget-log`, creating it if needed.
    pub fn background(dir: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path(dir))?;
        Ok(Self::with_writer(Box::new(file)))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.target, Target::Terminal)
    }

    pub fn start(&self) {
        self.write(LineKind::Info, &format!("start at {}", timestamp()));
    }

    pub fn request(&self, status: u16) {
        self.write(LineKind::Info, &request_line(status));
    }

    pub fn size(&self, bytes: u64) {
        self.write(LineKind::Info, &size_line(bytes));
    }

    pub fn saving(&self, path: &Path) {
        self.write(LineKind::Info, &format!("saving file to: {}", path.display()));
    }

    pub fn downloaded(&self, url: &str) {
        self.write(LineKind::Success, &format!("Downloaded [{}]", url));
    }

    pub fn finished(&self) {
        self.write(LineKind::Info, &format!("finished at {}", timestamp()));
    }

    pub fn error(&self, message: &str) {
        self.write(LineKind::Error, &format!("ERROR: {}", message));
    }

    pub fn event(&self, event: &MirrorEvent) {
        for (kind, line) in render_event(event) {
            self.write(kind, &line);
        }
    }

    pub fn write(&self, kind: LineKind, line: &str) {
        match &self.target {
            Target::Terminal => {
                let painted = paint(kind, line);
                if kind == LineKind::Error {
                    eprintln!("{}", painted);
                } else {
                    println!("{}", painted);
                }
            }
            Target::Writer(writer) => {
                if let Ok(mut writer) = writer.lock() {
                    // a failing log file must not abort the transfer
                    let _ = writeln!(writer, "{}", line);
                    let _ = writer.flush();
                }
            }
            Target::Quiet => {}
        }
    }
}

pub fn log_file_path(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE)
}

/// Lines for one engine event, in output order
pub fn render_event(event: &MirrorEvent) -> Vec<(LineKind, String)> {
    match event {
        MirrorEvent::Started { .. } => vec![(LineKind::Info, format!("start at {}", timestamp()))],
        MirrorEvent::Response { status, .. } => vec![(LineKind::Info, request_line(*status))],
        MirrorEvent::Size { bytes, .. } => vec![(LineKind::Info, size_line(*bytes))],
        MirrorEvent::Saved { url, path } => vec![
            (LineKind::Info, format!("saving file to: {}", path.display())),
            (LineKind::Success, format!("Downloaded [{}]", url)),
        ],
        MirrorEvent::Skipped { url, reason } => {
            vec![(LineKind::Skip, format!("Skipping {} ({})", url, reason))]
        }
        MirrorEvent::Unconverted { url, reason } => {
            vec![(LineKind::Skip, format!("Links not converted in {} ({})", url, reason))]
        }
        MirrorEvent::Failed { url, error } => {
            vec![(LineKind::Error, format!("ERROR: {}: {}", url, error))]
        }
        MirrorEvent::Finished { .. } => {
            vec![(LineKind::Info, format!("finished at {}", timestamp()))]
        }
    }
}

pub fn timestamp() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

pub fn request_line(status: u16) -> String {
    format!("sending request, awaiting response... status {}", status_text(status))
}

pub fn size_line(bytes: u64) -> String {
    format!("content size: {} [~{}]", bytes, human_size(bytes))
}

/// `200 OK`, or just the code when it has no canonical reason
pub fn status_text(status: u16) -> String {
    match StatusCode::from_u16(status).ok().and_then(|s| s.canonical_reason()) {
        Some(reason) => format!("{} {}", status, reason),
        None => status.to_string(),
    }
}

pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.2}GB", b / GB)
    } else if b >= MB {
        format!("{:.2}MB", b / MB)
    } else if b >= KB {
        format!("{:.2}KB", b / KB)
    } else {
        format!("{}B", bytes)
    }
}

fn paint(kind: LineKind, line: &str) -> String {
    match kind {
        LineKind::Info => line.to_string(),
        LineKind::Success => line.green().to_string(),
        LineKind::Skip => line.yellow().to_string(),
        LineKind::Error => line.red().bold().to_string(),
    }
}
