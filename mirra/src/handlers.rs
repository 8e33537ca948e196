use clap::ArgMatches;
use colored::Colorize;
use mirra_core::download::{DownloadOptions, execute_download, parse_rate_limit};
use mirra_core::log::{LOG_FILE, LogSink};
use mirra_core::mirror::{MirrorOptions, execute_mirror, parse_list, seed_failed};
use mirra_core::report::{ReportFormat, generate_report, save_report};
use mirra_crawler::{CancellationToken, EventCallback, MirrorEvent};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, warn};
use url::Url;

/// Install the stderr diagnostics subscriber: WARN by default, DEBUG when verbose.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Collect URLs from positional arguments and an optional input file
pub fn load_urls_from_source(urls: &[String], input_file: Option<&PathBuf>) -> Result<Vec<String>, String> {
    let mut loaded: Vec<String> = urls.iter().filter_map(|u| parse_url_line(u.trim())).collect();

    if let Some(path) = input_file {
        loaded.extend(load_urls_from_file(path)?);
    }

    if loaded.is_empty() {
        return Err("No valid URLs to download".to_string());
    }
    Ok(loaded)
}

/// Load and parse URLs from a file, skipping blank lines and `#` comments
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read input file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as an http(s) URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
        && url.has_host()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if let Ok(url) = Url::parse(&with_scheme)
        && url.host_str().is_some_and(|h| !h.is_empty())
        && !line.contains(char::is_whitespace)
    {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow().bold(), line);
    None
}

/// `-P` value with a leading `~` expanded
pub fn expand_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Sink chosen by the global flags. Background mode announces the log file first.
pub fn sink_from_flags(background: bool, quiet: bool) -> Result<LogSink, String> {
    if background {
        println!("Output will be written to \"{}\".", LOG_FILE);
        LogSink::background(Path::new("."))
            .map_err(|e| format!("Failed to open {}: {}", LOG_FILE, e))
    } else if quiet {
        Ok(LogSink::quiet())
    } else {
        Ok(LogSink::terminal())
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight requests");
            token_clone.cancel();
        }
    });
    token
}

pub async fn handle_get(sub_matches: &ArgMatches) -> i32 {
    let background = sub_matches.get_flag("background");
    let quiet = sub_matches.get_flag("quiet");

    let urls: Vec<String> = sub_matches
        .get_many::<String>("URLS")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let input_file = sub_matches.get_one::<PathBuf>("input-file");

    let urls = match load_urls_from_source(&urls, input_file) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            return 1;
        }
    };

    let rate_limit = match sub_matches.get_one::<String>("limit-rate").map(|r| parse_rate_limit(r)) {
        Some(Ok(rate)) => Some(rate),
        Some(Err(e)) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            return 1;
        }
        None => None,
    };

    let sink = match sink_from_flags(background, quiet) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            return 1;
        }
    };

    let dir = sub_matches
        .get_one::<String>("directory-prefix")
        .map(|d| expand_dir(d))
        .unwrap_or_else(|| PathBuf::from("."));

    let options = DownloadOptions {
        urls,
        output_name: sub_matches.get_one::<String>("output-document").cloned(),
        dir,
        rate_limit,
        timeout_secs: *sub_matches.get_one::<u64>("timeout").unwrap_or(&30),
        show_progress_bars: !background && !quiet,
    };

    match execute_download(options, &sink).await {
        Ok(outcomes) if outcomes.iter().all(|o| o.is_success()) => 0,
        Ok(_) => 1,
        Err(e) => {
            sink.error(&format!("{:#}", e));
            1
        }
    }
}

pub async fn handle_mirror(sub_matches: &ArgMatches) -> i32 {
    let background = sub_matches.get_flag("background");
    let quiet = sub_matches.get_flag("quiet");

    let Some(url) = sub_matches
        .get_one::<String>("URL")
        .and_then(|u| parse_url_line(u.trim()))
    else {
        eprintln!("{} A valid URL is required", "✗".red().bold());
        return 1;
    };

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output = sub_matches.get_one::<PathBuf>("output");

    let sink = match sink_from_flags(background, quiet) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            return 1;
        }
    };

    let mut options = MirrorOptions::new(url);
    if let Some(dir) = sub_matches.get_one::<String>("directory-prefix") {
        options.base_dir = expand_dir(dir);
    }
    options.max_depth = *sub_matches.get_one::<usize>("level").unwrap_or(&options.max_depth);
    options.workers = *sub_matches.get_one::<usize>("threads").unwrap_or(&options.workers);
    options.timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&options.timeout_secs);
    options.reject = sub_matches.get_one::<String>("reject").map(|r| parse_list(r)).unwrap_or_default();
    options.exclude = sub_matches.get_one::<String>("exclude").map(|x| parse_list(x)).unwrap_or_default();
    options.convert_links = sub_matches.get_flag("convert-links");
    options.show_progress_bars = !background && !quiet;

    let sink_clone = sink.clone();
    let event_callback: EventCallback = Arc::new(move |event: &MirrorEvent| sink_clone.event(event));

    let summary = match execute_mirror(options, Some(event_callback), cancel_on_ctrl_c()).await {
        Ok(summary) => summary,
        Err(e) => {
            sink.error(&e);
            return 1;
        }
    };

    let report = match generate_report(&summary, format) {
        Ok(report) => report,
        Err(e) => {
            sink.error(&e);
            return 1;
        }
    };

    if let Some(path) = output {
        match save_report(&report, path) {
            Ok(()) => {
                if !quiet && !background {
                    println!("{} Report saved to {}", "✓".green().bold(), path.display());
                }
            }
            Err(e) => {
                sink.error(&format!("Failed to save report to {}: {}", path.display(), e));
                return 1;
            }
        }
    } else if !quiet && !background {
        print!("{}", report);
    }

    if seed_failed(&summary) { 1 } else { 0 }
}
