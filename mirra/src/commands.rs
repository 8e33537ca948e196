use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("mirra")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("mirra")
        .about("Download files and mirror websites for offline browsing")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-B --"background" "Write progress to ./wget-log instead of the terminal")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-q --"quiet" "Suppress progress output")
                .required(false)
                .global(true)
                .conflicts_with("verbose"),
        )
        .arg(
            arg!(-v --"verbose" "Print debug diagnostics to stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("get")
                .about("Download one or more files")
                .arg(
                    arg!([URLS] ... "The URLs to download")
                        .required_unless_present("input-file"),
                )
                .arg(
                    arg!(-O --"output-document" <FILE>)
                        .required(false)
                        .help("Save the download under this file name")
                        .conflicts_with("input-file"),
                )
                .arg(
                    arg!(-P --"directory-prefix" <DIR>)
                        .required(false)
                        .help("Directory to save files in")
                        .default_value("."),
                )
                .arg(
                    arg!(--"limit-rate" <RATE>)
                        .required(false)
                        .help("Limit download speed in bytes per second, e.g. 512, 200k, 2M"),
                )
                .arg(
                    arg!(-i --"input-file" <FILE>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to download")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                ),
        )
        .subcommand(
            command!("mirror")
                .about("Recursively mirror a website, staying on its host")
                .arg(arg!(<URL> "The site to mirror"))
                .arg(
                    arg!(-R --"reject" <SUFFIXES>)
                        .required(false)
                        .help("Comma-separated file suffixes to skip, e.g. .pdf,.zip"),
                )
                .arg(
                    arg!(-X --"exclude" <PREFIXES>)
                        .required(false)
                        .help("Comma-separated path prefixes to skip, e.g. /private,/tmp"),
                )
                .arg(
                    arg!(--"convert-links")
                        .required(false)
                        .help("Rewrite links in saved HTML and CSS for offline browsing")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-P --"directory-prefix" <DIR>)
                        .required(false)
                        .help("Directory to save the mirror in")
                        .default_value("."),
                )
                .arg(
                    arg!(-l --"level" <DEPTH>)
                        .required(false)
                        .help("Maximum recursion depth")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1000"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of concurrent downloads")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the mirror report to a file (default: display to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}
