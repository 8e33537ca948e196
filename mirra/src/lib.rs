#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{expand_dir, load_urls_from_file, load_urls_from_source, parse_url_line};

pub use mirra_core::mirror::{MirrorOptions, execute_mirror, extract_url_path, parse_list};
pub use mirra_core::report::{ReportFormat, generate_mirror_report};
