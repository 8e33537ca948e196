use crate::error::{MirrorError, Result};
use crate::filter::host_key;
use std::path::{Path, PathBuf};
use url::Url;

pub const INDEX_FILE: &str = "index.html";

/// Maps remote URLs onto `<base_dir>/<host>/<path>`.
#[derive(Debug, Clone)]
pub struct PathMapper {
    base_dir: PathBuf,
}

impl PathMapper {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Local destination for `url`. Query and fragment are ignored, directory
    /// URLs get `index.html`, and extensionless names get an extension derived
    /// from `content_type` (an empty content type is allowed).
    pub fn local_path(&self, url: &Url, content_type: &str) -> Result<PathBuf> {
        let host = host_key(url)
            .ok_or_else(|| MirrorError::InvalidUrl(format!("{} has no host", url)))?;

        let mut segments = normalize_segments(url.path());
        if segments.is_empty() || url.path().ends_with('/') {
            segments.push(INDEX_FILE.to_string());
        }

        if let Some(last) = segments.last_mut()
            && !has_extension(last)
        {
            last.push_str(extension_for(content_type));
        }

        let mut path = self.base_dir.join(host);
        for segment in segments {
            path.push(segment);
        }
        Ok(path)
    }
}

/// Percent-decode each segment, resolve `.` and `..` and drop empty ones.
/// `..` never climbs above the root.
pub fn normalize_segments(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for raw in path.split('/') {
        let segment = decode_segment(raw);
        match segment.as_str() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments
}

// An encoded separator must not create a directory
fn decode_segment(raw: &str) -> String {
    let bytes = urlencoding::decode_binary(raw.as_bytes());
    String::from_utf8_lossy(&bytes).replace(['/', '\\', '\0'], "_")
}

fn has_extension(name: &str) -> bool {
    name.rfind('.').is_some_and(|idx| idx + 1 < name.len())
}

/// Extension for a content type, used when the URL path carries none.
pub fn extension_for(content_type: &str) -> &'static str {
    let ct = content_type.to_lowercase();
    if ct.contains("javascript") || ct.contains("ecmascript") {
        ".js"
    } else if ct.contains("css") {
        ".css"
    } else if ct.contains("image/png") {
        ".png"
    } else if ct.contains("image/jpeg") || ct.contains("image/jpg") {
        ".jpg"
    } else if ct.contains("image/gif") {
        ".gif"
    } else if ct.contains("image/svg") {
        ".svg"
    } else if ct.contains("image/webp") {
        ".webp"
    } else if ct.contains("json") {
        ".json"
    } else if ct.contains("text/plain") {
        ".txt"
    } else if ct.contains("xml") && !ct.contains("html") {
        ".xml"
    } else {
        ".html"
    }
}

/// Relative, forward-slash path from the directory holding `from_file` to `to_file`,
/// percent-encoded so it resolves back to the file name on disk.
pub fn relative_link(from_file: &Path, to_file: &Path) -> Option<String> {
    let from_dir = from_file.parent().unwrap_or(Path::new(""));
    let relative = pathdiff::diff_paths(to_file, from_dir)?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| urlencoding::encode(&c.as_os_str().to_string_lossy()).into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> PathMapper {
        PathMapper::new("/mirror")
    }

    fn map(url: &str, ct: &str) -> PathBuf {
        mapper().local_path(&Url::parse(url).unwrap(), ct).unwrap()
    }

    #[test]
    fn test_root_becomes_index() {
        assert_eq!(map("http://example.com", "text/html"), PathBuf::from("/mirror/example.com/index.html"));
        assert_eq!(map("http://example.com/", ""), PathBuf::from("/mirror/example.com/index.html"));
    }

    #[test]
    fn test_directory_url_becomes_index() {
        assert_eq!(
            map("http://example.com/docs/", "text/html"),
            PathBuf::from("/mirror/example.com/docs/index.html")
        );
    }

    #[test]
    fn test_query_and_fragment_are_stripped() {
        assert_eq!(
            map("http://example.com/img/logo.png?v=3#x", "image/png"),
            PathBuf::from("/mirror/example.com/img/logo.png")
        );
    }

    #[test]
    fn test_existing_extension_is_kept() {
        assert_eq!(
            map("http://example.com/app/app.js", "text/html"),
            PathBuf::from("/mirror/example.com/app/app.js")
        );
    }

    #[test]
    fn test_extension_inferred_from_content_type() {
        assert_eq!(
            map("http://example.com/bundle", "application/javascript"),
            PathBuf::from("/mirror/example.com/bundle.js")
        );
        assert_eq!(
            map("http://example.com/theme", "text/css; charset=utf-8"),
            PathBuf::from("/mirror/example.com/theme.css")
        );
        assert_eq!(map("http://example.com/p", "image/jpeg"), PathBuf::from("/mirror/example.com/p.jpg"));
        assert_eq!(map("http://example.com/p", "image/gif"), PathBuf::from("/mirror/example.com/p.gif"));
        assert_eq!(map("http://example.com/about", "text/html"), PathBuf::from("/mirror/example.com/about.html"));
    }

    #[test]
    fn test_empty_content_type_maps_like_html() {
        assert_eq!(map("http://example.com/about", ""), map("http://example.com/about", "text/html"));
    }

    #[test]
    fn test_dot_segments_cannot_escape_host_dir() {
        let url = Url::parse("http://example.com/a/b").unwrap();
        let escaped = url.join("../../../../etc/passwd").unwrap();
        let path = mapper().local_path(&escaped, "text/plain").unwrap();
        assert!(path.starts_with("/mirror/example.com"));
        assert_eq!(normalize_segments("/a/./b/../c"), vec!["a", "c"]);
        assert_eq!(normalize_segments("/../../x"), vec!["x"]);
    }

    #[test]
    fn test_port_is_part_of_host_dir() {
        assert_eq!(
            map("http://127.0.0.1:8080/x.css", "text/css"),
            PathBuf::from("/mirror/127.0.0.1:8080/x.css")
        );
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let a = map("http://example.com/a/b?x=1", "text/html");
        let b = map("http://example.com/a/b?x=1", "text/html");
        assert_eq!(a, b);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("a.html"));
        assert!(has_extension(".htaccess"));
        assert!(!has_extension("about"));
        assert!(!has_extension("trailing."));
    }

    #[test]
    fn test_encoded_segments_are_decoded() {
        assert_eq!(
            map("http://example.com/my file.png", "image/png"),
            PathBuf::from("/mirror/example.com/my file.png")
        );
        assert_eq!(
            map("http://example.com/caf%C3%A9/men%C3%BC.html", ""),
            PathBuf::from("/mirror/example.com/café/menü.html")
        );
        assert_eq!(normalize_segments("/a%2Fb/c"), vec!["a_b", "c"]);
    }

    #[test]
    fn test_relative_link_encodes_names() {
        let page = Path::new("/mirror/example.com/index.html");
        assert_eq!(
            relative_link(page, Path::new("/mirror/example.com/my docs/caf\u{e9}.pdf")).as_deref(),
            Some("my%20docs/caf%C3%A9.pdf")
        );
    }

    #[test]
    fn test_relative_link() {
        let page = Path::new("/mirror/example.com/blog/post/index.html");
        assert_eq!(
            relative_link(page, Path::new("/mirror/example.com/img/logo.png")).as_deref(),
            Some("../../img/logo.png")
        );
        assert_eq!(
            relative_link(page, Path::new("/mirror/example.com/blog/post/a.html")).as_deref(),
            Some("a.html")
        );
        assert_eq!(
            relative_link(Path::new("/mirror/example.com/index.html"), Path::new("/mirror/example.com/css/main.css"))
                .as_deref(),
            Some("css/main.css")
        );
    }
}
