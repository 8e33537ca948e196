use url::Url;

/// How an HTML attribute carries resource references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// A single URL (`href`, `src`, `poster`, `action`, `data-src`...)
    Url,
    /// Comma-separated `url descriptor` candidates (`srcset` and friends)
    SrcSet,
    /// Inline CSS that may contain `url(...)`
    Style,
}

/// Classify an attribute by (case-insensitive) name.
pub fn classify_attr(name: &str) -> Option<AttrKind> {
    let name = name.to_ascii_lowercase();
    match name.as_str() {
        "style" => Some(AttrKind::Style),
        "srcset" | "imagesrcset" | "data-srcset" => Some(AttrKind::SrcSet),
        "href" | "src" | "poster" | "action" | "background" | "data-lazy-src" | "data-original" => {
            Some(AttrKind::Url)
        }
        n if n.starts_with("data-src") && n.ends_with("srcset") => Some(AttrKind::SrcSet),
        n if n.starts_with("data-src") => Some(AttrKind::Url),
        _ => None,
    }
}

/// References that never point at a fetchable resource
pub fn is_non_resource(raw: &str) -> bool {
    let lowered = raw.trim_start().to_ascii_lowercase();
    lowered.is_empty()
        || lowered.starts_with('#')
        || ["javascript:", "mailto:", "tel:", "data:", "about:", "blob:"]
            .iter()
            .any(|scheme| lowered.starts_with(scheme))
}

/// Resolve `raw` against `base` into an absolute http(s) URL without fragment.
/// Anything that fails to resolve is dropped.
pub fn resolve_reference(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if is_non_resource(raw) {
        return None;
    }

    let mut resolved = base.join(raw).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}

/// One `srcset` candidate: the URL token and whatever descriptor follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcSetCandidate<'a> {
    pub url: &'a str,
    pub descriptor: &'a str,
}

pub fn srcset_candidates(value: &str) -> Vec<SrcSetCandidate<'_>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(|candidate| match candidate.split_once(char::is_whitespace) {
            Some((url, descriptor)) => SrcSetCandidate {
                url,
                descriptor: descriptor.trim(),
            },
            None => SrcSetCandidate {
                url: candidate,
                descriptor: "",
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_attr() {
        assert_eq!(classify_attr("href"), Some(AttrKind::Url));
        assert_eq!(classify_attr("SRC"), Some(AttrKind::Url));
        assert_eq!(classify_attr("data-src"), Some(AttrKind::Url));
        assert_eq!(classify_attr("data-src-retina"), Some(AttrKind::Url));
        assert_eq!(classify_attr("srcset"), Some(AttrKind::SrcSet));
        assert_eq!(classify_attr("data-srcset"), Some(AttrKind::SrcSet));
        assert_eq!(classify_attr("style"), Some(AttrKind::Style));
        assert_eq!(classify_attr("alt"), None);
        assert_eq!(classify_attr("class"), None);
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let base = Url::parse("http://example.com/blog/post.html").unwrap();
        assert_eq!(
            resolve_reference(&base, "img/a.png").unwrap().as_str(),
            "http://example.com/blog/img/a.png"
        );
        assert_eq!(
            resolve_reference(&base, "/a.html").unwrap().as_str(),
            "http://example.com/a.html"
        );
        assert_eq!(
            resolve_reference(&base, "//cdn.other.com/x.css").unwrap().as_str(),
            "http://cdn.other.com/x.css"
        );
        assert_eq!(
            resolve_reference(&base, " ../about#team ").unwrap().as_str(),
            "http://example.com/about"
        );
    }

    #[test]
    fn test_resolve_drops_non_resources() {
        let base = Url::parse("http://example.com/").unwrap();
        for raw in [
            "",
            "#top",
            "javascript:void(0)",
            "mailto:me@example.com",
            "tel:+123",
            "data:image/png;base64,AAAA",
            "ftp://example.com/file",
        ] {
            assert!(resolve_reference(&base, raw).is_none(), "{} should be dropped", raw);
        }
    }

    #[test]
    fn test_resolve_drops_malformed() {
        let base = Url::parse("http://example.com/").unwrap();
        assert!(resolve_reference(&base, "http://[::1").is_none());
    }

    #[test]
    fn test_srcset_candidates() {
        let candidates = srcset_candidates("small.jpg 480w, /large.jpg 1080w,  huge.jpg");
        assert_eq!(
            candidates,
            vec![
                SrcSetCandidate { url: "small.jpg", descriptor: "480w" },
                SrcSetCandidate { url: "/large.jpg", descriptor: "1080w" },
                SrcSetCandidate { url: "huge.jpg", descriptor: "" },
            ]
        );
        assert!(srcset_candidates(" , ").is_empty());
    }
}
