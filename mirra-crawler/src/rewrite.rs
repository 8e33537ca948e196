// Offline link conversion for saved HTML and CSS

use crate::css::rewrite_css_urls;
use crate::extract::document_base;
use crate::filter::host_key;
use crate::paths::{PathMapper, relative_link};
use crate::reference::{AttrKind, classify_attr, is_non_resource, srcset_candidates};
use regex::{Captures, Regex};
use scraper::Html;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<style\b[^>]*>)(.*?)(</style\s*>)").expect("hardcoded regex pattern is valid")
});

// Start tags, allowing quoted attribute values to contain '>'. Only start-tag
// attributes are rewritten; the pattern does not skip script bodies or
// comments, and an apostrophe inside an unquoted value ends the match early.
static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<[A-Za-z][^>"']*(?:(?:"[^"]*"|'[^']*')[^>"']*)*>"#).expect("hardcoded regex pattern is valid")
});

static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([A-Za-z][A-Za-z0-9-]*)").expect("hardcoded regex pattern is valid"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("hardcoded regex pattern is valid")
});

/// Rewrites on-host references into paths relative to the saved file.
///
/// Off-host references, fragment-only links and non-http schemes are left
/// byte-for-byte untouched, so rewriting is safe to repeat.
pub struct LinkRewriter<'a> {
    mapper: &'a PathMapper,
    root_host: &'a str,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(mapper: &'a PathMapper, root_host: &'a str) -> Self {
        Self { mapper, root_host }
    }

    /// Rewrite a saved HTML page. References resolve against the document's
    /// `<base href>` when it has one, and that `href` is removed so the local
    /// copy resolves links against its own location.
    pub fn rewrite_html(&self, html: &str, page_url: &Url, page_path: &Path) -> String {
        let base = document_base(&Html::parse_document(html), page_url);
        let page = PageContext {
            base: &base,
            rebased: base != *page_url,
            path: page_path,
        };

        let with_styles = STYLE_BLOCK.replace_all(html, |caps: &Captures| {
            format!("{}{}{}", &caps[1], self.rewrite_embedded_css(&caps[2], &page), &caps[3])
        });

        START_TAG
            .replace_all(&with_styles, |tag: &Captures| self.rewrite_tag(&tag[0], &page))
            .into_owned()
    }

    pub fn rewrite_css(&self, css: &str, page_url: &Url, page_path: &Path) -> String {
        rewrite_css_urls(css, |raw| self.convert(raw, page_url, page_path))
    }

    /// Local relative path for a single reference resolved against `base`,
    /// or `None` to leave it alone.
    pub fn convert(&self, raw: &str, base: &Url, page_path: &Path) -> Option<String> {
        let raw = raw.trim();
        if is_non_resource(raw) {
            return None;
        }

        let resolved = base.join(raw).ok()?;
        if !matches!(resolved.scheme(), "http" | "https") {
            return None;
        }
        if host_key(&resolved).as_deref() != Some(self.root_host) {
            return None;
        }

        let target = self.mapper.local_path(&resolved, "").ok()?;
        let mut relative = relative_link(page_path, &target)?;
        if let Some(fragment) = resolved.fragment() {
            relative.push('#');
            relative.push_str(fragment);
        }
        Some(relative)
    }

    // With the base href gone, relative references left remote must become absolute
    fn convert_in_page(&self, raw: &str, page: &PageContext) -> Option<String> {
        if let Some(local) = self.convert(raw, page.base, page.path) {
            return Some(local);
        }
        let raw = raw.trim();
        if !page.rebased || is_non_resource(raw) || Url::parse(raw).is_ok() {
            return None;
        }
        page.base.join(raw).ok().map(String::from)
    }

    fn rewrite_embedded_css(&self, css: &str, page: &PageContext) -> String {
        rewrite_css_urls(css, |raw| self.convert_in_page(raw, page))
    }

    fn rewrite_tag(&self, tag: &str, page: &PageContext) -> String {
        let is_base = TAG_NAME
            .captures(tag)
            .is_some_and(|name| name[1].eq_ignore_ascii_case("base"));

        ATTRIBUTE
            .replace_all(tag, |attr: &Captures| {
                let original = attr[0].to_string();
                if is_base && attr[1].eq_ignore_ascii_case("href") {
                    return String::new();
                }
                let Some(kind) = classify_attr(&attr[1]) else {
                    return original;
                };

                let (raw, quote) = if let Some(v) = attr.get(3) {
                    (v.as_str(), '"')
                } else if let Some(v) = attr.get(4) {
                    (v.as_str(), '\'')
                } else if let Some(v) = attr.get(5) {
                    (v.as_str(), '"')
                } else {
                    return original;
                };

                let value = decode_attr_entities(raw);
                let rewritten = match kind {
                    AttrKind::Url => self.convert_in_page(&value, page),
                    AttrKind::SrcSet => self.rewrite_srcset(&value, page),
                    AttrKind::Style => {
                        let css = self.rewrite_embedded_css(&value, page);
                        (css != value).then_some(css)
                    }
                };

                match rewritten {
                    Some(new_value) if new_value != value => format!(
                        "{}{}{}{}{}",
                        &attr[1],
                        &attr[2],
                        quote,
                        escape_attr(&new_value, quote),
                        quote
                    ),
                    _ => original,
                }
            })
            .into_owned()
    }

    /// Rewrite each candidate URL, keeping descriptors. `None` when nothing changed.
    fn rewrite_srcset(&self, value: &str, page: &PageContext) -> Option<String> {
        let mut changed = false;
        let candidates: Vec<String> = srcset_candidates(value)
            .into_iter()
            .map(|candidate| {
                let url = match self.convert_in_page(candidate.url, page) {
                    Some(local) => {
                        changed = true;
                        local
                    }
                    None => candidate.url.to_string(),
                };
                if candidate.descriptor.is_empty() {
                    url
                } else {
                    format!("{} {}", url, candidate.descriptor)
                }
            })
            .collect();

        changed.then(|| candidates.join(", "))
    }
}

struct PageContext<'p> {
    base: &'p Url,
    rebased: bool,
    path: &'p Path,
}

fn decode_attr_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn escape_attr(value: &str, quote: char) -> String {
    let escaped = value.replace('&', "&amp;");
    match quote {
        '\'' => escaped.replace('\'', "&#39;"),
        _ => escaped.replace('"', "&quot;"),
    }
}
