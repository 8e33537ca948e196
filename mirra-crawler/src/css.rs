// CSS reference extraction and in-place url() rewriting

use crate::reference::resolve_reference;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

static CSS_URL_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // url(path), url('path'), url("path")
        Regex::new(r#"(?i)url\(\s*['"]?([^'"()]+)['"]?\s*\)"#).expect("hardcoded regex pattern is valid"),
        // @import 'path'
        Regex::new(r#"(?i)@import\s+['"]([^'"]+)['"]"#).expect("hardcoded regex pattern is valid"),
        // @import url('path')
        Regex::new(r#"(?i)@import\s+url\(\s*['"]?([^'"()]+)['"]?\s*\)"#)
            .expect("hardcoded regex pattern is valid"),
    ]
});

static IMPORT_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(@import\s+)(['"])([^'"]+)(['"])"#).expect("hardcoded regex pattern is valid")
});

/// Raw reference tokens found anywhere in `css`, in match order.
pub fn css_references(css: &str) -> Vec<&str> {
    let mut refs = Vec::new();
    for pattern in CSS_URL_PATTERNS.iter() {
        for caps in pattern.captures_iter(css) {
            if let Some(m) = caps.get(1) {
                let raw = m.as_str().trim();
                if !raw.is_empty() {
                    refs.push(raw);
                }
            }
        }
    }
    refs
}

/// Absolute URLs referenced by `css`, resolved against `base`.
pub fn extract_css_links(css: &str, base: &Url) -> BTreeSet<Url> {
    css_references(css)
        .into_iter()
        .filter_map(|raw| resolve_reference(base, raw))
        .collect()
}

/// Replace every `url(...)` target and `@import "..."` target for which
/// `convert` returns a new value. Quoting and surrounding whitespace are kept;
/// an unterminated `url(` and everything after it is passed through unchanged.
pub fn rewrite_css_urls<F>(css: &str, mut convert: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    // ASCII lowercasing keeps byte offsets identical to `css`
    let lowered = css.to_ascii_lowercase();
    let mut out = String::with_capacity(css.len());
    let mut pos = 0;

    while let Some(found) = lowered[pos..].find("url(") {
        let inner_start = pos + found + "url(".len();
        let Some(close) = css[inner_start..].find(')') else {
            break;
        };
        let inner_end = inner_start + close;

        out.push_str(&css[pos..inner_start]);
        out.push_str(&rewrite_url_token(&css[inner_start..inner_end], &mut convert));
        pos = inner_end;
    }
    out.push_str(&css[pos..]);

    IMPORT_STRING
        .replace_all(&out, |caps: &Captures| {
            let target = &caps[3];
            match convert(target.trim()) {
                Some(new_target) => format!("{}{}{}{}", &caps[1], &caps[2], new_target, &caps[4]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn rewrite_url_token<F>(inner: &str, convert: &mut F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return inner.to_string();
    }

    let lead = &inner[..inner.len() - inner.trim_start().len()];
    let trail = &inner[inner.trim_end().len()..];

    let quote = trimmed
        .chars()
        .next()
        .filter(|c| (*c == '"' || *c == '\'') && trimmed.len() >= 2 && trimmed.ends_with(*c));
    let value = match quote {
        Some(_) => &trimmed[1..trimmed.len() - 1],
        None => trimmed,
    };

    match convert(value.trim()) {
        Some(new_value) => {
            let q = quote.map(String::from).unwrap_or_default();
            format!("{}{}{}{}{}", lead, q, new_value, q, trail)
        }
        None => inner.to_string(),
    }
}
