use crate::css::extract_css_links;
use crate::fetcher::{is_css, is_html};
use crate::reference::{AttrKind, classify_attr, resolve_reference, srcset_candidates};
use scraper::{Html, Node, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("hardcoded selector is valid"));

/// Child URLs referenced by an HTML or CSS body. Other content types yield nothing.
pub fn extract_links(body: &str, content_type: &str, page_url: &Url) -> BTreeSet<Url> {
    if is_html(content_type) {
        extract_html_links(body, page_url)
    } else if is_css(content_type) {
        extract_css_links(body, page_url)
    } else {
        BTreeSet::new()
    }
}

/// Walk every element and text node of the document.
///
/// Elements contribute their URL-bearing attributes (including `srcset`
/// candidates and inline `style` CSS); text nodes are scanned as CSS so
/// `<style>` blocks are covered. A `<base href>` replaces the page URL as the
/// resolution base.
pub fn extract_html_links(html: &str, page_url: &Url) -> BTreeSet<Url> {
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);
    let mut links = BTreeSet::new();

    for node in document.tree.values() {
        match node {
            Node::Element(element) => {
                for (name, value) in element.attrs() {
                    match classify_attr(name) {
                        Some(AttrKind::Url) => links.extend(resolve_reference(&base, value)),
                        Some(AttrKind::SrcSet) => links.extend(
                            srcset_candidates(value)
                                .into_iter()
                                .filter_map(|candidate| resolve_reference(&base, candidate.url)),
                        ),
                        Some(AttrKind::Style) => links.extend(extract_css_links(value, &base)),
                        None => {}
                    }
                }
            }
            Node::Text(text) => links.extend(extract_css_links(text, &base)),
            _ => {}
        }
    }

    links
}

/// Resolution base for the document: its first `<base href>`, or the page URL.
pub fn document_base(document: &Html, page_url: &Url) -> Url {
    document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}
