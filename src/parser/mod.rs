//! HTML extraction for abcnotation.com listing and tune pages.

use crate::constants::{KEY_FIELD_MARKER, TITLE_FIELD_MARKER, TUNE_INDEX_MARKER, TUNE_PAGE_MARKER, UNKNOWN_TITLE};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static PRE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("pre").expect("static selector"));

const DOWNLOAD_LINK_TEXT: &str = "abc";

/// What a tune page offers: the ABC text inline, or a link to download it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TunePage {
    pub abc: Option<String>,
    pub download_link: Option<String>,
}

pub fn parse_tune_page(html: &str, base_url: &str) -> TunePage {
    let document = Html::parse_document(html);
    TunePage {
        abc: abc_block(&document),
        download_link: download_link(&document, base_url),
    }
}

/// Links to tune pages, absolutized, de-duplicated in first-seen order.
pub fn extract_tune_urls(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for link in document.select(&LINK_SELECTOR) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains(TUNE_PAGE_MARKER) {
            continue;
        }
        let url = absolutize(href, base_url);
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
    urls
}

/// Text of the first `<pre>` that carries both `X:` and `K:`, trimmed.
pub fn extract_abc_block(html: &str) -> Option<String> {
    abc_block(&Html::parse_document(html))
}

pub fn find_abc_download_link(html: &str, base_url: &str) -> Option<String> {
    download_link(&Html::parse_document(html), base_url)
}

/// Title from the first `T:` line, or `"Unknown"` when there is none.
pub fn extract_title(content: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix(TITLE_FIELD_MARKER))
        .map(|title| title.trim().to_string())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

fn abc_block(document: &Html) -> Option<String> {
    document
        .select(&PRE_SELECTOR)
        .map(|pre| pre.text().collect::<String>())
        .find(|text| text.contains(TUNE_INDEX_MARKER) && text.contains(KEY_FIELD_MARKER))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn download_link(document: &Html, base_url: &str) -> Option<String> {
    document
        .select(&LINK_SELECTOR)
        .find(|a| a.text().collect::<String>().trim() == DOWNLOAD_LINK_TEXT)
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolutize(href, base_url))
}

fn absolutize(href: &str, base_url: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}
