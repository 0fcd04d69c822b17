use crate::config::ScraperConfig;
use crate::constants::{BROWSE_PATH, SEARCH_PATH, SEARCH_RESULTS_PER_PAGE};
use crate::error::{Result, ScraperError};
use crate::parser::{extract_title, extract_tune_urls, parse_tune_page, TunePage};
use crate::types::{ScrapeMode, TuneRecord, TuneSource};
use std::future::Future;
use tracing::{info, instrument, warn};

pub const ABC_NOTATION_SOURCE: &str = "abc_notation";

/// Crawler for abcnotation.com search results, browse pages and tune pages.
pub struct AbcNotationCrawler {
    client: reqwest::Client,
    base_url: String,
}

impl AbcNotationCrawler {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    async fn listing_urls(&self, path: &str, query: &[(&str, String)]) -> Vec<String> {
        let url = format!("{}{}", self.base_url, path);
        match self.get_text(&url, query).await {
            Ok(html) => extract_tune_urls(&html, &self.base_url),
            Err(e) => {
                warn!("Failed to fetch listing {}: {}", url, e);
                Vec::new()
            }
        }
    }

    /// Search result pages hold ten tunes each; page `p` starts at `p * 10`.
    pub async fn search_tunes(&self, query: &str, page_limit: u32) -> Vec<String> {
        let mut urls = Vec::new();
        for page in 0..page_limit {
            let params = search_params(query, page);
            info!("Searching page {}... (start={})", page + 1, params[3].1);
            urls.extend(self.listing_urls(SEARCH_PATH, &params).await);
        }
        urls
    }

    /// Browse pages are addressed by a zero-padded four digit number.
    pub async fn browse_tunes(&self, start_page: u32, page_limit: u32) -> Vec<String> {
        let mut urls = Vec::new();
        for number in browse_page_numbers(start_page, page_limit) {
            let page = browse_page_param(number);
            info!("Browsing page {}...", page);
            urls.extend(self.listing_urls(BROWSE_PATH, &[("n", page)]).await);
        }
        urls
    }
}

/// Query string for one search result page, sorted by title (`o=a`) over
/// tune contents (`f=c`).
pub fn search_params(query: &str, page: u32) -> [(&'static str, String); 4] {
    let start = page.saturating_mul(SEARCH_RESULTS_PER_PAGE);
    [
        ("q", query.to_string()),
        ("f", "c".to_string()),
        ("o", "a".to_string()),
        ("s", start.to_string()),
    ]
}

/// Page numbers to browse; stops at `u32::MAX` instead of wrapping.
pub fn browse_page_numbers(start_page: u32, page_limit: u32) -> impl Iterator<Item = u32> {
    (0..page_limit).map_while(move |i| start_page.checked_add(i))
}

pub fn browse_page_param(page: u32) -> String {
    format!("{:04}", page)
}

/// Pick the ABC text for a tune page: the inline `<pre>` block if present,
/// else whatever `download` returns for the page's `abc` link.
pub async fn resolve_abc<F, Fut>(url: &str, page: TunePage, download: F) -> Result<String>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let extraction_error = |reason: String| ScraperError::Extraction {
        url: url.to_string(),
        reason,
    };

    let abc = match (page.abc, page.download_link) {
        (Some(abc), _) => abc,
        (None, Some(link)) => {
            info!("Fetching raw ABC from {}", link);
            download(link)
                .await
                .map_err(|e| extraction_error(format!("raw ABC download failed: {}", e)))?
        }
        (None, None) => {
            return Err(extraction_error(
                "no <pre> block with X: and K: and no abc download link".to_string(),
            ))
        }
    };

    if abc.trim().is_empty() {
        return Err(extraction_error("ABC content is empty".to_string()));
    }
    Ok(abc)
}

#[async_trait::async_trait]
impl TuneSource for AbcNotationCrawler {
    fn source_name(&self) -> &'static str {
        ABC_NOTATION_SOURCE
    }

    async fn discover(&self, mode: &ScrapeMode) -> Vec<String> {
        match mode {
            ScrapeMode::Search { query, pages } => self.search_tunes(query, *pages).await,
            ScrapeMode::Browse { start_page, pages } => self.browse_tunes(*start_page, *pages).await,
        }
    }

    #[instrument(skip(self))]
    async fn fetch_tune(&self, url: &str) -> Result<TuneRecord> {
        info!("Scraping tune page");
        let html = self.get_text(url, &[]).await?;
        let page = parse_tune_page(&html, &self.base_url);

        let abc = resolve_abc(url, page, |link| async move { self.get_text(&link, &[]).await }).await?;

        let title = extract_title(&abc);
        Ok(TuneRecord::new(url, title, abc))
    }
}
