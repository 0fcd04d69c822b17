use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tune_scraper::apis::AbcNotationCrawler;
use tune_scraper::config::ScraperConfig;
use tune_scraper::error::ScraperError;
use tune_scraper::types::{ScrapeMode, TuneSource};

/// A local HTTP/1.1 server answering from a fixed route table. Routes match
/// the full request target first, then the bare path; anything else is 404.
struct CannedSite {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedSite {
    async fn start(routes: &[(&str, u16, &str)]) -> Self {
        let routes: Arc<HashMap<String, (u16, String)>> = Arc::new(
            routes
                .iter()
                .map(|(target, status, body)| (target.to_string(), (*status, body.to_string())))
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let seen = seen.clone();
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => head.extend_from_slice(&buf[..n]),
                        }
                    }
                    let head = String::from_utf8_lossy(&head);
                    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                    seen.lock().unwrap().push(target.clone());

                    let path = target.split('?').next().unwrap_or("/");
                    let (status, body) = routes
                        .get(&target)
                        .or_else(|| routes.get(path))
                        .cloned()
                        .unwrap_or((404, "not found".to_string()));
                    let response = format!(
                        "HTTP/1.1 {status} Canned\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { base_url, requests }
    }

    fn crawler(&self) -> AbcNotationCrawler {
        let config = ScraperConfig {
            base_url: self.base_url.clone(),
            ..Default::default()
        };
        AbcNotationCrawler::new(&config).unwrap()
    }

    fn url(&self, target: &str) -> String {
        format!("{}{}", self.base_url, target)
    }

    fn requested(&self, target: &str) -> bool {
        self.requests.lock().unwrap().iter().any(|r| r == target)
    }
}

const INLINE_PAGE: &str = r#"<html><body>
<pre>X:1
T:Kesh Jig
K:G
|:GAG GAB|ABA ABd:|</pre>
<a href="/dl/kesh.abc">abc</a>
</body></html>"#;

const LINK_ONLY_PAGE: &str = r#"<html><body><h3>Morrison's</h3><a href="/dl/morrison.abc">abc</a></body></html>"#;
const MISSING_DOWNLOAD_PAGE: &str = r#"<html><body><a href="/dl/missing.abc">abc</a></body></html>"#;
const BLANK_DOWNLOAD_PAGE: &str = r#"<html><body><a href="/dl/blank.abc">abc</a></body></html>"#;
const EMPTY_PAGE: &str = r#"<html><body><pre>no notation here</pre></body></html>"#;

async fn tune_site() -> CannedSite {
    CannedSite::start(&[
        ("/tunePage?a=kesh", 200, INLINE_PAGE),
        ("/tunePage?a=morrison", 200, LINK_ONLY_PAGE),
        ("/dl/morrison.abc", 200, "X:2\nT:Morrison's\nK:Em\nE2B B2A|"),
        ("/tunePage?a=missing", 200, MISSING_DOWNLOAD_PAGE),
        ("/tunePage?a=blank", 200, BLANK_DOWNLOAD_PAGE),
        ("/dl/blank.abc", 200, "   \n"),
        ("/tunePage?a=empty", 200, EMPTY_PAGE),
        ("/tunePage?a=broken", 500, "server error"),
    ])
    .await
}

#[tokio::test]
async fn test_inline_block_is_used_without_downloading() {
    let site = tune_site().await;
    let record = site.crawler().fetch_tune(&site.url("/tunePage?a=kesh")).await.unwrap();

    assert_eq!(record.title, "Kesh Jig");
    assert!(record.content.starts_with("X:1"));
    assert_eq!(record.source_url, site.url("/tunePage?a=kesh"));
    assert!(!site.requested("/dl/kesh.abc"));
}

#[tokio::test]
async fn test_download_link_is_followed_when_no_block() {
    let site = tune_site().await;
    let record = site.crawler().fetch_tune(&site.url("/tunePage?a=morrison")).await.unwrap();

    assert_eq!(record.title, "Morrison's");
    assert_eq!(record.content, "X:2\nT:Morrison's\nK:Em\nE2B B2A|");
    assert!(site.requested("/dl/morrison.abc"));
}

#[tokio::test]
async fn test_extraction_failures() {
    let site = tune_site().await;
    let crawler = site.crawler();

    for target in ["/tunePage?a=missing", "/tunePage?a=blank", "/tunePage?a=empty"] {
        let result = crawler.fetch_tune(&site.url(target)).await;
        assert!(
            matches!(result, Err(ScraperError::Extraction { .. })),
            "{target} should fail extraction, got {result:?}"
        );
    }
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let site = tune_site().await;
    let result = site.crawler().fetch_tune(&site.url("/tunePage?a=broken")).await;

    match result {
        Err(ScraperError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_pages_through_results() {
    let site = CannedSite::start(&[
        ("/searchTunes?q=jig&f=c&o=a&s=0", 200, r#"<a href="/tunePage?a=one">One</a><a href="/tunePage?a=two">Two</a>"#),
        ("/searchTunes?q=jig&f=c&o=a&s=10", 200, r#"<a href="/tunePage?a=two">Two</a><a href="/tunePage?a=three">Three</a>"#),
    ])
    .await;

    let mode = ScrapeMode::Search {
        query: "jig".to_string(),
        pages: 2,
    };
    let urls = site.crawler().discover(&mode).await;

    assert!(site.requested("/searchTunes?q=jig&f=c&o=a&s=0"));
    assert!(site.requested("/searchTunes?q=jig&f=c&o=a&s=10"));
    assert_eq!(
        urls,
        vec![
            site.url("/tunePage?a=one"),
            site.url("/tunePage?a=two"),
            site.url("/tunePage?a=two"),
            site.url("/tunePage?a=three"),
        ]
    );
}

#[tokio::test]
async fn test_failed_listing_page_contributes_nothing() {
    let site = CannedSite::start(&[
        ("/browseTunes?n=0007", 200, r#"<a href="/tunePage?a=seven">Seven</a>"#),
        ("/browseTunes?n=0008", 503, "unavailable"),
        ("/browseTunes?n=0009", 200, r#"<a href="/tunePage?a=nine">Nine</a>"#),
    ])
    .await;

    let urls = site.crawler().browse_tunes(7, 3).await;

    assert!(site.requested("/browseTunes?n=0008"));
    assert_eq!(urls, vec![site.url("/tunePage?a=seven"), site.url("/tunePage?a=nine")]);
}
