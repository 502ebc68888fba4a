//! Integration tests for the crawler
//!
//! Most tests drive the full crawl cycle through an in-memory fetcher so
//! that slow, failing and panicking pages can be scripted. The HTTP fetcher
//! is exercised end-to-end against wiremock servers.

use async_trait::async_trait;
use scopecrawl::config::CrawlConfig;
use scopecrawl::crawler::{
    crawl, crawl_with_fetcher, CaptureOptions, CrawlStatus, FetchError, FetchedPage, PageFetcher,
};
use scopecrawl::output::safe_filename;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// How the static fetcher answers one URL
#[derive(Clone)]
enum Page {
    Html(&'static str),
    /// Rendered links reported alongside empty HTML
    Links(Vec<&'static str>),
    Slow(Duration),
    Fail(u16),
    Panic,
}

/// In-memory fetcher keyed by full URL; unknown URLs are 404s
struct StaticFetcher {
    pages: HashMap<String, Page>,
    fetched: Mutex<Vec<String>>,
}

impl StaticFetcher {
    fn new(pages: Vec<(&str, Page)>) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .into_iter()
                .map(|(url, page)| (url.to_string(), page))
                .collect(),
            fetched: Mutex::new(Vec::new()),
        })
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &Url, _capture: CaptureOptions) -> Result<FetchedPage, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());

        match self.pages.get(url.as_str()).cloned() {
            Some(Page::Html(html)) => Ok(FetchedPage::new(url.clone(), html)),
            Some(Page::Links(links)) => Ok(FetchedPage::new(url.clone(), "").with_links(links)),
            Some(Page::Slow(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(FetchedPage::new(url.clone(), "<p>finally</p>"))
            }
            Some(Page::Fail(status)) => Err(FetchError::Http { status }),
            Some(Page::Panic) => panic!("renderer crashed on {}", url),
            None => Err(FetchError::Http { status: 404 }),
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}

fn config(start: &str) -> CrawlConfig {
    CrawlConfig::new([start])
}

fn sorted(mut urls: Vec<String>) -> Vec<String> {
    urls.sort();
    urls
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_stays_on_host() {
    let fetcher = StaticFetcher::new(vec![
        (
            "https://example.com/",
            Page::Html(r#"<a href="/a">A</a><a href="/b">B</a><a href="https://other.com/c">C</a>"#),
        ),
        ("https://example.com/a", Page::Html("<p>a</p>")),
        ("https://example.com/b", Page::Html("<p>b</p>")),
    ]);

    let report = crawl_with_fetcher(config("https://example.com/"), fetcher.clone())
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(
        sorted(report.discovered.clone()),
        vec![
            "https://example.com/",
            "https://example.com/a",
            "https://example.com/b"
        ]
    );
    assert!(!fetcher.fetched().iter().any(|u| u.contains("other.com")));
}

#[tokio::test]
async fn test_excluded_paths_never_fetched_or_reported() {
    let fetcher = StaticFetcher::new(vec![
        (
            "https://example.com/",
            Page::Html(r#"<a href="/private/x">secret</a><a href="/public">open</a>"#),
        ),
        ("https://example.com/public", Page::Html("")),
        ("https://example.com/private/x", Page::Html("")),
    ]);
    let mut config = config("https://example.com/");
    config.crawler.exclude = vec!["/private".to_string()];

    let report = crawl_with_fetcher(config, fetcher.clone()).await.unwrap();

    assert!(!report.contains("https://example.com/private/x"));
    assert!(report.contains("https://example.com/public"));
    assert!(!fetcher.fetched().iter().any(|u| u.contains("/private")));
}

#[tokio::test]
async fn test_exclude_with_trailing_slash_matches_directory_links() {
    let fetcher = StaticFetcher::new(vec![
        (
            "https://example.com/",
            Page::Html(r#"<a href="/private/">secret</a><a href="/pub">open</a>"#),
        ),
        ("https://example.com/private/", Page::Html("")),
        ("https://example.com/pub", Page::Html("")),
    ]);
    let mut config = config("https://example.com/");
    config.crawler.exclude = vec!["/private/".to_string()];

    let report = crawl_with_fetcher(config, fetcher.clone()).await.unwrap();

    assert_eq!(report.discovered, vec!["https://example.com/", "https://example.com/pub"]);
    assert!(!fetcher.fetched().iter().any(|u| u.contains("/private")));
}

#[tokio::test]
async fn test_request_timeout_is_reported_and_not_persisted() {
    let temp = TempDir::new().unwrap();
    let fetcher = StaticFetcher::new(vec![
        (
            "https://example.com/",
            Page::Html(r#"<a href="/slow">slow</a><a href="/fast">fast</a>"#),
        ),
        ("https://example.com/slow", Page::Slow(Duration::from_secs(30))),
        ("https://example.com/fast", Page::Html("<p>fast</p>")),
    ]);
    let mut config = config("https://example.com/");
    config.fetch.request_timeout_secs = 1;
    config.output.dir = temp.path().to_path_buf();
    config.output.save_html = true;

    let report = crawl_with_fetcher(config, fetcher).await.unwrap();

    let slow = Url::parse("https://example.com/slow").unwrap();
    assert_eq!(report.status, CrawlStatus::Completed);
    assert!(report.contains("https://example.com/slow"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, "https://example.com/slow");
    assert_eq!(report.failures[0].kind, "timeout");

    let files = files_in(temp.path());
    assert_eq!(files.len(), 2);
    assert!(!files.contains(&safe_filename(&slow, "html")));
}

#[tokio::test]
async fn test_cycles_terminate() {
    let fetcher = StaticFetcher::new(vec![
        ("https://example.com/", Page::Html(r#"<a href="/a">A</a>"#)),
        ("https://example.com/a", Page::Html(r#"<a href="/b">B</a><a href="/">home</a>"#)),
        ("https://example.com/b", Page::Html(r#"<a href="/a/">A</a><a href="/b#self">B</a>"#)),
    ]);

    let report = crawl_with_fetcher(config("https://example.com/"), fetcher.clone())
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.discovered.len(), 3);
    // Each page fetched exactly once
    assert_eq!(fetcher.fetched().len(), 3);
}

#[tokio::test]
async fn test_recrawl_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let pages = || {
        StaticFetcher::new(vec![
            (
                "https://example.com/",
                Page::Html(r#"<html><head><title>Home</title></head><body><a href="/docs/intro">Intro</a></body></html>"#),
            ),
            ("https://example.com/docs/intro", Page::Html("<h1>Intro</h1><p>Welcome</p>")),
        ])
    };
    let mut config = config("https://example.com/");
    config.output.dir = temp.path().to_path_buf();
    config.output.save_html = true;
    config.output.save_markdown = true;

    let first = crawl_with_fetcher(config.clone(), pages()).await.unwrap();
    let html_files = files_in(&temp.path().join("html"));
    let markdown_files = files_in(&temp.path().join("markdown"));
    let contents: Vec<String> = markdown_files
        .iter()
        .map(|name| std::fs::read_to_string(temp.path().join("markdown").join(name)).unwrap())
        .collect();

    let second = crawl_with_fetcher(config, pages()).await.unwrap();

    assert_eq!(sorted(first.discovered), sorted(second.discovered));
    assert_eq!(files_in(&temp.path().join("html")), html_files);
    assert_eq!(files_in(&temp.path().join("markdown")), markdown_files);
    assert_eq!(html_files.len(), 2);
    for (name, content) in markdown_files.iter().zip(contents) {
        let again = std::fs::read_to_string(temp.path().join("markdown").join(name)).unwrap();
        assert_eq!(again, content);
    }
}

#[tokio::test]
async fn test_single_worker_is_breadth_first() {
    let fetcher = StaticFetcher::new(vec![
        ("https://example.com/", Page::Html(r#"<a href="/a">A</a><a href="/b">B</a>"#)),
        ("https://example.com/a", Page::Html(r#"<a href="/a/deep">deep</a>"#)),
        ("https://example.com/b", Page::Html(r#"<a href="/c">C</a>"#)),
        ("https://example.com/a/deep", Page::Html("")),
        ("https://example.com/c", Page::Html("")),
    ]);
    let mut config = config("https://example.com/");
    config.crawler.max_concurrency = 1;

    let report = crawl_with_fetcher(config, fetcher.clone()).await.unwrap();

    let expected = vec![
        "https://example.com/",
        "https://example.com/a",
        "https://example.com/b",
        "https://example.com/a/deep",
        "https://example.com/c",
    ];
    assert_eq!(report.discovered, expected);
    assert_eq!(fetcher.fetched(), expected);
}

#[tokio::test]
async fn test_crawl_timeout_returns_partial_result() {
    let fetcher = StaticFetcher::new(vec![
        (
            "https://example.com/",
            Page::Html(r#"<a href="/stuck1">1</a><a href="/stuck2">2</a>"#),
        ),
        ("https://example.com/stuck1", Page::Slow(Duration::from_secs(60))),
        ("https://example.com/stuck2", Page::Slow(Duration::from_secs(60))),
    ]);
    let mut config = config("https://example.com/");
    config.crawler.timeout_secs = Some(1);
    config.crawler.grace_period_secs = 0;

    let started = Instant::now();
    let report = crawl_with_fetcher(config, fetcher).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.status, CrawlStatus::TimedOut);
    assert_eq!(report.discovered.len(), 3);
    assert_eq!(report.counts.fetched, 1);
    assert_eq!(report.counts.failed, 2);
    assert!(report.failures.iter().all(|f| f.kind == "aborted"));
}

#[tokio::test]
async fn test_fetcher_faults_do_not_stop_the_crawl() {
    let fetcher = StaticFetcher::new(vec![
        (
            "https://example.com/",
            Page::Links(vec![
                "/boom",
                "/error",
                "/ok",
                "http://[broken",
                "mailto:someone@example.com",
            ]),
        ),
        ("https://example.com/boom", Page::Panic),
        ("https://example.com/error", Page::Fail(503)),
        ("https://example.com/ok", Page::Html("")),
    ]);

    let report = crawl_with_fetcher(config("https://example.com/"), fetcher)
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.discovered.len(), 4);
    assert_eq!(report.counts.fetched, 2);
    assert_eq!(report.counts.failed, 2);
    assert_eq!(report.malformed_links, 2);

    let kinds: HashMap<String, String> = report
        .failures
        .iter()
        .map(|f| (f.url.clone(), f.kind.clone()))
        .collect();
    assert_eq!(kinds["https://example.com/boom"], "panicked");
    assert_eq!(kinds["https://example.com/error"], "http");
}

#[tokio::test]
async fn test_skipped_extensions_are_discovered_not_fetched() {
    let fetcher = StaticFetcher::new(vec![(
        "https://example.com/",
        Page::Html(r#"<a href="/files/report.pdf">pdf</a><a href="/files/archive.zip">zip</a>"#),
    )]);

    let report = crawl_with_fetcher(config("https://example.com/"), fetcher.clone())
        .await
        .unwrap();

    assert!(report.contains("https://example.com/files/report.pdf"));
    assert!(report.contains("https://example.com/files/archive.zip"));
    assert_eq!(report.counts.skipped, 2);
    assert_eq!(fetcher.fetched(), vec!["https://example.com/"]);
}

#[tokio::test]
async fn test_http_and_https_unify() {
    let fetcher = StaticFetcher::new(vec![
        (
            "http://example.com/",
            Page::Html(r#"<a href="http://example.com/a">A</a><a href="https://example.com/a">A</a>"#),
        ),
        ("https://example.com/a", Page::Html("")),
    ]);

    let report = crawl_with_fetcher(config("http://example.com/"), fetcher)
        .await
        .unwrap();

    assert_eq!(report.discovered.len(), 2);
    assert!(report.contains("https://example.com/a"));
    assert!(!report.contains("http://example.com/a"));
}

#[tokio::test]
async fn test_links_file_written() {
    let temp = TempDir::new().unwrap();
    let links_path = temp.path().join("links.json");
    let fetcher = StaticFetcher::new(vec![
        ("https://example.com/", Page::Html(r#"<a href="/a">A</a>"#)),
        ("https://example.com/a", Page::Html("")),
    ]);
    let mut config = config("https://example.com/");
    config.output.links_file = Some(links_path.clone());

    let report = crawl_with_fetcher(config, fetcher).await.unwrap();

    let written: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(&links_path).unwrap()).unwrap();
    assert_eq!(written, report.discovered);
}

// ===== HTTP fetcher against wiremock =====

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_http_crawl_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
                <a href="/page1">Page 1</a>
                <a href="/page2">Page 2</a>
                <a href="/report">Report</a>
                <a href="/missing">Missing</a>
                <a href="https://other.example/elsewhere">Elsewhere</a>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(r#"<a href="/">Home</a><a href="page2">Two</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html("<p>Page 2</p>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let mut config = config(&format!("{}/", base_url));
    config.output.dir = temp.path().to_path_buf();
    config.output.save_markdown = true;

    let report = crawl(config).await.unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.discovered.len(), 5);
    assert_eq!(report.counts.fetched, 3);
    assert_eq!(report.counts.failed, 2);

    let kinds: HashMap<String, String> = report
        .failures
        .iter()
        .map(|f| (f.url.clone(), f.kind.clone()))
        .collect();
    assert_eq!(kinds[&format!("{}/report", base_url)], "content_mismatch");
    assert_eq!(kinds[&format!("{}/missing", base_url)], "http");

    let saved = files_in(temp.path());
    assert_eq!(saved.len(), 3);
    assert!(saved.iter().all(|name| name.ends_with(".md")));
}

#[tokio::test]
async fn test_http_redirect_resolves_against_final_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let location = format!("{}/new/", base_url);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/old">Old</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", location.as_str()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(html(r#"<a href="child">Child</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new/child"))
        .respond_with(html("<p>child</p>"))
        .mount(&mock_server)
        .await;

    let report = crawl(config(&format!("{}/", base_url))).await.unwrap();

    assert!(report.contains(&format!("{}/new/child", base_url)));
    // Resolving against the pre-redirect URL would have produced /child
    assert!(!report.contains(&format!("{}/child", base_url)));
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_http_directory_url_fetched_as_written() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // The server answers both forms directly, without redirecting
    for dir in ["/docs", "/docs/"] {
        Mock::given(method("GET"))
            .and(path(dir))
            .respond_with(html(r#"<a href="intro">Intro</a>"#))
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/docs/intro"))
        .respond_with(html("<p>intro</p>"))
        .mount(&mock_server)
        .await;

    let report = crawl(config(&format!("{}/docs/", base_url))).await.unwrap();

    assert_eq!(
        report.discovered,
        vec![format!("{}/docs/", base_url), format!("{}/docs/intro", base_url)]
    );
    assert!(!report.contains(&format!("{}/intro", base_url)));
    assert!(report.failures.is_empty());

    let requested: Vec<String> = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();
    assert_eq!(requested, vec!["/docs/", "/docs/intro"]);
}
