//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! fetching, batching, discovery and analysis end-to-end.

use skewer::analysis::{ComparisonMetric, DuplicateKind};
use skewer::config::{CrawlConfig, CrawlOverrides};
use skewer::crawler::{Crawler, FetchCache, PageOutcome};
use skewer::monitor::WatchEvent;
use skewer::output::ChangeFrequency;
use skewer::robots::RobotsCache;
use skewer::url::UrlCategory;
use skewer::{ConfigError, SkewerError, TransportError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a crawl configuration suited to a local mock server
fn test_config() -> CrawlConfig {
    CrawlConfig {
        user_agent: "SkewerTest/1.0".to_string(),
        timeout_ms: 5_000,
        retries: 1,
        retry_backoff_ms: 1,
        ..CrawlConfig::default()
    }
}

fn create_crawler(config: CrawlConfig) -> Crawler {
    Crawler::new(
        config,
        Arc::new(FetchCache::default()),
        Arc::new(RobotsCache::new()),
    )
    .expect("Failed to build crawler")
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    let body: String = body.into();
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn page_with_links(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><p>{} body text.</p>{}</body></html>",
        title, title, anchors
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", page_with_links("Home", &[])).await;

    let crawler = create_crawler(test_config());
    let url = format!("{}/", mock_server.uri());
    let result = crawler
        .fetch(&url, &CrawlOverrides::default())
        .await
        .expect("Fetch failed");

    assert_eq!(result.status_code, 200);
    assert_eq!(result.url, url);
    assert_eq!(result.final_url, url);
    assert_eq!(result.encoding, "UTF-8");
    assert!(result.body.contains("<title>Home</title>"));
    assert_eq!(result.size, result.raw_body.len());
    assert!(result.content_type.starts_with("text/html"));
    assert!(result.header("Content-Type").is_some());
}

#[tokio::test]
async fn test_client_error_is_a_normal_result() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        retries: 3,
        ..test_config()
    });
    let result = crawler
        .fetch(
            &format!("{}/missing", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .expect("404 should not be an error");

    assert_eq!(result.status_code, 404);
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_server_errors_use_every_attempt() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        retries: 3,
        ..test_config()
    });
    let err = crawler
        .fetch(
            &format!("{}/down", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .unwrap_err();

    match err {
        SkewerError::FetchFailed {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, TransportError::ServerStatus(503)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_retry_recovers_after_transient_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/flaky", page_with_links("Recovered", &[])).await;

    let crawler = create_crawler(CrawlConfig {
        retries: 2,
        ..test_config()
    });
    let result = crawler
        .fetch(
            &format!("{}/flaky", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .expect("Second attempt should succeed");

    assert_eq!(result.status_code, 200);
    assert!(result.body.contains("Recovered"));
}

#[tokio::test]
async fn test_robots_disallow_blocks_before_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/public", page_with_links("Public", &[])).await;

    let crawler = create_crawler(test_config());
    let err = crawler
        .fetch(
            &format!("{}/private", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SkewerError::RobotsDisallowed { .. }));

    // Same origin: the cached policy is reused
    let result = crawler
        .fetch(
            &format!("{}/public", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .expect("Public page should be allowed");
    assert_eq!(result.status_code, 200);
    assert_eq!(crawler.fetcher().robots_cache().len(), 1);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/admin", page_with_links("Admin", &[])).await;

    let crawler = create_crawler(test_config());
    let result = crawler
        .fetch(
            &format!("{}/admin", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_robots_can_be_ignored_per_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", page_with_links("Home", &[])).await;

    let crawler = create_crawler(test_config());
    let overrides = CrawlOverrides {
        respect_robots: Some(false),
        ..CrawlOverrides::default()
    };
    let result = crawler
        .fetch(&format!("{}/", mock_server.uri()), &overrides)
        .await;
    assert!(result.is_ok());
    // defaults are untouched by the override
    assert!(crawler.defaults().respect_robots);
}

#[tokio::test]
async fn test_cache_serves_repeated_fetches() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(html(page_with_links("Cached", &[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        cache_enabled: true,
        respect_robots: false,
        ..test_config()
    });
    let url = format!("{}/cached", mock_server.uri());

    let first = crawler
        .fetch(&url, &CrawlOverrides::default())
        .await
        .expect("First fetch failed");
    let second = crawler
        .fetch(&url, &CrawlOverrides::default())
        .await
        .expect("Second fetch failed");

    assert_eq!(first.body, second.body);
    assert_eq!(first.fetched_at, second.fetched_at);
    assert_eq!(crawler.fetcher().cache().len(), 1);
}

#[tokio::test]
async fn test_charset_from_content_type_header() {
    let mock_server = MockServer::start().await;
    // "café" in windows-1252
    let body = b"<html><body><p>caf\xE9</p></body></html>".to_vec();
    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=windows-1252"),
        )
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        ..test_config()
    });
    let result = crawler
        .fetch(
            &format!("{}/latin", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .expect("Fetch failed");

    assert_eq!(result.encoding, "windows-1252");
    assert!(result.body.contains("café"));
}

#[tokio::test]
async fn test_charset_from_meta_tag() {
    let mock_server = MockServer::start().await;
    let body =
        b"<html><head><meta charset=\"iso-8859-1\"></head><body><p>na\xEFve</p></body></html>"
            .to_vec();
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        ..test_config()
    });
    let result = crawler
        .fetch(
            &format!("{}/meta", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .expect("Fetch failed");

    // encoding_rs maps ISO-8859-1 onto windows-1252
    assert_eq!(result.encoding, "windows-1252");
    assert!(result.body.contains("naïve"));
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/new", page_with_links("New", &[])).await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        ..test_config()
    });
    let result = crawler
        .fetch(
            &format!("{}/old", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .expect("Redirect should be followed");

    assert_eq!(result.url, format!("{}/old", mock_server.uri()));
    assert_eq!(result.final_url, format!("{}/new", mock_server.uri()));
    assert_eq!(result.status_code, 200);
}

#[tokio::test]
async fn test_redirect_loop_fails_without_retry() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop-a"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop-b"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/loop-b"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop-a"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        retries: 3,
        ..test_config()
    });
    let err = crawler
        .fetch(
            &format!("{}/loop-a", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .unwrap_err();

    match err {
        SkewerError::FetchFailed {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 1);
            assert!(matches!(source, TransportError::RedirectLoop(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_redirect_budget() {
    let mock_server = MockServer::start().await;
    for (from, to) in [("/r1", "/r2"), ("/r2", "/r3"), ("/r3", "/r4")] {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", to))
            .mount(&mock_server)
            .await;
    }

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        max_redirects: 1,
        ..test_config()
    });
    let err = crawler
        .fetch(
            &format!("{}/r1", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SkewerError::FetchFailed {
            source: TransportError::TooManyRedirects(1),
            ..
        }
    ));
}

#[tokio::test]
async fn test_batch_keeps_input_order() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(page_with_links("A", &[])).set_delay(Duration::from_millis(150)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/c", page_with_links("C", &[])).await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        concurrency: 2,
        ..test_config()
    });
    let urls: Vec<String> = ["/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{}", mock_server.uri(), p))
        .collect();

    let outcomes = crawler.crawl_batch(&urls, &CrawlOverrides::default()).await;

    assert_eq!(outcomes.len(), 3);
    for (outcome, url) in outcomes.iter().zip(&urls) {
        assert_eq!(outcome.url(), url);
    }
    match &outcomes[0] {
        PageOutcome::Crawled(page) => {
            assert_eq!(page.page.metadata.title.as_deref(), Some("A"));
        }
        other => panic!("expected crawled page, got {:?}", other),
    }
    assert!(matches!(&outcomes[1], PageOutcome::Failed { .. }));
    assert!(outcomes[2].is_crawled());
}

#[tokio::test]
async fn test_monitor_records_every_fetch() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/ok", page_with_links("Ok", &[])).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        concurrency: 3,
        ..test_config()
    });
    let urls: Vec<String> = ["/ok", "/missing", "/down"]
        .iter()
        .map(|p| format!("{}{}", mock_server.uri(), p))
        .collect();
    crawler.crawl_batch(&urls, &CrawlOverrides::default()).await;

    let stats = crawler.performance();
    assert_eq!(stats.metrics.requests, 3);
    assert_eq!(stats.metrics.failures, 1);
    assert_eq!(stats.metrics.status_codes.get(&200), Some(&1));
    assert_eq!(stats.metrics.status_codes.get(&404), Some(&1));
    assert_eq!(stats.metrics.domains.get("127.0.0.1"), Some(&2));
    assert!(stats.metrics.fastest.is_some());

    crawler.reset_performance();
    assert_eq!(crawler.performance().metrics.requests, 0);
}

#[tokio::test]
async fn test_discover_follows_links_to_max_depth() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", page_with_links("Home", &["/p1", "/p2"])).await;
    mount_page(&mock_server, "/p1", page_with_links("P1", &["/", "/p1/deep"])).await;
    mount_page(&mock_server, "/p2", page_with_links("P2", &["/p1"])).await;
    Mock::given(method("GET"))
        .and(path("/p1/deep"))
        .respond_with(html(page_with_links("Deep", &[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        max_depth: 1,
        ..test_config()
    });
    let base = mock_server.uri();
    let report = crawler
        .discover(&format!("{}/", base), &CrawlOverrides::default())
        .await
        .expect("Discovery failed");

    assert_eq!(
        report.discovered_urls,
        vec![format!("{}/p1", base), format!("{}/p2", base)]
    );
    assert_eq!(report.stats.total_urls, 2);
    assert_eq!(report.stats.crawled, 3);
    assert_eq!(report.stats.failed, 0);

    let depths: Vec<usize> = report.pages.iter().map(|(depth, _)| *depth).collect();
    assert_eq!(depths, vec![0, 1, 1]);
}

#[tokio::test]
async fn test_discover_applies_url_pattern() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_page(
        &mock_server,
        "/",
        page_with_links("Home", &["/blog/first", "/shop/item"]),
    )
    .await;
    mount_page(&mock_server, "/blog/first", page_with_links("First", &[])).await;
    Mock::given(method("GET"))
        .and(path("/shop/item"))
        .respond_with(html(page_with_links("Item", &[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        ..test_config()
    });
    let overrides = CrawlOverrides {
        url_pattern: Some(Some(format!("{}/blog/*", base))),
        ..CrawlOverrides::default()
    };
    let report = crawler
        .discover(&format!("{}/", base), &overrides)
        .await
        .expect("Discovery failed");

    assert_eq!(report.discovered_urls, vec![format!("{}/blog/first", base)]);
    assert_eq!(report.stats.crawled, 2);
}

#[tokio::test]
async fn test_discover_with_zero_budget_fetches_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("unused"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(test_config());
    let overrides = CrawlOverrides {
        max_urls: Some(0),
        ..CrawlOverrides::default()
    };
    let report = crawler
        .discover(&format!("{}/", mock_server.uri()), &overrides)
        .await
        .expect("Discovery failed");

    assert!(report.discovered_urls.is_empty());
    assert!(report.pages.is_empty());
}

#[tokio::test]
async fn test_discover_stops_at_url_budget() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        page_with_links("Home", &["/1", "/2", "/3", "/4"]),
    )
    .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        max_urls: 2,
        ..test_config()
    });
    let report = crawler
        .discover(&format!("{}/", mock_server.uri()), &CrawlOverrides::default())
        .await
        .expect("Discovery failed");

    assert_eq!(report.discovered_urls.len(), 2);
    // the budget is used up by the seed's links
    assert_eq!(report.stats.crawled, 1);
}

#[tokio::test]
async fn test_discover_skips_failed_pages() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", page_with_links("Home", &["/broken", "/fine"])).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/fine", page_with_links("Fine", &[])).await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        ..test_config()
    });
    let report = crawler
        .discover(&format!("{}/", mock_server.uri()), &CrawlOverrides::default())
        .await
        .expect("Discovery failed");

    assert_eq!(report.stats.crawled, 2);
    assert_eq!(report.stats.failed, 1);
}

#[tokio::test]
async fn test_check_links() {
    let mock_server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        concurrency: 2,
        ..test_config()
    });
    let urls: Vec<String> = ["/ok", "/gone", "/broken"]
        .iter()
        .map(|p| format!("{}{}", mock_server.uri(), p))
        .collect();
    let statuses = crawler
        .check_links(&urls, &CrawlOverrides::default())
        .await;

    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[0].status_code, 200);
    assert_eq!(statuses[0].status_text, "OK");
    assert!(!statuses[0].error);
    assert_eq!(statuses[1].status_code, 404);
    assert!(!statuses[1].error);
    assert_eq!(statuses[2].status_code, 500);
    assert!(statuses[2].error);
}

#[tokio::test]
async fn test_compare_reports_duplicates() {
    let mock_server = MockServer::start().await;
    let shared = "<html><body><p>The quick brown fox jumps over the lazy dog.</p></body></html>";
    mount_page(&mock_server, "/a", shared.to_string()).await;
    mount_page(&mock_server, "/b", shared.to_string()).await;
    mount_page(
        &mock_server,
        "/c",
        "<html><body><p>Completely unrelated prose about sailing.</p></body></html>".to_string(),
    )
    .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        concurrency: 3,
        ..test_config()
    });
    let urls: Vec<String> = ["/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{}", mock_server.uri(), p))
        .collect();

    let report = crawler
        .compare(&urls, 0.8, &CrawlOverrides::default())
        .await;

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.average_quality.is_some());
    assert_eq!(report.duplicates.len(), 1);
    assert_eq!(report.duplicates[0].first_url, urls[0]);
    assert_eq!(report.duplicates[0].second_url, urls[1]);
    assert_eq!(report.duplicates[0].kind, DuplicateKind::Exact);
    assert_eq!(report.performance.metrics.requests, 3);

    assert_eq!(crawler.similarity_records().len(), 3);
    assert_eq!(crawler.duplicates(0.8).len(), 1);
    crawler.clear_similarity_log();
    assert!(crawler.similarity_records().is_empty());
}

#[tokio::test]
async fn test_similarity_tracking_is_opt_in() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", page_with_links("Home", &[])).await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        ..test_config()
    });
    let url = format!("{}/", mock_server.uri());

    crawler
        .crawl_page(&url, &CrawlOverrides::default())
        .await
        .expect("Crawl failed");
    assert!(crawler.similarity_records().is_empty());

    let overrides = CrawlOverrides {
        track_similarity: Some(true),
        ..CrawlOverrides::default()
    };
    let page = crawler.crawl_page(&url, &overrides).await.expect("Crawl failed");
    let records = crawler.similarity_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, url);
    assert_eq!(records[0].text, page.page.text.content);
}

#[tokio::test]
async fn test_sitemap_entries() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", page_with_links("Home", &["/blog/post"])).await;
    mount_page(&mock_server, "/blog/post", page_with_links("Post", &[])).await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        ..test_config()
    });
    let entries = crawler
        .sitemap(&format!("{}/", mock_server.uri()), &CrawlOverrides::default())
        .await
        .expect("Sitemap failed");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].priority, 1.0);
    assert_eq!(entries[0].title.as_deref(), Some("Home"));
    assert_eq!(entries[1].change_freq, ChangeFrequency::Daily);
    assert_eq!(entries[1].priority, 0.6);
}

#[tokio::test]
async fn test_watch_reports_changes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/watched"))
        .respond_with(html(
            "<html><head><title>V1</title></head><body><p>alpha beta gamma delta</p></body></html>",
        ))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/watched",
        "<html><head><title>V2</title></head><body><p>entirely new words appear</p></body></html>"
            .to_string(),
    )
    .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        cache_enabled: true,
        ..test_config()
    });
    let (handle, mut events) = crawler
        .watch(
            &format!("{}/watched", mock_server.uri()),
            Duration::from_millis(20),
            &CrawlOverrides::default(),
        )
        .expect("Watch failed to start");

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("Watch produced no event")
        .expect("Watch channel closed");

    match event {
        WatchEvent::Checked(report) => {
            assert!(report.changed);
            assert!(report.title_changed);
            assert!(report.any_change());
        }
        other => panic!("unexpected event: {:?}", other),
    }

    handle.stop().await;
}

#[tokio::test]
async fn test_robots_redirect_is_followed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/real-robots.txt"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/real-robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html("secret"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(test_config());
    let err = crawler
        .fetch(
            &format!("{}/private", mock_server.uri()),
            &CrawlOverrides::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SkewerError::RobotsDisallowed { .. }));
}

#[tokio::test]
async fn test_robots_fetched_once_under_concurrency() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /admin")
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    for route in ["/p1", "/p2", "/p3", "/p4"] {
        mount_page(&mock_server, route, page_with_links(route, &[])).await;
    }

    let crawler = create_crawler(CrawlConfig {
        concurrency: 4,
        ..test_config()
    });
    let urls: Vec<String> = ["/p1", "/p2", "/p3", "/p4"]
        .iter()
        .map(|p| format!("{}{}", mock_server.uri(), p))
        .collect();

    let outcomes = crawler.crawl_batch(&urls, &CrawlOverrides::default()).await;

    assert!(outcomes.iter().all(PageOutcome::is_crawled));
    assert_eq!(crawler.fetcher().robots_cache().len(), 1);
}

#[tokio::test]
async fn test_check_links_follows_redirects() {
    let mock_server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/gone"))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/loop-a"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop-b"))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/loop-b"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop-a"))
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(test_config());
    let urls: Vec<String> = ["/old", "/loop-a"]
        .iter()
        .map(|p| format!("{}{}", mock_server.uri(), p))
        .collect();
    let statuses = crawler
        .check_links(&urls, &CrawlOverrides::default())
        .await;

    assert_eq!(statuses[0].url, urls[0]);
    assert_eq!(statuses[0].status_code, 404);
    assert!(!statuses[0].error);

    assert_eq!(statuses[1].status_code, 0);
    assert!(statuses[1].error);
}

#[tokio::test]
async fn test_watch_rejects_zero_interval() {
    let crawler = create_crawler(test_config());
    let result = crawler.watch(
        "https://example.com/",
        Duration::ZERO,
        &CrawlOverrides::default(),
    );
    assert!(matches!(
        result,
        Err(SkewerError::Config(ConfigError::Validation(_)))
    ));
}

/// Records when each request reaches the server
struct ArrivalRecorder {
    arrivals: Arc<Mutex<Vec<(String, Instant)>>>,
    slow_path: &'static str,
    slow_delay: Duration,
}

impl Respond for ArrivalRecorder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let route = request.url.path().to_string();
        self.arrivals
            .lock()
            .unwrap()
            .push((route.clone(), Instant::now()));

        let response = html(page_with_links(&route, &[]));
        if route == self.slow_path {
            response.set_delay(self.slow_delay)
        } else {
            response
        }
    }
}

#[tokio::test]
async fn test_batch_windows_wait_for_slowest_page() {
    let mock_server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    Mock::given(method("GET"))
        .respond_with(ArrivalRecorder {
            arrivals: Arc::clone(&arrivals),
            slow_path: "/b",
            slow_delay: Duration::from_millis(300),
        })
        .mount(&mock_server)
        .await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        concurrency: 2,
        delay_ms: 50,
        ..test_config()
    });
    let urls: Vec<String> = ["/a", "/b", "/c", "/d"]
        .iter()
        .map(|p| format!("{}{}", mock_server.uri(), p))
        .collect();

    let outcomes = crawler.crawl_batch(&urls, &CrawlOverrides::default()).await;
    assert!(outcomes.iter().all(PageOutcome::is_crawled));

    let arrivals = arrivals.lock().unwrap().clone();
    let arrived = |route: &str| {
        arrivals
            .iter()
            .find(|(p, _)| p == route)
            .map(|(_, at)| *at)
            .unwrap_or_else(|| panic!("{} never arrived", route))
    };
    let (a, b, c, d) = (arrived("/a"), arrived("/b"), arrived("/c"), arrived("/d"));

    // the first window runs concurrently
    let spread = if a > b { a - b } else { b - a };
    assert!(spread < Duration::from_millis(250), "spread {:?}", spread);

    // the second window starts only after /b responded, plus the window delay
    // and the per-request delay
    for later in [c, d] {
        assert!(
            later.duration_since(b) >= Duration::from_millis(400),
            "second window began {:?} after /b",
            later.duration_since(b)
        );
    }
}

#[tokio::test]
async fn test_compare_ranks_pages() {
    let mock_server = MockServer::start().await;
    let rich = r#"<html lang="en"><head><title>A well described page title here</title>
        <meta name="description" content="A description long enough to be useful for search engines and people alike.">
        <meta name="viewport" content="width=device-width"></head>
        <body><h1>Heading</h1><p>Some words that make up a paragraph of readable text.</p></body></html>"#;
    mount_page(&mock_server, "/rich", rich.to_string()).await;
    mount_page(&mock_server, "/bare", "<p>x</p>".to_string()).await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        concurrency: 2,
        ..test_config()
    });
    let urls: Vec<String> = ["/bare", "/rich"]
        .iter()
        .map(|p| format!("{}{}", mock_server.uri(), p))
        .collect();

    let report = crawler
        .compare(&urls, 0.8, &CrawlOverrides::default())
        .await;

    let leader = |metric| {
        report
            .best
            .iter()
            .find(|l| l.metric == metric)
            .map(|l| l.url.clone())
    };
    assert_eq!(report.best.len(), 3);
    assert_eq!(leader(ComparisonMetric::Quality), Some(urls[1].clone()));
    assert_eq!(leader(ComparisonMetric::Seo), Some(urls[1].clone()));
    // both pages are light, so the earlier one keeps the lead
    assert_eq!(leader(ComparisonMetric::Performance), Some(urls[0].clone()));

    let pages: Vec<_> = report.outcomes.iter().filter_map(PageOutcome::crawled).collect();
    let weak = pages.iter().filter(|p| p.quality.overall < 60).count();
    let expected_weak = format!("{} pages need significant quality improvements", weak);
    assert_eq!(
        weak > 0,
        report.recommendations.contains(&expected_weak),
        "recommendations: {:?}",
        report.recommendations
    );
    let average = report.average_quality.expect("Pages were crawled");
    assert_eq!(
        average < 70.0,
        report
            .recommendations
            .iter()
            .any(|r| r == "Overall quality needs improvement across all pages")
    );
}

#[tokio::test]
async fn test_discover_categorizes_urls() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        page_with_links("Home", &["/blog/news", "/about"]),
    )
    .await;
    mount_page(&mock_server, "/blog/news", page_with_links("News", &[])).await;
    mount_page(&mock_server, "/about", page_with_links("About", &[])).await;

    let crawler = create_crawler(CrawlConfig {
        respect_robots: false,
        ..test_config()
    });
    let report = crawler
        .discover(&format!("{}/", mock_server.uri()), &CrawlOverrides::default())
        .await
        .expect("Discovery failed");

    let news = format!("{}/blog/news", mock_server.uri());
    let about = format!("{}/about", mock_server.uri());
    assert_eq!(report.categories.get(UrlCategory::Blog), [news]);
    assert_eq!(report.categories.uncategorized, vec![about]);
}
