//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end through the HTTP renderer.

use std::sync::Arc;
use std::time::Duration;
use sumi_harvest::config::{parse_config, Config, OutputFormat};
use sumi_harvest::crawler::{CrawlReport, Crawler, HttpRenderer};
use sumi_harvest::output::open_sink;
use sumi_harvest::state::PageState;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration tuned for fast local runs
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.workers = 2;
    config.crawler.request_delay_ms = 0;
    config.crawler.idle_timeout_ms = 500;
    config.fetch.page_load_timeout_ms = 2_000;
    config.fetch.retry_delay_ms = 10;
    config.user_agent.crawler_name = "TestHarvester".to_string();
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

async fn run_crawl(config: &Config, seed: &str) -> CrawlReport {
    let renderer = Arc::new(HttpRenderer::new(&config.user_agent));
    let crawler = Crawler::new(config, seed, renderer).expect("Failed to create crawler");
    crawler.run().await.expect("Crawl failed")
}

fn sorted_paths(report: &CrawlReport) -> Vec<String> {
    let mut paths: Vec<String> = report
        .records
        .iter()
        .map(|r| url::Url::parse(&r.url).unwrap().path().to_string())
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<main><h1>Home</h1><p>Welcome</p></main>
           <a href="/page1">Page 1</a>
           <a href="/page2">Page 2</a>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<main>Content 1</main>
           <a href="/page2">Page 2 again</a>
           <a href="http://other.invalid/elsewhere">Elsewhere</a>
           <a href="mailto:team@example.com">Mail</a>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/page2",
        r#"<div class="container">Content 2</div>"#,
    )
    .await;

    let config = create_test_config();
    let report = run_crawl(&config, &format!("{}/", mock_server.uri())).await;

    assert_eq!(sorted_paths(&report), vec!["/", "/page1", "/page2"]);

    let home = report
        .records
        .iter()
        .find(|r| r.url.ends_with('/'))
        .expect("home page recorded");
    assert_eq!(home.content, "Home\nWelcome");

    let page2 = report
        .records
        .iter()
        .find(|r| r.url.ends_with("/page2"))
        .expect("page2 recorded");
    assert_eq!(page2.content, "Content 2");

    // Each page requested exactly once
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_failing_page_does_not_stop_crawl() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<main>Home</main>
           <a href="/broken">Broken</a>
           <a href="/missing">Missing</a>
           <a href="/fine">Fine</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/fine", "<main>Fine</main>").await;

    let report = run_crawl(&create_test_config(), &mock_server.uri()).await;

    assert_eq!(sorted_paths(&report), vec!["/", "/fine"]);
    assert_eq!(report.statistics.count(PageState::Failed), 2);
    assert_eq!(report.statistics.count(PageState::Processed), 2);
}

#[tokio::test]
async fn test_non_html_content_skipped() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<main>Home</main><a href="/report.pdf">Report</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let report = run_crawl(&create_test_config(), &mock_server.uri()).await;

    assert_eq!(sorted_paths(&report), vec!["/"]);
    assert_eq!(report.statistics.count(PageState::Failed), 1);
}

#[tokio::test]
async fn test_slow_page_retried_until_it_loads() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<main>Home</main><a href="/slow">Slow</a>"#).await;

    // First two loads stall past the navigation timeout
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("<main>Stalled</main>").set_delay(Duration::from_secs(2)))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("<main>Finally</main>"))
        .with_priority(2)
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.fetch.page_load_timeout_ms = 300;
    config.crawler.idle_timeout_ms = 5_000;

    let report = run_crawl(&config, &mock_server.uri()).await;

    let slow: Vec<_> = report
        .records
        .iter()
        .filter(|r| r.url.ends_with("/slow"))
        .collect();
    assert_eq!(slow.len(), 1);
    assert_eq!(slow[0].content, "Finally");
}

#[tokio::test]
async fn test_page_that_always_times_out() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<main>Home</main><a href="/hang">Hang</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/hang"))
        .respond_with(html_page("<main>Never</main>").set_delay(Duration::from_secs(2)))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.fetch.page_load_timeout_ms = 200;
    config.crawler.idle_timeout_ms = 5_000;

    let report = run_crawl(&config, &mock_server.uri()).await;

    assert_eq!(sorted_paths(&report), vec!["/"]);
    assert_eq!(report.statistics.count(PageState::TimedOut), 1);
}

#[tokio::test]
async fn test_max_pages_respected() {
    let mock_server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">P{}</a>"#, i, i))
        .collect();
    mount_page(&mock_server, "/", &format!("<main>Hub</main>{}", links)).await;
    for i in 0..10 {
        mount_page(&mock_server, &format!("/p{}", i), "<main>Leaf</main>").await;
    }

    let mut config = create_test_config();
    config.crawler.max_pages = Some(4);

    let report = run_crawl(&config, &mock_server.uri()).await;

    assert_eq!(report.records.len(), 4);
}

#[tokio::test]
async fn test_unreachable_seed_completes_without_records() {
    // Bind and drop a listener to find a port nothing is listening on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let report = run_crawl(&create_test_config(), &format!("http://127.0.0.1:{}/", port)).await;

    assert!(report.records.is_empty());
    assert_eq!(report.statistics.count(PageState::Failed), 1);
}

#[tokio::test]
async fn test_config_file_drives_extraction_and_output() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/docs",
        r#"<main>Navigation chrome</main>
           <article>Docs body</article>
           <a href="/docs/intro">Intro</a>
           <a href="/blog">Blog</a>"#,
    )
    .await;
    mount_page(&mock_server, "/docs/intro", "<article>Intro body</article>").await;
    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(html_page("<article>Blog</article>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("harvest.jsonl");
    let toml = format!(
        r#"
[crawler]
workers = 1
request-delay-ms = 0
idle-timeout-ms = 500
scope-prefix = "/docs"

[extract]
content-selectors = ["article"]

[output]
path = "{}"
format = "jsonl"
"#,
        output_path.display()
    );
    let config = parse_config(&toml).unwrap();
    assert_eq!(config.output.format, OutputFormat::Jsonl);

    let mut sink = open_sink(config.output.format, &output_path).unwrap();
    let report = run_crawl(&config, &format!("{}/docs", mock_server.uri())).await;
    sink.write_records(&report.records).unwrap();
    sink.finish().unwrap();

    let written = std::fs::read_to_string(&output_path).unwrap();
    let lines: Vec<serde_json::Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    let mut contents: Vec<&str> = lines
        .iter()
        .map(|line| line["content"].as_str().unwrap())
        .collect();
    contents.sort();
    assert_eq!(contents, vec!["Docs body", "Intro body"]);
}

#[tokio::test]
async fn test_text_output_layout() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "<main>Only page</main>").await;

    let report = run_crawl(&create_test_config(), &mock_server.uri()).await;

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("scraped_data.txt");
    let mut sink = open_sink(OutputFormat::Text, &output_path).unwrap();
    sink.write_records(&report.records).unwrap();
    sink.finish().unwrap();

    let written = std::fs::read_to_string(&output_path).unwrap();
    let expected = format!(
        "URL: {}/\nContent:\nOnly page\n{}\n",
        mock_server.uri(),
        "-".repeat(80)
    );
    assert_eq!(written, expected);
}

fn harvest_command() -> tokio::process::Command {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_sumi-harvest"))
}

#[tokio::test]
async fn test_rejected_seed_leaves_existing_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("scraped_data.txt");
    std::fs::write(&output_path, "earlier harvest\n").unwrap();

    for seed in ["javascript:void(0)", "not a url"] {
        let output = harvest_command()
            .arg(seed)
            .arg("-o")
            .arg(&output_path)
            .arg("-q")
            .output()
            .await
            .expect("Failed to run binary");

        assert!(!output.status.success(), "{} should be rejected", seed);
        assert_eq!(
            std::fs::read_to_string(&output_path).unwrap(),
            "earlier harvest\n"
        );
    }
}

#[tokio::test]
async fn test_binary_writes_harvest() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", r#"<main>Hello</main><a href="/next">Next</a>"#).await;
    mount_page(&mock_server, "/next", "<main>World</main>").await;

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("harvest.jsonl");

    let output = harvest_command()
        .arg(mock_server.uri())
        .arg("-o")
        .arg(&output_path)
        .args(["--delay-ms", "0", "--format", "jsonl", "-w", "1", "-q"])
        .output()
        .await
        .expect("Failed to run binary");

    assert!(output.status.success());
    let written = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(written.lines().count(), 2);
    assert!(written.contains("Hello"));
    assert!(written.contains("World"));
}
