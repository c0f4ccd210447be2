// Tests for suite loading and execution

use sitesnap_capture::error::{CaptureError, Result as CaptureResultT};
use sitesnap_capture::{ArgosDirectory, CaptureStep, Driver, PageHandle, ScreenshotSink, Viewport};
use sitesnap_core::config::{DEFAULT_STYLESHEET, StylesheetSource, SuiteConfig};
use sitesnap_core::error::SuiteError;
use sitesnap_core::sitemap::SitemapSource;
use sitesnap_core::suite::{
    SuiteOptions, check_server, execute_suite, filter_cases, http_client, load_suite, plan_cases,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Fake browser
// ============================================================================

/// Records every URL visited and the CSS injected; pages whose URL ends in
/// `/stuck` never report hydration.
#[derive(Default)]
struct FakeDriver {
    visited: Arc<Mutex<Vec<String>>>,
    styles: Arc<Mutex<Vec<String>>>,
}

struct FakePage {
    url: Mutex<String>,
    visited: Arc<Mutex<Vec<String>>>,
    styles: Arc<Mutex<Vec<String>>>,
}

impl Driver for FakeDriver {
    type Page = FakePage;

    fn name(&self) -> String {
        "fake".to_string()
    }

    async fn open_page(&self, _viewport: Viewport) -> CaptureResultT<FakePage> {
        Ok(FakePage {
            url: Mutex::new(String::new()),
            visited: self.visited.clone(),
            styles: self.styles.clone(),
        })
    }
}

impl PageHandle for FakePage {
    async fn goto(&self, url: &str) -> CaptureResultT<()> {
        self.visited.lock().unwrap().push(url.to_string());
        *self.url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn evaluate_bool(&self, expression: &str) -> CaptureResultT<bool> {
        if expression.contains("data-has-hydrated") {
            return Ok(!self.url.lock().unwrap().ends_with("/stuck"));
        }
        Ok(true)
    }

    async fn add_style_tag(&self, css: &str) -> CaptureResultT<()> {
        self.styles.lock().unwrap().push(css.to_string());
        Ok(())
    }

    async fn screenshot(&self, _full_page: bool) -> CaptureResultT<Vec<u8>> {
        let url = self.url.lock().unwrap().clone();
        if url.is_empty() {
            return Err(CaptureError::ScreenshotError("no page loaded".into()));
        }
        Ok(url.into_bytes())
    }

    async fn close(self) -> CaptureResultT<()> {
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn write_sitemap(dir: &Path, paths: &[&str]) -> PathBuf {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
    );
    for p in paths {
        xml.push_str(&format!("<url><loc>http://localhost:3000{}</loc></url>", p));
    }
    xml.push_str("</urlset>");
    let sitemap = dir.join("sitemap.xml");
    fs::write(&sitemap, xml).unwrap();
    sitemap
}

fn config_for(dir: &TempDir, paths: &[&str]) -> SuiteConfig {
    SuiteConfig {
        sitemap: SitemapSource::File(write_sitemap(dir.path(), paths)),
        output_dir: dir.path().join("screenshots"),
        readiness_timeout: Duration::from_millis(300),
        poll_interval: Duration::from_millis(20),
        preflight: false,
        ..SuiteConfig::default()
    }
}

fn client() -> reqwest::Client {
    http_client(Duration::from_secs(5)).unwrap()
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = SuiteConfig::default();
    assert_eq!(config.base_url_str(), "http://localhost:3000");
    assert_eq!(
        config.sitemap,
        SitemapSource::File(PathBuf::from("build/sitemap.xml"))
    );
    assert_eq!(config.stylesheet, StylesheetSource::Bundled);
    assert_eq!(config.output_dir, PathBuf::from("screenshots/argos"));
    assert_eq!(config.readiness_attribute, "data-has-hydrated");
    assert_eq!(config.workers, 1);
    assert!(config.full_page);
    assert!(config.preflight);
}

#[test]
fn test_bundled_stylesheet_hides_flaky_elements() {
    assert!(DEFAULT_STYLESHEET.contains("iframe"));
    assert!(DEFAULT_STYLESHEET.contains(".avatar__photo"));
    assert!(DEFAULT_STYLESHEET.contains(".docusaurus-mermaid-container"));
    assert_eq!(StylesheetSource::Bundled.load().unwrap(), DEFAULT_STYLESHEET);
}

// ============================================================================
// Planning Tests
// ============================================================================

#[test]
fn test_plan_registers_one_case_per_path() {
    let pathnames: Vec<String> = ["/", "/docs/intro/", "/blog"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let cases = plan_cases(&pathnames, "http://localhost:3000");

    assert_eq!(cases.len(), 3);
    let names: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["index", "docs/intro", "blog"]);
    assert_eq!(cases[1].url, "http://localhost:3000/docs/intro/");
    assert_eq!(cases[2].title, "pathname /blog");
}

#[test]
fn test_plan_grep_filters_on_title() {
    let pathnames: Vec<String> = ["/", "/docs/a", "/docs/b", "/blog"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let cases = filter_cases(
        plan_cases(&pathnames, "http://localhost:3000"),
        Some("/docs/"),
    );

    let indexes: Vec<usize> = cases.iter().map(|c| c.index).collect();
    assert_eq!(indexes, vec![1, 2]);
}

#[test]
fn test_filter_without_pattern_keeps_everything() {
    let pathnames: Vec<String> = ["/", "/blog"].iter().map(|s| s.to_string()).collect();
    let cases = filter_cases(plan_cases(&pathnames, "http://localhost:3000"), None);
    assert_eq!(cases.len(), 2);
}

#[tokio::test]
async fn test_load_suite_detects_collisions_outside_the_filter() {
    let dir = TempDir::new().unwrap();
    let config = SuiteConfig {
        grep: Some("/blog".to_string()),
        ..config_for(&dir, &["/a/", "/a", "/blog"])
    };

    let suite = load_suite(&config, &client()).await.unwrap();

    let names: Vec<&str> = suite.cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["blog"]);
    assert_eq!(suite.total_pathnames, 3);
    assert_eq!(suite.collisions.len(), 1);
    assert_eq!(suite.collisions[0].name, "a");
}

// ============================================================================
// Loading Tests
// ============================================================================

#[tokio::test]
async fn test_load_suite_with_empty_sitemap_registers_nothing() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &[]);

    let suite = load_suite(&config, &client()).await.unwrap();

    assert!(suite.cases.is_empty());
    assert_eq!(suite.total_pathnames, 0);
}

#[tokio::test]
async fn test_load_suite_missing_sitemap_is_fatal() {
    let config = SuiteConfig {
        sitemap: SitemapSource::File(PathBuf::from("/nonexistent/sitemap.xml")),
        ..SuiteConfig::default()
    };

    let result = load_suite(&config, &client()).await;
    assert!(matches!(result, Err(SuiteError::Sitemap(_))));
}

#[tokio::test]
async fn test_load_suite_missing_stylesheet_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = SuiteConfig {
        stylesheet: StylesheetSource::File(dir.path().join("missing.css")),
        ..config_for(&dir, &["/"])
    };

    let result = load_suite(&config, &client()).await;
    assert!(matches!(result, Err(SuiteError::Stylesheet { .. })));
}

#[tokio::test]
async fn test_load_suite_reads_custom_stylesheet() {
    let dir = TempDir::new().unwrap();
    let css = dir.path().join("screenshot.css");
    fs::write(&css, ".clock { display: none; }").unwrap();
    let config = SuiteConfig {
        stylesheet: StylesheetSource::File(css),
        ..config_for(&dir, &["/"])
    };

    let suite = load_suite(&config, &client()).await.unwrap();
    assert_eq!(suite.stylesheet, ".clock { display: none; }");
}

#[tokio::test]
async fn test_load_suite_reports_collisions() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &["/a/", "/a", "/b"]);

    let suite = load_suite(&config, &client()).await.unwrap();

    assert_eq!(suite.cases.len(), 3);
    assert_eq!(suite.collisions.len(), 1);
    assert_eq!(suite.collisions[0].pathnames, vec!["/a/", "/a"]);
}

#[tokio::test]
async fn test_load_suite_denies_collisions_when_asked() {
    let dir = TempDir::new().unwrap();
    let config = SuiteConfig {
        deny_name_collisions: true,
        ..config_for(&dir, &["/a/", "/a"])
    };

    match load_suite(&config, &client()).await {
        Err(SuiteError::NameCollisions(collisions)) => assert_eq!(collisions[0].name, "a"),
        other => panic!("expected NameCollisions, got {:?}", other.map(|s| s.cases)),
    }
}

// ============================================================================
// Preflight Tests
// ============================================================================

#[tokio::test]
async fn test_check_server_accepts_reachable_site() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&mock_server.uri()).unwrap();
    check_server(&client(), &url).await.unwrap();
}

#[tokio::test]
async fn test_check_server_rejects_server_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&mock_server.uri()).unwrap();
    let result = check_server(&client(), &url).await;
    assert!(matches!(result, Err(SuiteError::ServerUnreachable { .. })));
}

#[tokio::test]
async fn test_check_server_rejects_closed_port() {
    let url = Url::parse("http://127.0.0.1:9").unwrap();
    let result = check_server(&client(), &url).await;
    assert!(matches!(result, Err(SuiteError::ServerUnreachable { .. })));
}

// ============================================================================
// Execution Tests
// ============================================================================

#[tokio::test]
async fn test_end_to_end_three_pages() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &["/", "/docs/intro/", "/blog"]);
    let suite = load_suite(&config, &client()).await.unwrap();

    let driver = Arc::new(FakeDriver::default());
    let visited = driver.visited.clone();
    let styles = driver.styles.clone();
    let sink: Arc<dyn ScreenshotSink> = Arc::new(ArgosDirectory::new(&config.output_dir));
    let options = SuiteOptions {
        config,
        show_progress_bars: false,
    };

    let outcome = execute_suite(&options, suite, driver, sink, None, None)
        .await
        .unwrap();

    assert!(outcome.is_success());
    let names: Vec<&str> = outcome.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["index", "docs/intro", "blog"]);

    assert_eq!(
        *visited.lock().unwrap(),
        vec![
            "http://localhost:3000/",
            "http://localhost:3000/docs/intro/",
            "http://localhost:3000/blog",
        ]
    );

    let out = dir.path().join("screenshots");
    assert!(out.join("index.png").exists());
    assert!(out.join("docs").join("intro.png").exists());
    assert!(out.join("blog.png").exists());

    // Every page got the bundled stylesheet
    let styles = styles.lock().unwrap();
    assert_eq!(styles.len(), 3);
    assert!(styles.iter().all(|css| css.contains(".avatar__photo")));
}

#[tokio::test]
async fn test_stuck_page_fails_alone() {
    let dir = TempDir::new().unwrap();
    let config = SuiteConfig {
        workers: 2,
        ..config_for(&dir, &["/", "/stuck", "/blog"])
    };
    let suite = load_suite(&config, &client()).await.unwrap();
    let sink: Arc<dyn ScreenshotSink> = Arc::new(ArgosDirectory::new(&config.output_dir));
    let options = SuiteOptions {
        config,
        show_progress_bars: false,
    };

    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let messages_clone = messages.clone();
    let outcome = execute_suite(
        &options,
        suite,
        Arc::new(FakeDriver::default()),
        sink,
        Some(Arc::new(move |msg: String| {
            messages_clone.lock().unwrap().push(msg);
        })),
        None,
    )
    .await
    .unwrap();

    assert_eq!(outcome.passed(), 2);
    assert_eq!(outcome.failed(), 1);
    assert!(!outcome.is_success());
    assert_eq!(
        outcome.results[1].failed_step,
        Some(CaptureStep::AwaitReadiness)
    );

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("pathname /stuck"));
}

#[tokio::test]
async fn test_grep_limits_captured_pages() {
    let dir = TempDir::new().unwrap();
    let config = SuiteConfig {
        grep: Some("blog".to_string()),
        ..config_for(&dir, &["/", "/blog", "/blog/post"])
    };
    let suite = load_suite(&config, &client()).await.unwrap();
    assert_eq!(suite.total_pathnames, 3);

    let sink: Arc<dyn ScreenshotSink> = Arc::new(ArgosDirectory::new(&config.output_dir));
    let options = SuiteOptions {
        config,
        show_progress_bars: false,
    };
    let outcome = execute_suite(
        &options,
        suite,
        Arc::new(FakeDriver::default()),
        sink,
        None,
        None,
    )
    .await
    .unwrap();

    let names: Vec<&str> = outcome.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["blog", "blog/post"]);
    assert!(!dir.path().join("screenshots").join("index.png").exists());
}
