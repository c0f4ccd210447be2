use crate::config::SuiteConfig;
use crate::error::{Result, SuiteError};
use crate::naming::{NameCollision, find_name_collisions, pathname_to_argos_name};
use crate::sitemap::load_sitemap_pathnames;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sitesnap_capture::{
    ArgosDirectory, CaptureResult, ChromiumDriver, Driver, PageCase, Runner, ScreenshotSink,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Options for configuring a suite run
pub struct SuiteOptions {
    pub config: SuiteConfig,
    pub show_progress_bars: bool,
}

/// Callback for reporting suite progress
pub type SuiteProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback for reporting individual case results as they come in
pub type CaptureResultCallback = Arc<dyn Fn(CaptureResult) + Send + Sync>;

/// A suite ready to run: the cases registered from the sitemap.
#[derive(Debug, Clone)]
pub struct LoadedSuite {
    pub cases: Vec<PageCase>,
    pub stylesheet: String,
    pub collisions: Vec<NameCollision>,
    /// Number of sitemap paths before the title filter.
    pub total_pathnames: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteOutcome {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub base_url: String,
    pub sitemap: String,
    pub results: Vec<CaptureResult>,
    pub collisions: Vec<NameCollision>,
}

impl SuiteOutcome {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Register one case per pathname, keeping sitemap order.
pub fn plan_cases(pathnames: &[String], base_url: &str) -> Vec<PageCase> {
    pathnames
        .iter()
        .enumerate()
        .map(|(index, pathname)| {
            PageCase::new(index, pathname, pathname_to_argos_name(pathname), base_url)
        })
        .collect()
}

/// Keep only the cases whose title contains `grep`; `None` keeps all.
pub fn filter_cases(cases: Vec<PageCase>, grep: Option<&str>) -> Vec<PageCase> {
    match grep {
        Some(pattern) => cases
            .into_iter()
            .filter(|case| case.title.contains(pattern))
            .collect(),
        None => cases,
    }
}

pub fn http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("Sitesnap/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(timeout / 2)
        .build()?;
    Ok(client)
}

/// Load the sitemap and stylesheet and register the cases.
///
/// Any error here is fatal: no page is captured.
pub async fn load_suite(config: &SuiteConfig, client: &Client) -> Result<LoadedSuite> {
    let pathnames = load_sitemap_pathnames(&config.sitemap, client).await?;
    let stylesheet = config.stylesheet.load()?;

    let all_cases = plan_cases(&pathnames, config.base_url_str());
    let collisions = find_name_collisions(&all_cases);
    for collision in &collisions {
        warn!(
            "Screenshot name '{}' is shared by {}",
            collision.name,
            collision.pathnames.join(", ")
        );
    }
    if config.deny_name_collisions && !collisions.is_empty() {
        return Err(SuiteError::NameCollisions(collisions));
    }

    // Collisions are judged on the whole sitemap, before the title filter
    let cases = filter_cases(all_cases, config.grep.as_deref());

    info!(
        "Registered {} of {} case(s) from {}",
        cases.len(),
        pathnames.len(),
        config.sitemap
    );

    Ok(LoadedSuite {
        cases,
        stylesheet,
        collisions,
        total_pathnames: pathnames.len(),
    })
}

/// Make sure the target server answers before any browser work starts.
pub async fn check_server(client: &Client, base_url: &Url) -> Result<()> {
    match client.get(base_url.clone()).send().await {
        Ok(response) if response.status().is_server_error() => Err(SuiteError::ServerUnreachable {
            url: base_url.to_string(),
            reason: format!("responded with {}", response.status()),
        }),
        Ok(_) => Ok(()),
        Err(e) => Err(SuiteError::ServerUnreachable {
            url: base_url.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Run the cases of a loaded suite with the given driver and sink.
pub async fn execute_suite<D: Driver>(
    options: &SuiteOptions,
    suite: LoadedSuite,
    driver: Arc<D>,
    sink: Arc<dyn ScreenshotSink>,
    progress_callback: Option<SuiteProgressCallback>,
    result_callback: Option<CaptureResultCallback>,
) -> Result<SuiteOutcome> {
    let config = &options.config;
    let started_at = Utc::now();
    let total = suite.cases.len();

    // Set up a single bar for overall progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Starting capture...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let completed = Arc::new(AtomicUsize::new(0));

    let internal_progress: sitesnap_capture::ProgressCallback = match progress_bar.clone() {
        Some(pb) => Arc::new(move |_worker_id: usize, title: String| {
            pb.set_message(title);
        }),
        None => Arc::new(|_worker_id: usize, _title: String| {}),
    };

    let internal_result: sitesnap_capture::ResultCallback = {
        let pb = progress_bar.clone();
        let completed = completed.clone();
        let progress_cb = progress_callback.clone();
        let result_cb = result_callback.clone();
        Arc::new(move |result: CaptureResult| {
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.inc(1);
            }
            if let Some(ref callback) = progress_cb
                && !result.is_passed()
            {
                callback(format!(
                    "[!] {} failed: {}",
                    result.title,
                    result.error.as_deref().unwrap_or("unknown error")
                ));
            }
            if let Some(ref callback) = result_cb {
                callback(result);
            }
            tracing::debug!("{}/{} case(s) finished", done, total);
        })
    };

    let runner = Runner::new(driver, sink)
        .with_settings(config.capture_settings(suite.stylesheet))
        .with_progress_callback(internal_progress)
        .with_result_callback(internal_result);

    let results = runner.run(suite.cases, config.workers).await?;

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Capture complete! {} case(s) run",
            completed.load(Ordering::Relaxed)
        ));
    }

    Ok(SuiteOutcome {
        run_id: uuid::Uuid::new_v4().to_string(),
        started_at,
        finished_at: Utc::now(),
        base_url: config.base_url_str().to_string(),
        sitemap: config.sitemap.to_string(),
        results,
        collisions: suite.collisions,
    })
}

/// Load the suite, launch Chromium, capture every page, shut down.
pub async fn run_suite(
    options: SuiteOptions,
    progress_callback: Option<SuiteProgressCallback>,
    result_callback: Option<CaptureResultCallback>,
) -> Result<SuiteOutcome> {
    let config = &options.config;
    let client = http_client(config.navigation_timeout)?;

    let suite = load_suite(config, &client).await?;

    if let Some(ref callback) = progress_callback {
        callback(format!("Pathnames to screenshot: {}", suite.cases.len()));
    }

    if suite.cases.is_empty() {
        let now = Utc::now();
        return Ok(SuiteOutcome {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: now,
            finished_at: now,
            base_url: config.base_url_str().to_string(),
            sitemap: config.sitemap.to_string(),
            results: Vec::new(),
            collisions: suite.collisions,
        });
    }

    if config.preflight {
        check_server(&client, &config.base_url).await?;
    }

    let driver = Arc::new(ChromiumDriver::launch(&config.chromium_options()).await?);
    let sink: Arc<dyn ScreenshotSink> = Arc::new(ArgosDirectory::new(&config.output_dir));

    let outcome = execute_suite(
        &options,
        suite,
        driver.clone(),
        sink,
        progress_callback,
        result_callback,
    )
    .await;

    match Arc::try_unwrap(driver) {
        Ok(driver) => {
            if let Err(e) = driver.shutdown().await {
                warn!("Browser shutdown failed: {}", e);
            }
        }
        Err(_) => warn!("Browser still in use after the run; leaving it to drop"),
    }

    outcome
}
