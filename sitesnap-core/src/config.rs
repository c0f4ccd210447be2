use crate::error::{Result, SuiteError};
use crate::sitemap::SitemapSource;
use sitesnap_capture::sink::DEFAULT_OUTPUT_DIR;
use sitesnap_capture::wait::{
    DEFAULT_POLL_INTERVAL, DEFAULT_READINESS_ATTRIBUTE, DEFAULT_TIMEOUT, readiness_expression,
};
use sitesnap_capture::{CaptureSettings, ChromiumOptions, Viewport, WaitConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Stylesheet bundled with the binary, used unless one is given explicitly.
pub const DEFAULT_STYLESHEET: &str = include_str!("../assets/screenshot.css");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetSource {
    Bundled,
    File(PathBuf),
}

impl StylesheetSource {
    /// Read the stylesheet text. A missing file is fatal for the suite.
    pub fn load(&self) -> Result<String> {
        match self {
            StylesheetSource::Bundled => Ok(DEFAULT_STYLESHEET.to_string()),
            StylesheetSource::File(path) => {
                fs::read_to_string(path).map_err(|source| SuiteError::Stylesheet {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

/// Everything a suite run needs to know.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Every sitemap path is appended to this URL.
    pub base_url: Url,
    pub sitemap: SitemapSource,
    pub stylesheet: StylesheetSource,
    /// Where screenshots are written for `argos upload`.
    pub output_dir: PathBuf,
    /// `<html>` attribute the site sets to `"true"` once hydrated.
    pub readiness_attribute: String,
    pub readiness_timeout: Duration,
    pub poll_interval: Duration,
    pub navigation_timeout: Duration,
    pub viewport: Viewport,
    pub full_page: bool,
    /// Wait for fonts, images and `aria-busy` before capturing.
    pub stabilize: bool,
    pub workers: usize,
    /// Only run cases whose title contains this substring.
    pub grep: Option<String>,
    pub deny_name_collisions: bool,
    /// Check the base URL answers before launching the browser.
    pub preflight: bool,
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
    pub sandbox: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            sitemap: SitemapSource::default(),
            stylesheet: StylesheetSource::Bundled,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            readiness_attribute: DEFAULT_READINESS_ATTRIBUTE.to_string(),
            readiness_timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            navigation_timeout: Duration::from_secs(30),
            viewport: Viewport::default(),
            full_page: true,
            stabilize: true,
            workers: 1,
            grep: None,
            deny_name_collisions: false,
            preflight: true,
            chrome_executable: None,
            headless: true,
            sandbox: true,
        }
    }
}

impl SuiteConfig {
    /// Base URL as a string without a trailing slash, ready for path concatenation.
    pub fn base_url_str(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn capture_settings(&self, stylesheet: String) -> CaptureSettings {
        CaptureSettings {
            readiness_expression: readiness_expression(&self.readiness_attribute),
            wait: WaitConfig {
                timeout: self.readiness_timeout,
                poll_interval: self.poll_interval,
            },
            stylesheet,
            viewport: self.viewport,
            full_page: self.full_page,
            stabilize: self.stabilize,
        }
    }

    pub fn chromium_options(&self) -> ChromiumOptions {
        ChromiumOptions {
            executable: self.chrome_executable.clone(),
            headless: self.headless,
            sandbox: self.sandbox,
            navigation_timeout: self.navigation_timeout,
        }
    }
}
