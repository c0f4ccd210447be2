use crate::driver::{Driver, PageHandle, Viewport, style_tag_script};
use crate::error::{CaptureError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::{Stream, StreamExt};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub sandbox: bool,
    pub navigation_timeout: Duration,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            sandbox: true,
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

/// Headless Chromium driven over the DevTools protocol.
///
/// Every page is created in its own browser context so cookies, storage
/// and cache never leak between cases.
pub struct ChromiumDriver {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    pub async fn launch(options: &ChromiumOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.navigation_timeout)
            .arg("--hide-scrollbars")
            .arg("--force-color-profile=srgb")
            .arg("--font-render-hinting=none");

        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref executable) = options.executable {
            builder = builder.chrome_executable(executable);
        }

        let config = builder.build().map_err(CaptureError::LaunchError)?;

        info!("Launching Chromium (headless: {})", options.headless);
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CaptureError::LaunchError(e.to_string()))?;

        // The handler must be polled for the browser connection to make progress
        let handler = tokio::spawn(async move {
            drain_handler_events(&mut handler).await;
        });

        Ok(Self {
            browser: Arc::new(browser),
            handler,
        })
    }

    /// Close the browser and wait for the handler task to drain.
    pub async fn shutdown(self) -> Result<()> {
        match Arc::try_unwrap(self.browser) {
            Ok(mut browser) => {
                browser.close().await?;
            }
            Err(_) => warn!("Browser still referenced by open pages; dropping it"),
        }
        self.handler.await?;
        Ok(())
    }
}

/// Poll browser events until the connection closes.
///
/// An error on a single message (for instance an event the protocol types
/// cannot decode) is logged and skipped; only the end of the stream stops
/// the loop. Returns the number of errors seen.
pub(crate) async fn drain_handler_events<S, E>(events: &mut S) -> usize
where
    S: Stream<Item = std::result::Result<(), E>> + Unpin,
    E: fmt::Display,
{
    let mut errors = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            errors += 1;
            warn!("Browser handler error: {}", e);
        }
    }
    debug!("Browser handler stopped after {} error(s)", errors);
    errors
}

impl Driver for ChromiumDriver {
    type Page = ChromiumPage;

    fn name(&self) -> String {
        "chromium".to_string()
    }

    async fn open_page(&self, viewport: Viewport) -> Result<ChromiumPage> {
        let context_id = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(CaptureError::Other)?;
        let page = self.browser.new_page(target).await?;

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(viewport.width as i64)
            .height(viewport.height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(CaptureError::Other)?;
        page.execute(metrics).await?;

        Ok(ChromiumPage {
            page,
            context_id,
            browser: self.browser.clone(),
        })
    }
}

pub struct ChromiumPage {
    page: Page,
    context_id: BrowserContextId,
    browser: Arc<Browser>,
}

impl PageHandle for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| CaptureError::NavigationError {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn evaluate_bool(&self, expression: &str) -> Result<bool> {
        let value = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| CaptureError::EvaluationError(e.to_string()))?
            .into_value::<bool>()
            .map_err(|e| CaptureError::EvaluationError(e.to_string()))?;
        Ok(value)
    }

    async fn add_style_tag(&self, css: &str) -> Result<()> {
        let script = style_tag_script(css)?;
        self.evaluate_bool(&script).await?;
        Ok(())
    }

    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(|e| CaptureError::ScreenshotError(e.to_string()))
    }

    async fn close(self) -> Result<()> {
        // Disposing the context also closes the page target
        self.browser
            .execute(DisposeBrowserContextParams::new(self.context_id))
            .await?;
        Ok(())
    }
}
