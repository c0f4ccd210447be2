use crate::case::PageCase;
use crate::driver::{Driver, PageHandle, Viewport};
use crate::error::CaptureError;
use crate::result::{CaptureResult, CaptureStep};
use crate::sink::{ScreenshotMetadata, ScreenshotSink};
use crate::wait::{
    DEFAULT_READINESS_ATTRIBUTE, STABILITY_EXPRESSION, WaitConfig, readiness_expression,
    wait_for_function,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Injected on every page alongside the user stylesheet.
pub const CAPTURE_CSS: &str = r#"
*, *::before, *::after {
  caret-color: transparent !important;
}
[data-visual-test="transparent"] {
  color: transparent !important;
  font-family: monospace !important;
  opacity: 0 !important;
}
[data-visual-test="removed"] {
  display: none !important;
}
[data-visual-test="blackout"] {
  background: #000 !important;
  color: #000 !important;
}
"#;

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub readiness_expression: String,
    pub wait: WaitConfig,
    pub stylesheet: String,
    pub viewport: Viewport,
    pub full_page: bool,
    pub stabilize: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            readiness_expression: readiness_expression(DEFAULT_READINESS_ATTRIBUTE),
            wait: WaitConfig::default(),
            stylesheet: String::new(),
            viewport: Viewport::default(),
            full_page: true,
            stabilize: true,
        }
    }
}

/// A capture failure tagged with the step it happened in.
#[derive(Debug)]
pub struct StepError {
    pub step: CaptureStep,
    pub error: CaptureError,
}

fn at(step: CaptureStep) -> impl FnOnce(CaptureError) -> StepError {
    move |error| StepError { step, error }
}

/// Drive one already-open page through navigate, readiness, normalize,
/// stabilize and capture. Stops at the first failing step.
pub async fn capture_page<P: PageHandle>(
    page: &P,
    case: &PageCase,
    settings: &CaptureSettings,
    sink: &dyn ScreenshotSink,
    browser: &str,
) -> std::result::Result<PathBuf, StepError> {
    debug!("[{}] navigating to {}", case.name, case.url);
    page.goto(&case.url)
        .await
        .map_err(|e| match e {
            CaptureError::NavigationError { .. } => e,
            other => CaptureError::NavigationError {
                url: case.url.clone(),
                reason: other.to_string(),
            },
        })
        .map_err(at(CaptureStep::Navigate))?;

    debug!("[{}] waiting for readiness", case.name);
    wait_for_function(page, &settings.readiness_expression, &settings.wait)
        .await
        .map_err(at(CaptureStep::AwaitReadiness))?;

    let mut css = String::with_capacity(settings.stylesheet.len() + CAPTURE_CSS.len());
    css.push_str(&settings.stylesheet);
    css.push_str(CAPTURE_CSS);
    page.add_style_tag(&css)
        .await
        .map_err(at(CaptureStep::Normalize))?;

    if settings.stabilize {
        debug!("[{}] waiting for fonts, images and busy elements", case.name);
        wait_for_function(page, STABILITY_EXPRESSION, &settings.wait)
            .await
            .map_err(at(CaptureStep::Stabilize))?;
    }

    let png = page
        .screenshot(settings.full_page)
        .await
        .map_err(at(CaptureStep::Capture))?;

    let metadata = ScreenshotMetadata {
        name: case.name.clone(),
        url: case.url.clone(),
        viewport: settings.viewport,
        full_page: settings.full_page,
        browser: browser.to_string(),
        captured_at: chrono::Utc::now().to_rfc3339(),
    };

    sink.store(&case.name, &png, &metadata)
        .map_err(at(CaptureStep::Capture))
}

/// Run a full case: open an isolated page, capture it, close it.
/// Never returns an error; failures become a failed [`CaptureResult`].
pub async fn run_case<D: Driver>(
    driver: &D,
    case: &PageCase,
    settings: &CaptureSettings,
    sink: &dyn ScreenshotSink,
) -> CaptureResult {
    let start = Instant::now();

    let page = match driver.open_page(settings.viewport).await {
        Ok(page) => page,
        Err(e) => {
            warn!("{} failed to open a page: {}", case.title, e);
            return CaptureResult::with_error(
                case,
                Some(CaptureStep::Navigate),
                e.to_string(),
                start.elapsed(),
            );
        }
    };

    let outcome = capture_page(&page, case, settings, sink, &driver.name()).await;

    if let Err(e) = page.close().await {
        warn!("{} failed to close its page: {}", case.title, e);
    }

    match outcome {
        Ok(path) => {
            info!("{} captured as {}", case.title, path.display());
            CaptureResult::passed(case, path, start.elapsed())
        }
        Err(StepError { step, error }) => {
            warn!("{} failed at {}: {}", case.title, step, error);
            CaptureResult::with_error(case, Some(step), error.to_string(), start.elapsed())
        }
    }
}
