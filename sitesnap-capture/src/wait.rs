use crate::driver::PageHandle;
use crate::error::{CaptureError, Result};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Attribute the documentation site sets on `<html>` once hydrated.
pub const DEFAULT_READINESS_ATTRIBUTE: &str = "data-has-hydrated";

/// Fonts loaded, images decoded, nothing marked busy.
///
/// Lazy images below the fold never start loading on their own, so every
/// image is switched to eager, synchronous decoding before the check.
pub const STABILITY_EXPRESSION: &str = "(() => { \
    for (const img of document.images) { \
        if (img.loading === 'lazy') { img.loading = 'eager'; } \
        img.decoding = 'sync'; \
    } \
    return document.fonts.status === 'loaded' \
        && Array.from(document.images).every((img) => img.complete) \
        && document.querySelector('[aria-busy=\"true\"]') === null; \
})()";

#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Expression that is true once `<html>` carries `attribute="true"`.
pub fn readiness_expression(attribute: &str) -> String {
    let literal = serde_json::to_string(attribute).unwrap_or_else(|_| format!("\"{}\"", attribute));
    format!(
        "document.documentElement.getAttribute({}) === \"true\"",
        literal
    )
}

/// Poll `expression` on the page until it evaluates to true.
///
/// An evaluation error counts as "not ready yet": the execution context can
/// be torn down by a reload or client-side redirect during hydration. The
/// last such error is kept in the [`CaptureError::Timeout`] returned once
/// `config.timeout` elapses.
pub async fn wait_for_function<P: PageHandle>(
    page: &P,
    expression: &str,
    config: &WaitConfig,
) -> Result<()> {
    let mut last_error: Option<String> = None;

    let poll = async {
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            match page.evaluate_bool(expression).await {
                Ok(true) => {
                    debug!("Condition met after {} poll(s)", attempts);
                    return;
                }
                Ok(false) => {}
                Err(e) => {
                    debug!("Evaluation failed on poll {}, retrying: {}", attempts, e);
                    last_error = Some(e.to_string());
                }
            }
            tokio::time::sleep(config.poll_interval).await;
        }
    };

    let outcome = tokio::time::timeout(config.timeout, poll).await;
    match outcome {
        Ok(()) => Ok(()),
        Err(_) => Err(CaptureError::Timeout {
            expression: expression.to_string(),
            timeout: config.timeout,
            last_error,
        }),
    }
}
