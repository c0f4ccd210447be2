use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Browser error: {0}")]
    BrowserError(#[from] chromiumoxide::error::CdpError),

    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    #[error("Navigation to {url} failed: {reason}")]
    NavigationError { url: String, reason: String },

    #[error("Condition `{expression}` not met within {timeout:?}{}", describe_last_error(.last_error))]
    Timeout {
        expression: String,
        timeout: Duration,
        /// Most recent evaluation error, if the condition ever failed to evaluate.
        last_error: Option<String>,
    },

    #[error("Script evaluation failed: {0}")]
    EvaluationError(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotError(String),

    #[error("Failed to write {path}: {source}")]
    SinkError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("Other error: {0}")]
    Other(String),
}

fn describe_last_error(last_error: &Option<String>) -> String {
    match last_error {
        Some(error) => format!(" (last error: {})", error),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;
