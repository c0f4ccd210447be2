use crate::case::PageCase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The step of the capture procedure a case stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStep {
    Navigate,
    AwaitReadiness,
    Normalize,
    Stabilize,
    Capture,
}

impl fmt::Display for CaptureStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CaptureStep::Navigate => "navigate",
            CaptureStep::AwaitReadiness => "await readiness",
            CaptureStep::Normalize => "normalize",
            CaptureStep::Stabilize => "stabilize",
            CaptureStep::Capture => "capture",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResult {
    pub index: usize,
    pub title: String,
    pub pathname: String,
    pub name: String,
    pub url: String,
    pub status: CaptureStatus,
    pub failed_step: Option<CaptureStep>,
    pub error: Option<String>,
    pub duration: Duration,
    pub screenshot: Option<PathBuf>,
}

impl CaptureResult {
    pub fn passed(case: &PageCase, screenshot: PathBuf, duration: Duration) -> Self {
        Self {
            index: case.index,
            title: case.title.clone(),
            pathname: case.pathname.clone(),
            name: case.name.clone(),
            url: case.url.clone(),
            status: CaptureStatus::Passed,
            failed_step: None,
            error: None,
            duration,
            screenshot: Some(screenshot),
        }
    }

    pub fn with_error(
        case: &PageCase,
        step: Option<CaptureStep>,
        error: String,
        duration: Duration,
    ) -> Self {
        Self {
            index: case.index,
            title: case.title.clone(),
            pathname: case.pathname.clone(),
            name: case.name.clone(),
            url: case.url.clone(),
            status: CaptureStatus::Failed,
            failed_step: step,
            error: Some(error),
            duration,
            screenshot: None,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == CaptureStatus::Passed
    }
}
