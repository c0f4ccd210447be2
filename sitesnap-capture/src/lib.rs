pub mod capture;
pub mod case;
pub mod chromium;
pub mod driver;
pub mod error;
pub mod result;
pub mod runner;
pub mod sink;
pub mod wait;

pub use capture::{CaptureSettings, capture_page, run_case};
pub use case::PageCase;
pub use chromium::{ChromiumDriver, ChromiumOptions};
pub use driver::{Driver, PageHandle, Viewport};
pub use error::CaptureError;
pub use result::{CaptureResult, CaptureStatus, CaptureStep};
pub use runner::{ProgressCallback, ResultCallback, Runner};
pub use sink::{ArgosDirectory, ScreenshotMetadata, ScreenshotSink};
pub use wait::WaitConfig;
