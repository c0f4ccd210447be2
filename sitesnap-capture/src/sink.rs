use crate::driver::Viewport;
use crate::error::{CaptureError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const DEFAULT_OUTPUT_DIR: &str = "screenshots/argos";

/// Sidecar written next to each screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotMetadata {
    pub name: String,
    pub url: String,
    pub viewport: Viewport,
    pub full_page: bool,
    pub browser: String,
    pub captured_at: String,
}

/// Destination for named screenshots handed to the diffing service.
pub trait ScreenshotSink: Send + Sync {
    fn store(&self, name: &str, png: &[u8], metadata: &ScreenshotMetadata) -> Result<PathBuf>;
}

/// Lays screenshots out the way `argos upload <dir>` expects them:
/// `<root>/<name>.png` plus `<root>/<name>.png.argos.json`.
#[derive(Debug, Clone)]
pub struct ArgosDirectory {
    root: PathBuf,
}

impl ArgosDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn screenshot_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(CaptureError::Other(format!(
                "Screenshot name '{}' is not a relative path",
                name
            )));
        }
        Ok(self.root.join(format!("{}.png", name)))
    }
}

impl Default for ArgosDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl ScreenshotSink for ArgosDirectory {
    fn store(&self, name: &str, png: &[u8], metadata: &ScreenshotMetadata) -> Result<PathBuf> {
        let path = self.screenshot_path(name)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| CaptureError::SinkError {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&path, png).map_err(|source| CaptureError::SinkError {
            path: path.clone(),
            source,
        })?;

        let sidecar = path.with_file_name(format!(
            "{}.argos.json",
            path.file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
        let json = serde_json::to_vec_pretty(metadata)?;
        fs::write(&sidecar, json).map_err(|source| CaptureError::SinkError {
            path: sidecar.clone(),
            source,
        })?;

        debug!("Stored {} ({} bytes)", path.display(), png.len());
        Ok(path)
    }
}
