//! The seam between the capture procedure and a browser.
//!
//! `Driver` opens pages, `PageHandle` is one isolated page. The Chromium
//! implementation lives in [`crate::chromium`]; tests plug in fakes.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

pub trait Driver: Send + Sync + 'static {
    type Page: PageHandle + 'static;

    /// Short browser identifier recorded in screenshot metadata.
    fn name(&self) -> String;

    /// Open a blank page in a fresh browser context sized to `viewport`.
    fn open_page(&self, viewport: Viewport) -> impl Future<Output = Result<Self::Page>> + Send;
}

pub trait PageHandle: Send + Sync {
    fn goto(&self, url: &str) -> impl Future<Output = Result<()>> + Send;

    /// Evaluate a JavaScript expression that yields a boolean.
    fn evaluate_bool(&self, expression: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Append a `<style>` element holding `css` to the document head.
    fn add_style_tag(&self, css: &str) -> impl Future<Output = Result<()>> + Send;

    /// PNG bytes of the current page.
    fn screenshot(&self, full_page: bool) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Close the page and dispose of its browser context.
    fn close(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}

/// JavaScript that appends `css` as a style element, mirroring a style tag
/// injection. The CSS is embedded as a JSON string literal.
pub fn style_tag_script(css: &str) -> Result<String> {
    let literal = serde_json::to_string(css)?;
    Ok(format!(
        "(() => {{ const style = document.createElement('style'); \
         style.textContent = {}; \
         (document.head || document.documentElement).appendChild(style); \
         return true; }})()",
        literal
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_tag_script_escapes_css() {
        let script = style_tag_script("a[href$=\"x\"] { color: red; }\n").unwrap();
        assert!(script.contains(r#""a[href$=\"x\"] { color: red; }\n""#));
        assert!(script.starts_with("(() =>"));
    }

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert_eq!((viewport.width, viewport.height), (1280, 720));
    }
}
