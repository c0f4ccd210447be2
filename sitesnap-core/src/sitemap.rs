use crate::error::SitemapError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_SITEMAP_PATH: &str = "build/sitemap.xml";

/// Where the sitemap comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SitemapSource {
    File(PathBuf),
    Remote(Url),
}

impl SitemapSource {
    /// `http(s)://` locations are fetched, anything else is a file path.
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => SitemapSource::Remote(url),
            _ => SitemapSource::File(PathBuf::from(location)),
        }
    }
}

impl Default for SitemapSource {
    fn default() -> Self {
        SitemapSource::File(PathBuf::from(DEFAULT_SITEMAP_PATH))
    }
}

impl fmt::Display for SitemapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SitemapSource::File(path) => write!(f, "{}", path.display()),
            SitemapSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Extract the path of every `<loc>` URL in a sitemap file, in document order.
pub fn extract_sitemap_pathnames(path: &Path) -> Result<Vec<String>, SitemapError> {
    let xml = fs::read_to_string(path).map_err(|source| SitemapError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    extract_pathnames_from_str(&xml)
}

/// Extract the path of every `<loc>` URL in an in-memory sitemap.
///
/// Scheme, host, port, query and fragment are dropped. Duplicates and
/// document order are preserved.
pub fn extract_pathnames_from_str(xml: &str) -> Result<Vec<String>, SitemapError> {
    let document = roxmltree::Document::parse(xml)?;

    let mut pathnames = Vec::new();
    for loc in document
        .descendants()
        .filter(|node| node.is_element() && node.has_tag_name("loc"))
    {
        let text: String = loc
            .descendants()
            .filter(|node| node.is_text())
            .filter_map(|node| node.text())
            .collect();
        let text = text.trim();

        let url = Url::parse(text).map_err(|source| SitemapError::InvalidUrl {
            loc: text.to_string(),
            source,
        })?;
        debug!("Found <loc> {}", url);
        pathnames.push(url.path().to_string());
    }

    Ok(pathnames)
}

/// Load pathnames from a sitemap file or fetch them from a remote sitemap.
pub async fn load_sitemap_pathnames(
    source: &SitemapSource,
    client: &Client,
) -> Result<Vec<String>, SitemapError> {
    let pathnames = match source {
        SitemapSource::File(path) => extract_sitemap_pathnames(path)?,
        SitemapSource::Remote(url) => {
            debug!("Fetching sitemap {}", url);
            let xml = client
                .get(url.clone())
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            extract_pathnames_from_str(&xml)?
        }
    };

    info!("Sitemap {} lists {} page(s)", source, pathnames.len());
    Ok(pathnames)
}
