use crate::naming::NameCollision;
use sitesnap_capture::CaptureError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("Failed to read sitemap {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed sitemap XML: {0}")]
    XmlError(#[from] roxmltree::Error),

    #[error("Invalid <loc> URL '{loc}': {source}")]
    InvalidUrl {
        loc: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to fetch sitemap: {0}")]
    HttpError(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error(transparent)]
    Sitemap(#[from] SitemapError),

    #[error("Failed to read stylesheet {path}: {source}")]
    Stylesheet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Target server {url} is not reachable: {reason}")]
    ServerUnreachable { url: String, reason: String },

    #[error("{} screenshot name collision(s): {}", .0.len(), describe_collisions(.0))]
    NameCollisions(Vec<NameCollision>),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

fn describe_collisions(collisions: &[NameCollision]) -> String {
    collisions
        .iter()
        .map(|c| format!("'{}' <- {}", c.name, c.pathnames.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, SuiteError>;
