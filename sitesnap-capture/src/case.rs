use serde::{Deserialize, Serialize};

/// One registered page capture: a sitemap path resolved against the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCase {
    /// Position of the path in the sitemap.
    pub index: usize,
    pub title: String,
    pub pathname: String,
    /// Screenshot identifier handed to the sink.
    pub name: String,
    pub url: String,
}

impl PageCase {
    pub fn new(index: usize, pathname: &str, name: String, base_url: &str) -> Self {
        Self {
            index,
            title: format!("pathname {}", pathname),
            pathname: pathname.to_string(),
            name,
            url: format!("{}{}", base_url.trim_end_matches('/'), pathname),
        }
    }
}
