use serde::{Deserialize, Serialize};
use sitesnap_capture::PageCase;
use std::collections::HashMap;

/// Name used when a path trims down to nothing.
pub const INDEX_NAME: &str = "index";

/// Convert a URL path to a screenshot name.
///
/// Strips at most one leading and one trailing `/`; internal slashes are
/// kept, so `/docs/intro/` becomes `docs/intro`. The root path (and the
/// empty string) map to `index`.
pub fn pathname_to_argos_name(pathname: &str) -> String {
    let trimmed = pathname.strip_prefix('/').unwrap_or(pathname);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        INDEX_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Distinct paths that derive the same screenshot name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCollision {
    pub name: String,
    pub pathnames: Vec<String>,
}

/// Find names shared by more than one distinct path, in order of first
/// appearance. A path listed twice in the sitemap is not a collision.
pub fn find_name_collisions(cases: &[PageCase]) -> Vec<NameCollision> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_name: HashMap<&str, Vec<&str>> = HashMap::new();

    for case in cases {
        let paths = by_name.entry(case.name.as_str()).or_insert_with(|| {
            order.push(case.name.as_str());
            Vec::new()
        });
        if !paths.contains(&case.pathname.as_str()) {
            paths.push(case.pathname.as_str());
        }
    }

    order
        .into_iter()
        .filter_map(|name| {
            let paths = &by_name[name];
            (paths.len() > 1).then(|| NameCollision {
                name: name.to_string(),
                pathnames: paths.iter().map(|p| p.to_string()).collect(),
            })
        })
        .collect()
}
