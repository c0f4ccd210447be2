pub mod config;
pub mod error;
pub mod naming;
pub mod report;
pub mod sitemap;
pub mod suite;

pub use config::{StylesheetSource, SuiteConfig};
pub use error::{SitemapError, SuiteError};
pub use naming::{NameCollision, find_name_collisions, pathname_to_argos_name};
pub use sitemap::{SitemapSource, extract_pathnames_from_str, extract_sitemap_pathnames};
pub use suite::{LoadedSuite, SuiteOptions, SuiteOutcome};

pub fn print_banner() {
    let banner = r#"
   ┌─┐┬┌┬┐┌─┐┌─┐┌┐┌┌─┐┌─┐
   └─┐│ │ ├┤ └─┐│││├─┤├─┘
   └─┘┴ ┴ └─┘└─┘┘└┘┴ ┴┴
   sitemap → screenshots
"#;
    println!("{}", banner);
}
