pub mod base_url;
pub mod builder;
pub mod config;
pub mod locator;
pub mod params;
pub mod resolver;
pub mod scanner;
pub mod site;
pub mod tag;

// Re-export main types
pub use base_url::{BASE_URL_TOKEN, BuildMode, base_for, rewrite_base_url};
pub use builder::{BuildError, BuildReport, BuiltPage, Site, SiteBuilder, build_site};
pub use config::{Config, SiteConfig};
pub use locator::{PAGES_DIR, find_template};
pub use params::apply_params;
pub use resolver::{Diagnostic, ResolveError, Resolved, Resolver, resolve, split_lines};
pub use scanner::{ScanError, SiteScanner};
pub use site::{Page, PageType};
pub use tag::{Params, TagDirective, parse_tag};
