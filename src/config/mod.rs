//! Configuration module

mod site;

pub use site::AboutConfig;
pub use site::GithubConfig;
pub use site::LinkConfig;
pub use site::SiteConfig;
pub use site::SitemapConfig;
pub use site::DEFAULT_LATEST_COUNT;
