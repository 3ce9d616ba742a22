//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Number of posts shown in the home page "Latest Posts" section
pub const DEFAULT_LATEST_COUNT: usize = 6;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub intro: String,
    pub language: String,

    // URL
    pub url: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,

    // Listing
    pub latest_posts: usize,

    #[serde(default)]
    pub about: AboutConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub sitemap: SitemapConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            description: "Personal portfolio and blog".to_string(),
            author: "John Doe".to_string(),
            intro: "I'm a software developer who writes about code, design, and more."
                .to_string(),
            language: "en".to_string(),

            url: "http://localhost:4000".to_string(),

            content_dir: "content".to_string(),
            public_dir: "public".to_string(),

            latest_posts: DEFAULT_LATEST_COUNT,

            about: AboutConfig::default(),
            github: GithubConfig::default(),
            sitemap: SitemapConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Apply environment overrides (`SITE_URL`)
    pub fn apply_env(&mut self) {
        self.apply_site_url(std::env::var("SITE_URL").ok());
    }

    fn apply_site_url(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|u| !u.trim().is_empty()) {
            tracing::debug!("Site URL overridden from environment: {}", url);
            self.url = url.trim().to_string();
        }
    }

    /// Site URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// About page content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutConfig {
    pub paragraphs: Vec<String>,
    pub links: Vec<LinkConfig>,
}

impl Default for AboutConfig {
    fn default() -> Self {
        Self {
            paragraphs: vec![
                "I build web and mobile applications and write about what I learn along the way."
                    .to_string(),
            ],
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub name: String,
    pub url: String,
}

/// GitHub integration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub username: String,
    /// How long the server keeps a fetched repository list
    pub cache_ttl_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            cache_ttl_secs: 3600,
        }
    }
}

/// Sitemap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    pub static_routes: Vec<String>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            static_routes: ["", "/about", "/blog", "/projects"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.content_dir, "content");
        assert_eq!(config.latest_posts, 6);
        assert_eq!(config.github.cache_ttl_secs, 3600);
        assert_eq!(
            config.sitemap.static_routes,
            vec!["", "/about", "/blog", "/projects"]
        );
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Site
author: Test User
url: https://example.com/
latest_posts: 3
github:
  username: octocat
about:
  paragraphs:
    - Hello there.
  links:
    - name: GitHub
      url: https://github.com/octocat
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Site");
        assert_eq!(config.author, "Test User");
        assert_eq!(config.latest_posts, 3);
        assert_eq!(config.github.username, "octocat");
        assert_eq!(config.github.cache_ttl_secs, 3600);
        assert_eq!(config.about.links[0].name, "GitHub");
        assert_eq!(config.base_url(), "https://example.com");
    }

    #[test]
    fn test_site_url_override() {
        let mut config = SiteConfig::default();
        config.apply_site_url(Some("  ".to_string()));
        assert_eq!(config.url, "http://localhost:4000");
        config.apply_site_url(Some("https://me.dev".to_string()));
        assert_eq!(config.url, "https://me.dev");
    }
}
