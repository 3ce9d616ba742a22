//! GitHub REST client for a user's public repositories

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "folio-portfolio-site";
const TIMEOUT_SECONDS: u64 = 30;

/// A repository as shown on the projects page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubRepo {
    pub id: u64,
    pub name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub updated_at: String,
}

/// Repository metadata written into project files by `sync`
#[derive(Debug, Clone, PartialEq)]
pub struct RepoSnapshot {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub language: Option<String>,
    pub stars: u64,
    pub homepage: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub html_url: String,
}

/// Wire format of `GET /users/{user}/repos`
#[derive(Debug, Clone, Deserialize)]
struct ApiRepo {
    id: u64,
    name: String,
    full_name: String,
    html_url: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    homepage: Option<String>,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    fork: bool,
    visibility: Option<String>,
}

impl From<ApiRepo> for GithubRepo {
    fn from(repo: ApiRepo) -> Self {
        Self {
            id: repo.id,
            name: repo.name,
            html_url: repo.html_url,
            description: repo.description,
            language: repo.language,
            stars: repo.stargazers_count,
            updated_at: repo.updated_at,
        }
    }
}

impl From<ApiRepo> for RepoSnapshot {
    fn from(repo: ApiRepo) -> Self {
        Self {
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description.unwrap_or_default(),
            language: repo.language.filter(|l| !l.is_empty()),
            stars: repo.stargazers_count,
            homepage: repo.homepage.filter(|h| !h.is_empty()),
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            html_url: repo.html_url,
        }
    }
}

/// Async GitHub API client
pub struct GithubClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    /// Create a client, authenticating when a token is given
    pub fn new(token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));

        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .context("GITHUB_TOKEN is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(TIMEOUT_SECONDS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            api_base: API_BASE.to_string(),
        })
    }

    /// Create a client using `GITHUB_TOKEN` when it is set
    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var("GITHUB_TOKEN").ok())
    }

    /// Point the client at a different API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_repos(&self, username: &str, query: &str) -> Result<Vec<ApiRepo>> {
        let url = format!(
            "{}/users/{}/repos?per_page=100&{}",
            self.api_base, username, query
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("HTTP {} from {}: {}", status, url, body));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {}", url))?;
        parse_repos(&body)
    }

    /// Public, non-fork repositories, most recently updated first.
    ///
    /// Never fails: errors are logged and produce an empty list, which
    /// callers must read as "temporarily unavailable".
    pub async fn fetch_repos(&self, username: &str) -> Vec<GithubRepo> {
        match self.get_repos(username, "sort=updated").await {
            Ok(repos) => repo_list(repos),
            Err(e) => {
                tracing::error!("Failed to fetch GitHub repos for {}: {:#}", username, e);
                Vec::new()
            }
        }
    }

    /// Owned, public, non-fork repositories for syncing into project files
    pub async fn fetch_owned_repos(&self, username: &str) -> Result<Vec<RepoSnapshot>> {
        let repos = self
            .get_repos(username, "type=owner&sort=updated")
            .await
            .context("GitHub fetch failed")?;
        Ok(snapshots(repos))
    }
}

fn parse_repos(body: &str) -> Result<Vec<ApiRepo>> {
    serde_json::from_str(body).context("Unexpected GitHub response body")
}

fn updated_at(repo: &GithubRepo) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&repo.updated_at).ok()
}

fn repo_list(repos: Vec<ApiRepo>) -> Vec<GithubRepo> {
    let mut list: Vec<GithubRepo> = repos
        .into_iter()
        .filter(|r| !r.fork)
        .map(GithubRepo::from)
        .collect();
    list.sort_by(|a, b| updated_at(b).cmp(&updated_at(a)));
    list
}

fn snapshots(repos: Vec<ApiRepo>) -> Vec<RepoSnapshot> {
    repos
        .into_iter()
        .filter(|r| !r.fork && r.visibility.as_deref().unwrap_or("public") == "public")
        .map(RepoSnapshot::from)
        .collect()
}

/// Keeps a fetched repository list for a fixed time
pub struct RepoCache {
    ttl: Duration,
    entry: RwLock<Option<(Instant, Vec<GithubRepo>)>>,
}

impl RepoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Return the cached list while it is fresh, otherwise call `fetch`.
    ///
    /// Empty results are not cached, so a failed fetch is retried on the
    /// next request.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Vec<GithubRepo>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<GithubRepo>>,
    {
        if let Some((fetched_at, repos)) = self.entry.read().await.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return repos.clone();
            }
        }

        let repos = fetch().await;
        if !repos.is_empty() {
            *self.entry.write().await = Some((Instant::now(), repos.clone()));
        }
        repos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PAYLOAD: &str = r#"[
        {"id": 1, "name": "older", "full_name": "me/older", "html_url": "https://github.com/me/older",
         "description": null, "language": "Go", "stargazers_count": 2, "homepage": "",
         "created_at": "2020-01-01T00:00:00Z", "updated_at": "2021-01-01T00:00:00Z",
         "fork": false, "visibility": "public"},
        {"id": 2, "name": "forked", "full_name": "me/forked", "html_url": "https://github.com/me/forked",
         "description": "fork", "language": null, "stargazers_count": 0, "homepage": null,
         "created_at": "2020-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z",
         "fork": true, "visibility": "public"},
        {"id": 3, "name": "newer", "full_name": "me/newer", "html_url": "https://github.com/me/newer",
         "description": "Shiny", "language": "Rust", "stargazers_count": 9, "homepage": "https://newer.dev",
         "created_at": "2022-05-06T10:00:00Z", "updated_at": "2023-07-08T09:00:00Z",
         "fork": false, "visibility": "public", "extra_field": true}
    ]"#;

    #[test]
    fn test_repo_list_filters_forks_and_sorts() {
        let repos = repo_list(parse_repos(PAYLOAD).unwrap());
        let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["newer", "older"]);
        assert_eq!(repos[0].stars, 9);
        assert_eq!(repos[1].description, None);
    }

    #[test]
    fn test_snapshots() {
        let snaps = snapshots(parse_repos(PAYLOAD).unwrap());
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].description, "");
        assert_eq!(snaps[0].homepage, None);
        assert_eq!(snaps[1].full_name, "me/newer");
        assert_eq!(snaps[1].homepage.as_deref(), Some("https://newer.dev"));
    }

    #[test]
    fn test_parse_error() {
        assert!(parse_repos(r#"{"message": "API rate limit exceeded"}"#).is_err());
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_empty() {
        let client = GithubClient::new(None)
            .unwrap()
            .with_api_base("http://127.0.0.1:1");
        assert!(client.fetch_repos("someone").await.is_empty());
        assert!(client.fetch_owned_repos("someone").await.is_err());
    }

    fn sample_repo() -> GithubRepo {
        repo_list(parse_repos(PAYLOAD).unwrap()).remove(0)
    }

    #[tokio::test]
    async fn test_cache_reuses_fresh_results() {
        let cache = RepoCache::new(Duration::from_secs(3600));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let repos = cache
                .get_or_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    vec![sample_repo()]
                })
                .await;
            assert_eq!(repos.len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_skips_empty_and_expired() {
        let cache = RepoCache::new(Duration::ZERO);
        let calls = AtomicUsize::new(0);

        let empty = cache
            .get_or_fetch(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Vec::new()
            })
            .await;
        assert!(empty.is_empty());

        cache.get_or_fetch(|| async { vec![sample_repo()] }).await;
        cache
            .get_or_fetch(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                vec![sample_repo()]
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
