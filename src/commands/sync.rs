//! Sync GitHub repositories into project files

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::{FrontMatter, Section};
use crate::github::{GithubClient, RepoSnapshot};
use crate::Site;

/// What happened to one project file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Created: {}, Updated: {}, Unchanged: {}",
            self.created, self.updated, self.unchanged
        )
    }
}

/// Front-matter written for a synced project, in file order
#[derive(Debug, Serialize)]
struct ProjectFrontMatter<'a> {
    title: &'a str,
    description: &'a str,
    date: String,
    updated: String,
    stars: u64,
    language: &'a str,
    tags: Vec<&'a str>,
    repo: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    homepage: Option<&'a str>,
}

/// Fetch the configured user's repositories and upsert a file for each.
///
/// Unlike the projects page, a failed fetch is an error here.
pub async fn run(site: &Site) -> Result<SyncReport> {
    let username = site.config.github.username.trim();
    if username.is_empty() {
        anyhow::bail!("github.username is not set in _config.yml");
    }

    let client = GithubClient::from_env()?;
    let repos = client.fetch_owned_repos(username).await?;
    tracing::info!("Fetched {} repositories for {}", repos.len(), username);

    let projects_dir = site.content_dir.join(Section::Projects.dir_name());
    sync_repos(&projects_dir, &repos)
}

/// Upsert every repository into `projects_dir`
pub fn sync_repos(projects_dir: &Path, repos: &[RepoSnapshot]) -> Result<SyncReport> {
    fs::create_dir_all(projects_dir)
        .with_context(|| format!("Failed to create {:?}", projects_dir))?;

    let mut report = SyncReport::default();
    for repo in repos {
        let outcome = upsert_repo(projects_dir, repo)?;
        tracing::debug!("{}: {:?}", repo.name, outcome);
        report.record(outcome);
    }
    Ok(report)
}

/// Create or refresh `<projects_dir>/<name>.md` for one repository.
///
/// An existing non-empty description survives when GitHub has none. The
/// file is only rewritten when one of the tracked fields changed.
pub fn upsert_repo(projects_dir: &Path, repo: &RepoSnapshot) -> Result<SyncOutcome> {
    let path = project_path(projects_dir, repo);

    let existing = if path.is_file() {
        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        Some(FrontMatter::parse(&content).0)
    } else {
        None
    };

    let description = if repo.description.is_empty() {
        existing
            .as_ref()
            .and_then(|fm| fm.description.clone())
            .unwrap_or_default()
    } else {
        repo.description.clone()
    };

    let outcome = match &existing {
        None => SyncOutcome::Created,
        Some(fm) if needs_update(fm, repo, &description) => SyncOutcome::Updated,
        Some(_) => return Ok(SyncOutcome::Unchanged),
    };

    let content = render_project(repo, &description)?;
    fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(outcome)
}

fn project_path(projects_dir: &Path, repo: &RepoSnapshot) -> PathBuf {
    projects_dir.join(format!("{}.md", repo.name))
}

fn needs_update(fm: &FrontMatter, repo: &RepoSnapshot, description: &str) -> bool {
    let text = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();

    fm.stars != Some(repo.stars)
        || text(&fm.description) != description
        || text(&fm.repo) != repo.full_name
        || text(&fm.language) != repo.language.as_deref().unwrap_or_default()
        || text(&fm.date) != day(&repo.created_at)
        || text(&fm.updated) != day(&repo.updated_at)
}

/// `YYYY-MM-DD` part of a GitHub timestamp
fn day(timestamp: &str) -> String {
    timestamp.get(..10).unwrap_or(timestamp).to_string()
}

fn render_project(repo: &RepoSnapshot, description: &str) -> Result<String> {
    let language = repo.language.as_deref().unwrap_or_default();
    let front_matter = ProjectFrontMatter {
        title: &repo.name,
        description,
        date: day(&repo.created_at),
        updated: day(&repo.updated_at),
        stars: repo.stars,
        language,
        tags: if language.is_empty() {
            Vec::new()
        } else {
            vec![language]
        },
        repo: &repo.full_name,
        homepage: repo.homepage.as_deref(),
    };
    let yaml = serde_yaml::to_string(&front_matter)?;

    let about = if description.is_empty() {
        "No description provided."
    } else {
        description
    };

    let mut content = format!(
        "---\n{}---\n\n## About\n\n{}\n\n- GitHub: {}\n",
        yaml, about, repo.html_url
    );
    if let Some(homepage) = &repo.homepage {
        content.push_str(&format!("- Live: {}\n", homepage));
    }
    Ok(content)
}
