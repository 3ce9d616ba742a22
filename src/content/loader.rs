//! Content loader - reads blog posts and projects from the content directory
//!
//! Nothing is cached: every call re-reads and re-parses the files it needs.

use lazy_static::lazy_static;
use regex::Regex;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{ContentError, Document, FrontMatter, MarkdownRenderer, RenderedDocument, Section};
use crate::listing;

lazy_static! {
    static ref YEAR_DIR: Regex = Regex::new(r"^\d{4}$").unwrap();
}

/// Loads documents from `<content>/blogs/<yyyy>/` and `<content>/projects/`
pub struct ContentLoader<'a> {
    content_dir: &'a Path,
    renderer: &'a MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(content_dir: &'a Path, renderer: &'a MarkdownRenderer) -> Self {
        Self {
            content_dir,
            renderer,
        }
    }

    fn section_dir(&self, section: Section) -> PathBuf {
        self.content_dir.join(section.dir_name())
    }

    /// Load metadata for every blog post.
    ///
    /// Only directories named like a year are entered. Posts without a title
    /// are left out. Documents come back in file-name order.
    pub fn load_posts(&self) -> Result<Vec<Document>, ContentError> {
        let blog_dir = self.section_dir(Section::Blog);
        if !blog_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();

        // Depth-1 entries must reach `filter_entry`, so no `min_depth` here
        let walker = WalkDir::new(&blog_dir)
            .max_depth(2)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() != 1 || (e.file_type().is_dir() && is_year(e.file_name())));

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if entry.depth() != 2 || !entry.file_type().is_file() || !is_markdown_file(path) {
                continue;
            }

            let year = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<i32>().ok());

            match load_document(path, Section::Blog, year) {
                Ok(Some(post)) => posts.push(post),
                Ok(None) => tracing::warn!("Skipping post without title: {:?}", path),
                Err(e) => tracing::warn!("Failed to load post {:?}: {}", path, e),
            }
        }

        tracing::debug!("Loaded {} posts from {:?}", posts.len(), blog_dir);
        Ok(posts)
    }

    /// Load metadata for every project, newest first.
    ///
    /// Bodies are rendered only by `load_project`.
    pub fn load_projects(&self) -> Result<Vec<Document>, ContentError> {
        let projects_dir = self.section_dir(Section::Projects);
        if !projects_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();

        for entry in WalkDir::new(&projects_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_markdown_file(path) {
                continue;
            }

            match load_document(path, Section::Projects, None) {
                Ok(Some(project)) => projects.push(project),
                Ok(None) => tracing::warn!("Skipping project without title: {:?}", path),
                Err(e) => tracing::warn!("Failed to load project {:?}: {}", path, e),
            }
        }

        listing::sort_by_date(&mut projects);
        Ok(projects)
    }

    /// Load a single article by year and slug.
    ///
    /// A missing file and a file without a title are both `NotFound`.
    pub fn load_post(&self, year: &str, slug: &str) -> Result<RenderedDocument, ContentError> {
        let key = format!("{}/{}", year, slug);
        if !YEAR_DIR.is_match(year) || !is_valid_slug(slug) {
            return Err(ContentError::not_found(Section::Blog, key));
        }

        let path = self
            .section_dir(Section::Blog)
            .join(year)
            .join(format!("{}.md", slug));
        let year = year.parse::<i32>().ok();

        self.load_one(&path, Section::Blog, year, key)
    }

    /// Load a single project by slug
    pub fn load_project(&self, slug: &str) -> Result<RenderedDocument, ContentError> {
        if !is_valid_slug(slug) {
            return Err(ContentError::not_found(Section::Projects, slug));
        }

        let path = self
            .section_dir(Section::Projects)
            .join(format!("{}.md", slug));

        self.load_one(&path, Section::Projects, None, slug.to_string())
    }

    fn load_one(
        &self,
        path: &Path,
        section: Section,
        year: Option<i32>,
        key: String,
    ) -> Result<RenderedDocument, ContentError> {
        if !path.is_file() {
            return Err(ContentError::not_found(section, key));
        }

        match load_document(path, section, year)? {
            Some(document) => Ok(self.render(document)),
            None => {
                tracing::debug!("{:?} has no title", path);
                Err(ContentError::not_found(section, key))
            }
        }
    }

    fn render(&self, document: Document) -> RenderedDocument {
        let html = self.renderer.render(&document.raw);
        RenderedDocument { document, html }
    }
}

/// Read and parse one file. `Ok(None)` means the title is missing.
fn load_document(
    path: &Path,
    section: Section,
    year: Option<i32>,
) -> Result<Option<Document>, ContentError> {
    let content = fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (fm, body) = FrontMatter::parse(&content);

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(
        Document::from_front_matter(section, slug, year, fm, body).map(|mut doc| {
            doc.source = path.to_path_buf();
            doc
        }),
    )
}

fn is_year(name: &OsStr) -> bool {
    name.to_str().map(|n| YEAR_DIR.is_match(n)).unwrap_or(false)
}

/// Slugs come from URLs, so they must not escape the partition directory
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\'])
        && !slug.contains("..")
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("md")
}
