//! Document models

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::FrontMatter;

/// A content partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// `blogs/<yyyy>/<slug>.md`
    Blog,
    /// `projects/<slug>.md`
    Projects,
}

impl Section {
    /// Directory name under the content root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Section::Blog => "blogs",
            Section::Projects => "projects",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A markdown document with parsed metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// File stem, unique within the partition
    pub slug: String,

    /// Which partition the document was loaded from
    pub section: Section,

    /// Year partition for blog posts, the date's year for projects
    pub year: Option<i32>,

    pub title: String,

    pub description: Option<String>,

    /// Parsed publication date
    pub date: Option<NaiveDate>,

    /// Date exactly as written in the front-matter
    pub date_raw: Option<String>,

    pub updated: Option<NaiveDate>,

    pub tags: Vec<String>,

    pub stars: Option<u64>,

    /// `owner/name` on GitHub
    pub repo: Option<String>,

    pub homepage: Option<String>,

    pub language: Option<String>,

    /// Raw markdown body
    #[serde(skip)]
    pub raw: String,

    /// Source file path
    #[serde(skip)]
    pub source: PathBuf,
}

impl Document {
    /// Build a document from parsed front-matter.
    ///
    /// Returns `None` when the required title is missing.
    pub fn from_front_matter(
        section: Section,
        slug: impl Into<String>,
        partition_year: Option<i32>,
        fm: FrontMatter,
        body: &str,
    ) -> Option<Self> {
        let title = fm.title()?.to_string();
        let date = fm.parse_date();
        let updated = fm.parse_updated();
        let year = partition_year.or_else(|| date.map(|d| d.year()));

        Some(Self {
            slug: slug.into(),
            section,
            year,
            title,
            description: fm.description.filter(|d| !d.trim().is_empty()),
            date,
            date_raw: fm.date,
            updated,
            tags: fm.tags,
            stars: fm.stars,
            repo: fm.repo.filter(|r| !r.is_empty()),
            homepage: fm.homepage.filter(|h| !h.is_empty()),
            language: fm.language.filter(|l| !l.is_empty()),
            raw: body.to_string(),
            source: PathBuf::new(),
        })
    }

    /// Site-relative URL of the article page, for blog posts
    pub fn url_path(&self) -> Option<String> {
        match (self.section, self.year) {
            (Section::Blog, Some(year)) => Some(format!("/articles/{}/{}", year, self.slug)),
            _ => None,
        }
    }

    /// Date formatted for display, falling back to the raw front-matter text
    pub fn display_date(&self) -> String {
        match (&self.date, &self.date_raw) {
            (Some(d), _) => d.format("%Y-%m-%d").to_string(),
            (None, Some(raw)) => raw.clone(),
            (None, None) => String::new(),
        }
    }

    /// Text for `<meta name="description">`
    pub fn meta_description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.title)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A document plus its sanitized HTML body
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    #[serde(flatten)]
    pub document: Document,

    /// Sanitized HTML, safe to embed
    pub html: String,
}
