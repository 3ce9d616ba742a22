//! Listing and filtering over loaded documents
//!
//! Everything here is a pure function of its input: sort by date (newest
//! first), bucket by year, and filter by tag, year and title text.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::content::Document;

/// Sentinel the filter controls use for "no constraint"
pub const ALL: &str = "All";

/// Tag, year and title-search constraints. `Default` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub tag: Option<String>,
    pub year: Option<i32>,
    pub search: String,
}

impl Filter {
    /// Build a filter from raw control values, where `"All"` or an empty
    /// value means unconstrained
    pub fn from_params(tag: Option<&str>, year: Option<&str>, search: Option<&str>) -> Self {
        let constrained = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|v| !v.is_empty() && *v != ALL)
                .map(str::to_string)
        };

        let year = constrained(year).and_then(|y| match y.parse::<i32>() {
            Ok(year) => Some(year),
            Err(_) => {
                tracing::debug!("Ignoring invalid year filter {:?}", y);
                None
            }
        });

        Self {
            tag: constrained(tag),
            year,
            search: search.map(str::trim).unwrap_or_default().to_string(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.tag.is_none() && self.year.is_none() && self.search.trim().is_empty()
    }

    /// Whether a single document passes every constraint
    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(year) = self.year {
            if doc.year != Some(year) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !doc.has_tag(tag) {
                return false;
            }
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || doc.title.to_lowercase().contains(&needle)
    }
}

/// Documents sharing a year, newest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGroup {
    pub year: Option<i32>,
    pub posts: Vec<Document>,
}

/// Newest first. Undated documents go last; equal dates order by slug.
fn by_date_desc(a: &Document, b: &Document) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.slug.cmp(&b.slug))
}

/// Sort in place by date descending (stable)
pub fn sort_by_date(docs: &mut [Document]) {
    docs.sort_by(by_date_desc);
}

/// Bucket documents by year, keys descending, keeping the input order
/// within each bucket. Documents without a year form the last group.
pub fn group_by_year(docs: Vec<Document>) -> Vec<YearGroup> {
    let mut groups: BTreeMap<Option<i32>, Vec<Document>> = BTreeMap::new();
    for doc in docs {
        groups.entry(doc.year).or_default().push(doc);
    }

    groups
        .into_iter()
        .rev()
        .map(|(year, posts)| YearGroup { year, posts })
        .collect()
}

/// Apply a filter, then sort and group the survivors.
///
/// An empty result is an empty `Vec`; callers render the "no matches" state.
pub fn filter(docs: &[Document], filter: &Filter) -> Vec<YearGroup> {
    let mut matched: Vec<Document> = docs.iter().filter(|d| filter.matches(d)).cloned().collect();
    sort_by_date(&mut matched);
    group_by_year(matched)
}

/// The `n` most recent documents across all years
pub fn latest(docs: &[Document], n: usize) -> Vec<Document> {
    let mut all = docs.to_vec();
    sort_by_date(&mut all);
    all.truncate(n);
    all
}

/// Every tag in use, sorted and deduplicated
pub fn all_tags(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .flat_map(|d| d.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every year in use, newest first
pub fn all_years(docs: &[Document]) -> Vec<i32> {
    docs.iter()
        .filter_map(|d| d.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Section;
    use chrono::NaiveDate;

    fn doc(slug: &str, date: &str, tags: &[&str]) -> Document {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        Document {
            slug: slug.to_string(),
            section: Section::Blog,
            year: Some(chrono::Datelike::year(&date)),
            title: slug.replace('-', " "),
            description: None,
            date: Some(date),
            date_raw: Some(date.to_string()),
            updated: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            stars: None,
            repo: None,
            homepage: None,
            language: None,
            raw: String::new(),
            source: Default::default(),
        }
    }

    fn sample() -> Vec<Document> {
        vec![
            doc("spring-notes", "2023-05-01", &["life"]),
            doc("rust-async", "2024-01-01", &["rust", "async"]),
            doc("old-post", "2022-01-01", &[]),
            doc("rust-summer", "2023-06-01", &["rust"]),
        ]
    }

    fn slugs(groups: &[YearGroup]) -> Vec<Vec<&str>> {
        groups
            .iter()
            .map(|g| g.posts.iter().map(|p| p.slug.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_default_filter_returns_everything_grouped() {
        let groups = filter(&sample(), &Filter::default());
        let years: Vec<_> = groups.iter().map(|g| g.year).collect();
        assert_eq!(years, vec![Some(2024), Some(2023), Some(2022)]);
        assert_eq!(
            slugs(&groups),
            vec![
                vec!["rust-async"],
                vec!["rust-summer", "spring-notes"],
                vec!["old-post"],
            ]
        );
    }

    #[test]
    fn test_tag_filter_is_subset_and_covers_all() {
        let docs = sample();
        let mut seen = BTreeSet::new();
        for tag in all_tags(&docs) {
            let f = Filter {
                tag: Some(tag.clone()),
                ..Default::default()
            };
            for group in filter(&docs, &f) {
                for post in group.posts {
                    assert!(post.has_tag(&tag));
                    seen.insert(post.slug);
                }
            }
        }
        for untagged in docs.iter().filter(|d| d.tags.is_empty()) {
            seen.insert(untagged.slug.clone());
        }
        let everything: BTreeSet<_> = docs.iter().map(|d| d.slug.clone()).collect();
        assert_eq!(seen, everything);
    }

    #[test]
    fn test_year_and_search_filters() {
        let docs = sample();
        let f = Filter::from_params(Some("All"), Some("2023"), Some("  RUST "));
        assert_eq!(f.tag, None);
        assert_eq!(f.year, Some(2023));
        assert_eq!(slugs(&filter(&docs, &f)), vec![vec!["rust-summer"]]);
    }

    #[test]
    fn test_search_matches_title_only() {
        let mut docs = sample();
        docs[2].raw = "this body mentions rust".to_string();
        let f = Filter::from_params(None, None, Some("rust"));
        let groups = filter(&docs, &f);
        assert_eq!(slugs(&groups), vec![vec!["rust-async"], vec!["rust-summer"]]);
    }

    #[test]
    fn test_no_matches_is_empty() {
        let f = Filter::from_params(Some("haskell"), None, None);
        assert!(filter(&sample(), &f).is_empty());
    }

    #[test]
    fn test_from_params_defaults() {
        assert!(Filter::from_params(Some("All"), Some("All"), Some("")).is_default());
        assert!(Filter::from_params(None, Some("nineteen"), None).is_default());
    }

    #[test]
    fn test_latest() {
        let latest = latest(&sample(), 2);
        let dates: Vec<_> = latest.iter().map(|d| d.display_date()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2023-06-01"]);
        assert_eq!(super::latest(&sample(), 10).len(), 4);
    }

    #[test]
    fn test_equal_dates_order_by_slug() {
        let docs = vec![
            doc("zeta", "2024-03-03", &[]),
            doc("alpha", "2024-03-03", &[]),
            doc("mid", "2024-03-03", &[]),
        ];
        let groups = filter(&docs, &Filter::default());
        assert_eq!(slugs(&groups), vec![vec!["alpha", "mid", "zeta"]]);
    }

    #[test]
    fn test_undated_sorts_last() {
        let mut docs = sample();
        docs[0].date = None;
        sort_by_date(&mut docs);
        assert_eq!(docs.last().unwrap().slug, "spring-notes");
    }

    #[test]
    fn test_facets() {
        let docs = sample();
        assert_eq!(all_tags(&docs), vec!["async", "life", "rust"]);
        assert_eq!(all_years(&docs), vec![2024, 2023, 2022]);
    }
}
