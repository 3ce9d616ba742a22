//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;
use crate::listing::Filter;

/// Characters left alone in path segments and query values
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/about") // -> "https://example.com/about"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    join_url(config.base_url(), path)
}

/// Join a base URL and a site path. The root always keeps its trailing slash.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Only `http` and `https` URLs may end up in an `href`
pub fn safe_href(url: &str) -> Option<String> {
    let url = url.trim();
    let scheme = url.split_once("://")?.0.to_ascii_lowercase();
    if matches!(scheme.as_str(), "http" | "https") && !url.contains(char::is_whitespace) {
        Some(url.to_string())
    } else {
        None
    }
}

/// Encode a single path segment or query string value
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Site-relative link to an article page
pub fn article_url(year: i32, slug: &str) -> String {
    format!("/articles/{}/{}", year, encode_component(slug))
}

/// Site-relative link to a project page
pub fn project_url(slug: &str) -> String {
    format!("/projects/{}", encode_component(slug))
}

/// Path segment used for a tag's static listing page; `None` when the tag
/// has no usable characters
pub fn tag_slug(tag: &str) -> Option<String> {
    let slug = slug::slugify(tag);
    (!slug.is_empty()).then_some(slug)
}

/// Static listing page for one tag
pub fn static_tag_url(tag: &str) -> Option<String> {
    tag_slug(tag).map(|slug| format!("/blog/tag/{}/", slug))
}

/// Static listing page for one year
pub fn static_year_url(year: i32) -> String {
    format!("/blog/{}/", year)
}

/// Link to the blog listing with a filter applied
///
/// # Examples
/// ```ignore
/// blog_filter_url(&Filter { tag: Some("c++".into()), ..Default::default() })
/// // -> "/blog?tag=c%2B%2B"
/// ```
pub fn blog_filter_url(filter: &Filter) -> String {
    let mut params = Vec::new();
    if let Some(tag) = &filter.tag {
        params.push(format!("tag={}", encode_component(tag)));
    }
    if let Some(year) = filter.year {
        params.push(format!("year={}", year));
    }
    if !filter.search.trim().is_empty() {
        params.push(format!("q={}", encode_component(filter.search.trim())));
    }

    if params.is_empty() {
        "/blog".to_string()
    } else {
        format!("/blog?{}", params.join("&"))
    }
}

/// Link to the blog listing filtered by one tag
pub fn tag_url(tag: &str) -> String {
    blog_filter_url(&Filter {
        tag: Some(tag.to_string()),
        ..Default::default()
    })
}
