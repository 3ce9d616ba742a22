//! robots.txt and sitemap.xml
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/articles/2024/hello</loc>
//!     <lastmod>2024-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use std::borrow::Cow;

use crate::content::Document;
use crate::helpers::join_url;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Fixed robots directive pointing crawlers at the sitemap
pub fn robots_txt(site_url: &str) -> String {
    [
        "User-agent: *".to_string(),
        "Allow: /".to_string(),
        format!("Sitemap: {}", join_url(site_url, "/sitemap.xml")),
    ]
    .join("\n")
}

pub struct Sitemap {
    urls: Vec<UrlEntry>,
}

struct UrlEntry {
    loc: String,
    lastmod: Option<String>,
}

impl Sitemap {
    /// Static routes first, then one entry per article that has a URL.
    ///
    /// The projects section appears once, through its static route.
    pub fn build(site_url: &str, static_routes: &[String], articles: &[Document]) -> Self {
        let statics = static_routes.iter().map(|route| UrlEntry {
            loc: join_url(site_url, route),
            lastmod: None,
        });

        let articles = articles.iter().filter_map(|doc| {
            let path = doc.url_path()?;
            Some(UrlEntry {
                loc: join_url(site_url, &path),
                lastmod: doc.date.map(|d| d.format("%Y-%m-%d").to_string()),
            })
        });

        Self {
            urls: statics.chain(articles).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_xml(self) -> String {
        let mut xml = String::with_capacity(256 + self.urls.len() * 96);

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"");
        xml.push_str(SITEMAP_NS);
        xml.push_str("\">\n");

        for entry in self.urls {
            xml.push_str("  <url>\n    <loc>");
            xml.push_str(&escape_xml(&entry.loc));
            xml.push_str("</loc>\n");
            if let Some(lastmod) = entry.lastmod {
                xml.push_str("    <lastmod>");
                xml.push_str(&lastmod);
                xml.push_str("</lastmod>\n");
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

/// Escape special XML characters
fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}
