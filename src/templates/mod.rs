//! Built-in site templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on; only
//! sanitized markdown output is marked `safe` inside the templates.

use anyhow::Result;
use chrono::Datelike;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tera::{Context, Tera};

use crate::config::{AboutConfig, SiteConfig};
use crate::content::{Document, RenderedDocument};
use crate::github::GithubRepo;
use crate::helpers;
use crate::listing::{Filter, YearGroup, ALL};

/// How blog filter links are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// `/blog?tag=..&year=..&q=..`, answered by the server
    Query,
    /// Pre-rendered pages under `/blog/tag/<tag>/` and `/blog/<year>/`
    Static,
}

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
    links: LinkMode,
}

impl TemplateRenderer {
    /// Create a renderer for pages served by the server
    pub fn new() -> Result<Self> {
        Self::with_links(LinkMode::Query)
    }

    /// Create a renderer for files written by the generator
    pub fn for_static_site() -> Result<Self> {
        Self::with_links(LinkMode::Static)
    }

    pub fn with_links(links: LinkMode) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("about.html", include_str!("site/about.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("article.html", include_str!("site/article.html")),
            ("projects.html", include_str!("site/projects.html")),
            ("project.html", include_str!("site/project.html")),
            ("not_found.html", include_str!("site/not_found.html")),
        ])?;

        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera, links })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    fn base_context(&self, config: &SiteConfig, active: &str, path: &str) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from(config));
        context.insert("active", active);
        context.insert("canonical", &helpers::full_url_for(config, path));
        context.insert("now_year", &chrono::Local::now().year());
        context
    }

    /// Home page with the latest posts
    pub fn home(&self, config: &SiteConfig, latest: &[Document]) -> Result<String> {
        let mut context = self.base_context(config, "home", "/");
        let latest: Vec<PostData> = latest.iter().map(|d| PostData::new(d, self.links)).collect();
        context.insert("latest", &latest);
        self.render("home.html", &context)
    }

    pub fn about(&self, config: &SiteConfig) -> Result<String> {
        let mut context = self.base_context(config, "about", "/about");
        context.insert("about", &AboutData::from(&config.about));
        self.render("about.html", &context)
    }

    /// Blog listing; `groups` is already filtered, `all_posts` feeds the
    /// filter controls
    pub fn blog(
        &self,
        config: &SiteConfig,
        groups: &[YearGroup],
        all_posts: &[Document],
        filter: &Filter,
    ) -> Result<String> {
        let mut context = self.base_context(config, "blog", "/blog");

        let groups: Vec<YearGroupData> = groups
            .iter()
            .map(|g| YearGroupData::new(g, self.links))
            .collect();
        let tags = crate::listing::all_tags(all_posts);
        let years = crate::listing::all_years(all_posts);

        context.insert("groups", &groups);
        context.insert("filter", &FilterData::from(filter));
        context.insert("static_site", &(self.links == LinkMode::Static));

        match self.links {
            LinkMode::Query => {
                let years: Vec<String> = years.iter().map(|y| y.to_string()).collect();
                context.insert("tags", &tags);
                context.insert("years", &years);
            }
            LinkMode::Static => {
                context.insert("tag_facets", &static_tag_facets(&tags, filter));
                context.insert("year_facets", &static_year_facets(&years, filter));
            }
        }
        self.render("blog.html", &context)
    }

    pub fn article(&self, config: &SiteConfig, article: &RenderedDocument) -> Result<String> {
        let path = article.document.url_path().unwrap_or_default();
        let mut context = self.base_context(config, "blog", &path);
        context.insert("article", &ArticleData::new(article, self.links));
        self.render("article.html", &context)
    }

    /// Projects page. `repos` is `None` when GitHub is not configured and
    /// `Some(empty)` when the fetch came back with nothing.
    pub fn projects(
        &self,
        config: &SiteConfig,
        projects: &[Document],
        repos: Option<&[GithubRepo]>,
    ) -> Result<String> {
        let mut context = self.base_context(config, "projects", "/projects");
        let projects: Vec<ProjectData> = projects.iter().map(ProjectData::from).collect();
        context.insert("projects", &projects);
        context.insert(
            "github",
            &GithubData {
                enabled: repos.is_some(),
                repos: repos.map(|r| r.to_vec()).unwrap_or_default(),
            },
        );
        self.render("projects.html", &context)
    }

    /// A single project with its rendered body
    pub fn project(&self, config: &SiteConfig, project: &RenderedDocument) -> Result<String> {
        let data = ProjectData::from(&project.document);
        let mut context = self.base_context(config, "projects", &data.url);
        context.insert("project", &data);
        context.insert("html", &project.html);
        context.insert("description", project.document.meta_description());
        self.render("project.html", &context)
    }

    pub fn not_found(&self, config: &SiteConfig) -> Result<String> {
        let context = self.base_context(config, "", "/404");
        self.render("not_found.html", &context)
    }
}

/// Tera filter: format date string
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    Ok(tera::Value::String(helpers::reformat_date_str(&s, &format)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub intro: String,
    pub language: String,
    pub url: String,
}

impl From<&SiteConfig> for SiteData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            intro: config.intro.clone(),
            language: config.language.clone(),
            url: config.base_url().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutData {
    pub paragraphs: Vec<String>,
    pub links: Vec<LinkData>,
}

impl From<&AboutConfig> for AboutData {
    fn from(about: &AboutConfig) -> Self {
        Self {
            paragraphs: about.paragraphs.clone(),
            links: about
                .links
                .iter()
                .map(|l| LinkData {
                    name: l.name.clone(),
                    url: l.url.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkData {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagLink {
    pub name: String,
    pub url: String,
}

/// An empty `url` renders the tag as plain text
fn tag_links(tags: &[String], links: LinkMode) -> Vec<TagLink> {
    tags.iter()
        .map(|t| TagLink {
            name: t.clone(),
            url: match links {
                LinkMode::Query => helpers::tag_url(t),
                LinkMode::Static => helpers::static_tag_url(t).unwrap_or_default(),
            },
        })
        .collect()
}

/// One entry of the static filter navigation
#[derive(Debug, Clone, Serialize)]
pub struct FacetLink {
    pub name: String,
    pub url: String,
    pub active: bool,
}

/// Spellings that share a tag page collapse into one link
fn static_tag_facets(tags: &[String], filter: &Filter) -> Vec<FacetLink> {
    let mut facets = vec![FacetLink {
        name: "All tags".to_string(),
        url: "/blog/".to_string(),
        active: filter.tag.is_none() && filter.year.is_none(),
    }];

    let mut seen = HashSet::new();
    for tag in tags {
        let Some(url) = helpers::static_tag_url(tag) else {
            continue;
        };
        if seen.insert(url.clone()) {
            facets.push(FacetLink {
                name: tag.clone(),
                url,
                active: filter.tag.as_deref() == Some(tag.as_str()),
            });
        }
    }
    facets
}

fn static_year_facets(years: &[i32], filter: &Filter) -> Vec<FacetLink> {
    years
        .iter()
        .map(|&y| FacetLink {
            name: y.to_string(),
            url: helpers::static_year_url(y),
            active: filter.year == Some(y),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub date: String,
    pub url: String,
    pub tags: Vec<TagLink>,
}

impl PostData {
    fn new(doc: &Document, links: LinkMode) -> Self {
        Self {
            title: doc.title.clone(),
            date: doc.display_date(),
            url: doc
                .year
                .map(|y| helpers::article_url(y, &doc.slug))
                .unwrap_or_default(),
            tags: tag_links(&doc.tags, links),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct YearGroupData {
    pub year: String,
    pub posts: Vec<PostData>,
}

impl YearGroupData {
    fn new(group: &YearGroup, links: LinkMode) -> Self {
        Self {
            year: group.year.map(|y| y.to_string()).unwrap_or_default(),
            posts: group.posts.iter().map(|d| PostData::new(d, links)).collect(),
        }
    }
}

/// Filter state echoed back into the controls
#[derive(Debug, Clone, Serialize)]
pub struct FilterData {
    pub tag: String,
    pub year: String,
    pub search: String,
}

impl From<&Filter> for FilterData {
    fn from(filter: &Filter) -> Self {
        Self {
            tag: filter.tag.clone().unwrap_or_else(|| ALL.to_string()),
            year: filter
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| ALL.to_string()),
            search: filter.search.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleData {
    pub title: String,
    pub description: String,
    pub date: String,
    pub tags: Vec<TagLink>,
    pub html: String,
}

impl ArticleData {
    fn new(article: &RenderedDocument, links: LinkMode) -> Self {
        let doc = &article.document;
        Self {
            title: doc.title.clone(),
            description: doc.meta_description().to_string(),
            date: doc.display_date(),
            tags: tag_links(&doc.tags, links),
            html: article.html.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectData {
    pub slug: String,
    /// Link to the project page
    pub url: String,
    pub title: String,
    pub description: String,
    pub year: String,
    pub stars: u64,
    pub language: String,
    pub repo_url: String,
    pub homepage: String,
    pub tags: Vec<String>,
}

impl From<&Document> for ProjectData {
    fn from(doc: &Document) -> Self {
        // Front-matter links are dropped unless they are http(s)
        Self {
            slug: doc.slug.clone(),
            url: helpers::project_url(&doc.slug),
            title: doc.title.clone(),
            description: doc.description.clone().unwrap_or_default(),
            year: doc.year.map(|y| y.to_string()).unwrap_or_default(),
            stars: doc.stars.unwrap_or(0),
            language: doc.language.clone().unwrap_or_default(),
            repo_url: doc
                .repo
                .as_deref()
                .and_then(|r| helpers::safe_href(&format!("https://github.com/{}", r)))
                .unwrap_or_default(),
            homepage: doc
                .homepage
                .as_deref()
                .and_then(helpers::safe_href)
                .unwrap_or_default(),
            tags: doc.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GithubData {
    pub enabled: bool,
    pub repos: Vec<GithubRepo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{FrontMatter, Section};
    use crate::listing;

    fn post(slug: &str, year: i32, yaml: &str) -> Document {
        let (fm, body) = FrontMatter::parse(yaml);
        Document::from_front_matter(Section::Blog, slug, Some(year), fm, body).unwrap()
    }

    fn posts() -> Vec<Document> {
        vec![
            post("hello", 2024, "---\ntitle: Hello <World>\ndate: 2024-01-15\ntags: [rust]\n---\n"),
            post("older", 2023, "---\ntitle: Older\ndate: 2023-03-01\n---\n"),
        ]
    }

    #[test]
    fn test_all_templates_parse() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_home_lists_latest_and_escapes() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer.home(&SiteConfig::default(), &posts()).unwrap();
        assert!(html.contains("Latest Posts"));
        assert!(html.contains(r#"href="/articles/2024/hello""#));
        assert!(html.contains("Hello &lt;World&gt;"));
        assert!(html.contains("2023-03-01"));
    }

    #[test]
    fn test_blog_grouped_and_empty_state() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();
        let all = posts();

        let groups = listing::filter(&all, &Filter::default());
        let html = renderer.blog(&config, &groups, &all, &Filter::default()).unwrap();
        assert!(html.contains("<h2>2024</h2>"));
        assert!(html.contains("<h2>2023</h2>"));
        assert!(html.contains(r#"href="/blog?tag=rust""#));
        assert!(!html.contains("No posts match your filters."));

        let filter = Filter::from_params(Some("go"), None, None);
        let groups = listing::filter(&all, &filter);
        let html = renderer.blog(&config, &groups, &all, &filter).unwrap();
        assert!(html.contains("No posts match your filters."));
    }

    #[test]
    fn test_article_embeds_sanitized_html() {
        let renderer = TemplateRenderer::new().unwrap();
        let doc = posts().remove(0);
        let article = RenderedDocument {
            document: doc,
            html: "<p>Body <strong>bold</strong></p>".to_string(),
        };
        let html = renderer.article(&SiteConfig::default(), &article).unwrap();
        assert!(html.contains("<p>Body <strong>bold</strong></p>"));
        assert!(html.contains("January 15, 2024"));
        assert!(html.contains("<title>Hello &lt;World&gt; | Portfolio</title>"));
    }

    #[test]
    fn test_projects_states() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();

        let html = renderer.projects(&config, &[], None).unwrap();
        assert!(html.contains("No projects yet."));
        assert!(!html.contains("On GitHub"));

        let html = renderer.projects(&config, &[], Some(&[])).unwrap();
        assert!(html.contains("temporarily unavailable"));
    }

    fn project(yaml: &str) -> Document {
        let (fm, body) = FrontMatter::parse(yaml);
        Document::from_front_matter(Section::Projects, "tool", None, fm, body).unwrap()
    }

    #[test]
    fn test_project_links_keep_only_http() {
        let doc = project(
            "---\ntitle: Tool\nrepo: me/tool\nhomepage: \"javascript:alert(1)\"\n---\n",
        );
        let data = ProjectData::from(&doc);
        assert_eq!(data.url, "/projects/tool");
        assert_eq!(data.repo_url, "https://github.com/me/tool");
        assert_eq!(data.homepage, "");

        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer.projects(&SiteConfig::default(), &[doc], None).unwrap();
        assert!(html.contains(r#"href="/projects/tool""#));
        assert!(html.contains(r#"href="https://github.com/me/tool""#));
        assert!(!html.contains("javascript:"));

        let doc = project("---\ntitle: Tool\nhomepage: \"https://tool.dev\"\n---\n");
        assert_eq!(ProjectData::from(&doc).homepage, "https://tool.dev");
    }

    #[test]
    fn test_project_page_embeds_body() {
        let renderer = TemplateRenderer::new().unwrap();
        let rendered = RenderedDocument {
            document: project("---\ntitle: Tool <1>\ndescription: Handy\n---\n"),
            html: "<h2>About</h2><p>Body</p>".to_string(),
        };
        let html = renderer.project(&SiteConfig::default(), &rendered).unwrap();
        assert!(html.contains("<h2>About</h2><p>Body</p>"));
        assert!(html.contains("<title>Tool &lt;1&gt; | Portfolio</title>"));
        assert!(html.contains(r#"content="Handy""#));
    }

    #[test]
    fn test_static_blog_has_no_query_links() {
        let renderer = TemplateRenderer::for_static_site().unwrap();
        let config = SiteConfig::default();
        let all = vec![
            post("a", 2024, "---\ntitle: A\ndate: 2024-01-15\ntags: [rust, \"!!\"]\n---\n"),
            post("b", 2023, "---\ntitle: B\ndate: 2023-03-01\ntags: [Rust]\n---\n"),
        ];

        let filter = Filter {
            year: Some(2023),
            ..Default::default()
        };
        let groups = listing::filter(&all, &filter);
        let html = renderer.blog(&config, &groups, &all, &filter).unwrap();
        assert!(!html.contains("<form"));
        assert!(!html.contains("?tag="));
        assert!(html.contains(r#"class="tag active" href="/blog/2023/""#));
        assert_eq!(html.matches(r#"href="/blog/tag/rust/""#).count(), 2);

        // A tag with no usable slug has no page to link to
        let groups = listing::filter(&all, &Filter::default());
        let html = renderer.blog(&config, &groups, &all, &Filter::default()).unwrap();
        assert!(html.contains(r#"<span class="tag">!!</span>"#));
        assert!(html.contains(r#"class="tag active" href="/blog/""#));
    }

    #[test]
    fn test_not_found() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer.not_found(&SiteConfig::default()).unwrap();
        assert!(html.contains("404"));
    }
}
