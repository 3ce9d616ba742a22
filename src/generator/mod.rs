//! Generator module - renders the whole site into the public directory

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::content::{ContentLoader, Document, MarkdownRenderer};
use crate::helpers;
use crate::listing::{self, Filter};
use crate::seo::{self, Sitemap};
use crate::templates::TemplateRenderer;
use crate::Site;

/// Static site generator using the built-in templates
pub struct Generator {
    site: Site,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        Ok(Self {
            site: site.clone(),
            templates: TemplateRenderer::for_static_site()?,
            markdown: MarkdownRenderer::new(),
        })
    }

    /// Generate the entire site, returning the number of files written.
    ///
    /// The projects page is built from local project files only; no GitHub
    /// request is made. Blog filters become one page per tag and per year,
    /// since a static host cannot answer `?tag=` queries.
    pub fn generate(&self) -> Result<usize> {
        let config = &self.site.config;
        let loader = ContentLoader::new(&self.site.content_dir, &self.markdown);

        let posts = loader.load_posts()?;
        let projects = loader.load_projects()?;
        tracing::info!("Loaded {} posts and {} projects", posts.len(), projects.len());

        fs::create_dir_all(&self.site.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.site.public_dir))?;

        let mut written = 0;

        let latest = listing::latest(&posts, config.latest_posts);
        self.write("index.html", &self.templates.home(config, &latest)?)?;
        written += 1;

        self.write("about/index.html", &self.templates.about(config)?)?;
        written += 1;

        let groups = listing::filter(&posts, &Filter::default());
        self.write(
            "blog/index.html",
            &self.templates.blog(config, &groups, &posts, &Filter::default())?,
        )?;
        written += 1;

        written += self.generate_tag_pages(&posts)?;
        written += self.generate_year_pages(&posts)?;

        self.write(
            "projects/index.html",
            &self.templates.projects(config, &projects, None)?,
        )?;
        written += 1;

        written += self.generate_articles(&loader, &posts)?;
        written += self.generate_projects(&loader, &projects)?;

        self.write("404.html", &self.templates.not_found(config)?)?;
        self.write("robots.txt", &seo::robots_txt(config.base_url()))?;
        let sitemap = Sitemap::build(config.base_url(), &config.sitemap.static_routes, &posts);
        tracing::debug!("Sitemap has {} entries", sitemap.len());
        self.write("sitemap.xml", &sitemap.into_xml())?;
        self.write("css/highlight.css", &self.markdown.highlight_css()?)?;
        written += 4;

        Ok(written)
    }

    /// One page per article at `articles/<year>/<slug>/index.html`
    fn generate_articles(&self, loader: &ContentLoader<'_>, posts: &[Document]) -> Result<usize> {
        let mut count = 0;

        for post in posts {
            let Some(year) = post.year else {
                continue;
            };

            let article = match loader.load_post(&year.to_string(), &post.slug) {
                Ok(article) => article,
                Err(e) => {
                    tracing::warn!("Skipping article {}/{}: {}", year, post.slug, e);
                    continue;
                }
            };

            let html = self.templates.article(&self.site.config, &article)?;
            let rel = format!("articles/{}/{}/index.html", year, post.slug);
            self.write(&rel, &html)?;
            tracing::debug!("Generated: {}", rel);
            count += 1;
        }

        Ok(count)
    }

    /// `blog/tag/<tag-slug>/index.html`. Tags that slugify the same share
    /// a page, named after the first spelling in sort order.
    fn generate_tag_pages(&self, posts: &[Document]) -> Result<usize> {
        let mut by_slug: BTreeMap<String, String> = BTreeMap::new();
        for tag in listing::all_tags(posts) {
            if let Some(slug) = helpers::tag_slug(&tag) {
                by_slug.entry(slug).or_insert(tag);
            }
        }

        for (slug, name) in &by_slug {
            let mut tagged: Vec<Document> = posts
                .iter()
                .filter(|p| {
                    p.tags
                        .iter()
                        .any(|t| helpers::tag_slug(t).as_deref() == Some(slug.as_str()))
                })
                .cloned()
                .collect();
            listing::sort_by_date(&mut tagged);
            let groups = listing::group_by_year(tagged);

            let filter = Filter {
                tag: Some(name.clone()),
                ..Default::default()
            };
            let html = self.templates.blog(&self.site.config, &groups, posts, &filter)?;
            self.write(&format!("blog/tag/{}/index.html", slug), &html)?;
        }

        Ok(by_slug.len())
    }

    /// `blog/<year>/index.html` for every year with posts
    fn generate_year_pages(&self, posts: &[Document]) -> Result<usize> {
        let years = listing::all_years(posts);
        for &year in &years {
            let filter = Filter {
                year: Some(year),
                ..Default::default()
            };
            let groups = listing::filter(posts, &filter);
            let html = self.templates.blog(&self.site.config, &groups, posts, &filter)?;
            self.write(&format!("blog/{}/index.html", year), &html)?;
        }
        Ok(years.len())
    }

    /// One page per project at `projects/<slug>/index.html`
    fn generate_projects(&self, loader: &ContentLoader<'_>, projects: &[Document]) -> Result<usize> {
        let mut count = 0;

        for project in projects {
            let rendered = match loader.load_project(&project.slug) {
                Ok(rendered) => rendered,
                Err(e) => {
                    tracing::warn!("Skipping project {}: {}", project.slug, e);
                    continue;
                }
            };

            let html = self.templates.project(&self.site.config, &rendered)?;
            let rel = format!("projects/{}/index.html", project.slug);
            self.write(&rel, &html)?;
            tracing::debug!("Generated: {}", rel);
            count += 1;
        }

        Ok(count)
    }

    fn write(&self, rel: &str, content: &str) -> Result<()> {
        write_file(&self.site.public_dir.join(rel), content)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_generate_full_site() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();

        write(
            base,
            "content/blogs/2024/hello.md",
            "---\ntitle: Hello\ndate: 2024-01-15\ntags: [rust, Web Dev]\n---\n\n```rust\nfn main() {}\n```\n",
        );
        write(base, "content/blogs/2024/draft.md", "no front-matter, no title\n");
        write(
            base,
            "content/projects/tool.md",
            "---\ntitle: Tool\ndate: 2023-02-01\nhomepage: \"javascript:alert(1)\"\n---\n\nA **tool**.\n",
        );

        let config = SiteConfig {
            url: "https://example.com".to_string(),
            ..Default::default()
        };
        let site = Site::with_config(base.to_path_buf(), config);
        let count = Generator::new(&site).unwrap().generate().unwrap();
        assert_eq!(count, 13);

        let public = base.join("public");
        for rel in [
            "index.html",
            "about/index.html",
            "blog/index.html",
            "projects/index.html",
            "articles/2024/hello/index.html",
            "projects/tool/index.html",
            "blog/tag/rust/index.html",
            "blog/tag/web-dev/index.html",
            "blog/2024/index.html",
            "404.html",
            "robots.txt",
            "sitemap.xml",
            "css/highlight.css",
        ] {
            assert!(public.join(rel).is_file(), "missing {}", rel);
        }
        assert!(!public.join("articles/2024/draft").exists());

        let article = fs::read_to_string(public.join("articles/2024/hello/index.html")).unwrap();
        assert!(article.contains("class=\"highlight\""));

        let projects = fs::read_to_string(public.join("projects/index.html")).unwrap();
        assert!(projects.contains(r#"href="/projects/tool""#));
        assert!(!projects.contains("javascript:"));

        let tool = fs::read_to_string(public.join("projects/tool/index.html")).unwrap();
        assert!(tool.contains("<strong>tool</strong>"));
        assert!(!tool.contains("javascript:"));

        let sitemap = fs::read_to_string(public.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://example.com/articles/2024/hello</loc>"));
    }

    #[test]
    fn test_static_blog_links_to_generated_pages() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        write(
            base,
            "content/blogs/2024/new.md",
            "---\ntitle: New\ndate: 2024-02-01\ntags: [rust, C++]\n---\n",
        );
        write(
            base,
            "content/blogs/2023/old.md",
            "---\ntitle: Old\ndate: 2023-02-01\ntags: [go, Rust]\n---\n",
        );

        let site = Site::with_config(base.to_path_buf(), SiteConfig::default());
        Generator::new(&site).unwrap().generate().unwrap();
        let public = base.join("public");

        let blog = fs::read_to_string(public.join("blog/index.html")).unwrap();
        assert!(!blog.contains("<form"));
        assert!(!blog.contains("?tag="));
        assert!(!blog.contains("?year="));
        assert!(blog.contains(r#"href="/blog/tag/rust/""#));
        assert!(blog.contains(r#"href="/blog/tag/c/""#));
        assert!(blog.contains(r#"href="/blog/2023/""#));

        // "Rust" and "rust" share one page holding both posts
        let rust = fs::read_to_string(public.join("blog/tag/rust/index.html")).unwrap();
        assert!(rust.contains("/articles/2024/new"));
        assert!(rust.contains("/articles/2023/old"));

        let go = fs::read_to_string(public.join("blog/tag/go/index.html")).unwrap();
        assert!(go.contains("/articles/2023/old"));
        assert!(!go.contains("/articles/2024/new"));

        let year = fs::read_to_string(public.join("blog/2024/index.html")).unwrap();
        assert!(year.contains("/articles/2024/new"));
        assert!(!year.contains("/articles/2023/old"));
        assert!(!public.join("blog/2022").exists());

        let article = fs::read_to_string(public.join("articles/2023/old/index.html")).unwrap();
        assert!(article.contains(r#"href="/blog/tag/go/""#));
        assert!(!article.contains("?tag="));
    }

    #[test]
    fn test_generate_empty_site() {
        let temp = TempDir::new().unwrap();
        let site = Site::with_config(temp.path().to_path_buf(), SiteConfig::default());
        let count = Generator::new(&site).unwrap().generate().unwrap();
        assert_eq!(count, 8);
        assert!(temp.path().join("public/blog/index.html").is_file());
    }
}
