//! List site content

use anyhow::Result;
use std::collections::HashMap;

use crate::content::{ContentLoader, MarkdownRenderer};
use crate::listing;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let markdown = MarkdownRenderer::new();
    let loader = ContentLoader::new(&site.content_dir, &markdown);

    match content_type {
        "post" | "posts" => {
            let mut posts = loader.load_posts()?;
            listing::sort_by_date(&mut posts);
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} - {} [{}]",
                    post.display_date(),
                    post.title,
                    post.source.display()
                );
            }
        }
        "project" | "projects" => {
            let projects = loader.load_projects()?;
            println!("Projects ({}):", projects.len());
            for project in projects {
                println!(
                    "  {} ★{} [{}]",
                    project.title,
                    project.stars.unwrap_or(0),
                    project.source.display()
                );
            }
        }
        "tag" | "tags" => {
            let posts = loader.load_posts()?;
            let tags = count_tags(&posts);
            println!("Tags ({}):", tags.len());
            for (tag, count) in tags {
                println!("  {} ({})", tag, count);
            }
        }
        "year" | "years" => {
            let posts = loader.load_posts()?;
            let years = listing::all_years(&posts);
            println!("Years ({}):", years.len());
            for year in years {
                let count = posts.iter().filter(|p| p.year == Some(year)).count();
                println!("  {} ({})", year, count);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, project, tag, year",
                content_type
            );
        }
    }

    Ok(())
}

/// Tag usage counts, most used first, then by name
fn count_tags(posts: &[crate::content::Document]) -> Vec<(String, usize)> {
    let mut tags: HashMap<String, usize> = HashMap::new();
    for post in posts {
        for tag in &post.tags {
            *tags.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    let mut tags: Vec<_> = tags.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Document, FrontMatter, Section};

    fn post(slug: &str, tags: &str) -> Document {
        let content = format!("---\ntitle: {}\ntags: {}\n---\n", slug, tags);
        let (fm, body) = FrontMatter::parse(&content);
        Document::from_front_matter(Section::Blog, slug, Some(2024), fm, body).unwrap()
    }

    #[test]
    fn test_count_tags() {
        let posts = vec![post("a", "[rust, web]"), post("b", "[rust]"), post("c", "[go]")];
        assert_eq!(
            count_tags(&posts),
            vec![
                ("rust".to_string(), 2),
                ("go".to_string(), 1),
                ("web".to_string(), 1)
            ]
        );
    }
}
