//! Create a new blog post

use anyhow::{Context, Result};
use chrono::Datelike;
use std::fs;
use std::path::PathBuf;

use crate::content::Section;
use crate::Site;

/// Create `content/blogs/<year>/<slug>.md` and return its path.
///
/// `year` defaults to the current year. Existing files are never overwritten.
pub fn create_post(site: &Site, title: &str, year: Option<i32>) -> Result<PathBuf> {
    let now = chrono::Local::now();
    let year = year.unwrap_or_else(|| now.year());

    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    let target_dir = site
        .content_dir
        .join(Section::Blog.dir_name())
        .join(format!("{:04}", year));
    fs::create_dir_all(&target_dir)
        .with_context(|| format!("Failed to create {:?}", target_dir))?;

    let file_path = target_dir.join(format!("{}.md", slug));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    // Posts filed under another year are dated January 1st of that year
    let date = if year == now.year() {
        now.format("%Y-%m-%d").to_string()
    } else {
        format!("{:04}-01-01", year)
    };

    let front_matter = format!(
        "---\ntitle: {}\ndate: {}\ndescription: ''\ntags: []\n---\n\n",
        serde_yaml::to_string(title)?.trim_end(),
        date
    );

    fs::write(&file_path, front_matter)
        .with_context(|| format!("Failed to write {:?}", file_path))?;

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::{ContentLoader, MarkdownRenderer};
    use tempfile::TempDir;

    #[test]
    fn test_create_post() {
        let temp = TempDir::new().unwrap();
        let site = Site::with_config(temp.path().to_path_buf(), SiteConfig::default());

        let path = create_post(&site, "Hello: A \"New\" Post", Some(2021)).unwrap();
        assert!(path.ends_with("content/blogs/2021/hello-a-new-post.md"));

        let markdown = MarkdownRenderer::new();
        let article = ContentLoader::new(&site.content_dir, &markdown)
            .load_post("2021", "hello-a-new-post")
            .unwrap();
        assert_eq!(article.document.title, "Hello: A \"New\" Post");
        assert_eq!(article.document.display_date(), "2021-01-01");
    }

    #[test]
    fn test_create_post_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let site = Site::with_config(temp.path().to_path_buf(), SiteConfig::default());

        create_post(&site, "Same", Some(2024)).unwrap();
        assert!(create_post(&site, "Same", Some(2024)).is_err());
        assert!(create_post(&site, "!!!", Some(2024)).is_err());
    }
}
