//! Clean the public directory

use anyhow::{Context, Result};
use std::fs;

use crate::Site;

/// Remove the generated public directory
pub fn run(site: &Site) -> Result<()> {
    if site.public_dir.exists() {
        fs::remove_dir_all(&site.public_dir)
            .with_context(|| format!("Failed to delete {:?}", site.public_dir))?;
        tracing::info!("Deleted: {:?}", site.public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_public_only() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("public/blog")).unwrap();
        fs::create_dir_all(temp.path().join("content/blogs")).unwrap();

        let site = Site::with_config(temp.path().to_path_buf(), SiteConfig::default());
        run(&site).unwrap();
        assert!(!temp.path().join("public").exists());
        assert!(temp.path().join("content/blogs").exists());

        // Nothing to delete is fine
        run(&site).unwrap();
    }
}
