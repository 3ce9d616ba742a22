//! Initialize a new site

use anyhow::{Context, Result};
use chrono::Datelike;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# Site
title: Portfolio
description: Personal portfolio and blog
author: John Doe
intro: I'm a software developer who writes about code, design, and more.
language: en

# URL (SITE_URL overrides this)
url: http://localhost:4000

# Directory
content_dir: content
public_dir: public

# Number of posts on the home page
latest_posts: 6

about:
  paragraphs:
    - Hello! This page is configured in _config.yml.
  links:
    - name: GitHub
      url: https://github.com/

# Leave username empty to hide the GitHub section on /projects.
# GITHUB_TOKEN is read from the environment.
github:
  username: ''
  cache_ttl_secs: 3600

sitemap:
  static_routes: ['', '/about', '/blog', '/projects']
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("A site already exists in {:?}", target_dir);
    }

    let year = chrono::Local::now().year();
    let today = chrono::Local::now().format("%Y-%m-%d");
    let year_dir = target_dir.join("content/blogs").join(year.to_string());

    fs::create_dir_all(&year_dir).with_context(|| format!("Failed to create {:?}", year_dir))?;
    fs::create_dir_all(target_dir.join("content/projects"))?;

    fs::write(&config_path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {:?}", config_path))?;

    let sample_post = format!(
        r#"---
title: Hello World
date: {}
description: The first post on this site.
tags: [welcome]
---

Welcome! This post lives in `content/blogs/{}/hello-world.md`.

## Quick Start

Create a new post:

```bash
$ folio new "My New Post"
```

Run the server:

```bash
$ folio server
```

Generate static files:

```bash
$ folio generate
```
"#,
        today, year
    );

    fs::write(year_dir.join("hello-world.md"), sample_post)?;

    Ok(())
}
