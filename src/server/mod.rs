//! HTTP server
//!
//! Pages are rendered per request from the content directory. Only the
//! GitHub repository list is kept between requests.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::{ContentLoader, MarkdownRenderer};
use crate::github::{GithubClient, RepoCache};
use crate::listing::{self, Filter};
use crate::seo::{self, Sitemap};
use crate::templates::TemplateRenderer;
use crate::Site;

/// Shared server state
pub struct AppState {
    site: Site,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
    github: Option<GithubClient>,
    repos: RepoCache,
}

impl AppState {
    pub fn new(site: Site) -> Result<Self> {
        let github = if site.config.github.username.trim().is_empty() {
            None
        } else {
            match GithubClient::from_env() {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!("GitHub client unavailable: {:#}", e);
                    None
                }
            }
        };

        Ok(Self {
            repos: RepoCache::new(Duration::from_secs(site.config.github.cache_ttl_secs)),
            templates: TemplateRenderer::new()?,
            markdown: MarkdownRenderer::new(),
            github,
            site,
        })
    }

    /// Replace the GitHub client, e.g. to point it at another API host
    pub fn with_github(mut self, client: Option<GithubClient>) -> Self {
        self.github = client;
        self
    }

    fn loader(&self) -> ContentLoader<'_> {
        ContentLoader::new(&self.site.content_dir, &self.markdown)
    }

    fn not_found(&self) -> AppError {
        match self.templates.not_found(&self.site.config) {
            Ok(page) => AppError::NotFound(page),
            Err(e) => AppError::Internal(e),
        }
    }
}

/// Errors a handler can end with
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Carries the rendered not-found page
    #[error("page not found")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<crate::content::ContentError> for AppError {
    fn from(error: crate::content::ContentError) -> Self {
        AppError::Internal(error.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(page) => (StatusCode::NOT_FOUND, Html(page)).into_response(),
            AppError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

type PageResult = Result<Html<String>, AppError>;

/// Run filesystem-bound work off the async runtime
async fn blocking<T, F>(state: &Arc<AppState>, work: F) -> Result<T, AppError>
where
    F: FnOnce(&AppState) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&*state))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
}

/// Build the router for the given state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/blog", get(blog))
        .route("/projects", get(projects))
        .route("/projects/:slug", get(project))
        .route("/articles/:year/:slug", get(article))
        .route("/robots.txt", get(robots))
        .route("/sitemap.xml", get(sitemap))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(site.clone())?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn home(State(state): State<Arc<AppState>>) -> PageResult {
    blocking(&state, |state| {
        let posts = state.loader().load_posts()?;
        let latest = listing::latest(&posts, state.site.config.latest_posts);
        Ok(Html(state.templates.home(&state.site.config, &latest)?))
    })
    .await
}

async fn about(State(state): State<Arc<AppState>>) -> PageResult {
    Ok(Html(state.templates.about(&state.site.config)?))
}

#[derive(Debug, Default, Deserialize)]
struct BlogQuery {
    tag: Option<String>,
    year: Option<String>,
    q: Option<String>,
}

async fn blog(State(state): State<Arc<AppState>>, Query(query): Query<BlogQuery>) -> PageResult {
    let filter = Filter::from_params(
        query.tag.as_deref(),
        query.year.as_deref(),
        query.q.as_deref(),
    );

    blocking(&state, move |state| {
        let posts = state.loader().load_posts()?;
        let groups = listing::filter(&posts, &filter);
        Ok(Html(state.templates.blog(
            &state.site.config,
            &groups,
            &posts,
            &filter,
        )?))
    })
    .await
}

async fn article(
    State(state): State<Arc<AppState>>,
    Path((year, slug)): Path<(String, String)>,
) -> PageResult {
    blocking(&state, move |state| match state.loader().load_post(&year, &slug) {
        Ok(article) => Ok(Html(state.templates.article(&state.site.config, &article)?)),
        Err(e) if e.is_not_found() => {
            tracing::debug!("{}", e);
            Err(state.not_found())
        }
        Err(e) => Err(e.into()),
    })
    .await
}

async fn projects(State(state): State<Arc<AppState>>) -> PageResult {
    let local = blocking(&state, |state| Ok(state.loader().load_projects()?)).await?;

    let repos = match &state.github {
        Some(client) => {
            let username = state.site.config.github.username.trim();
            Some(
                state
                    .repos
                    .get_or_fetch(|| client.fetch_repos(username))
                    .await,
            )
        }
        None => None,
    };

    Ok(Html(state.templates.projects(
        &state.site.config,
        &local,
        repos.as_deref(),
    )?))
}

async fn project(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> PageResult {
    blocking(&state, move |state| match state.loader().load_project(&slug) {
        Ok(project) => Ok(Html(state.templates.project(&state.site.config, &project)?)),
        Err(e) if e.is_not_found() => {
            tracing::debug!("{}", e);
            Err(state.not_found())
        }
        Err(e) => Err(e.into()),
    })
    .await
}

async fn robots(State(state): State<Arc<AppState>>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        seo::robots_txt(state.site.config.base_url()),
    )
        .into_response()
}

async fn sitemap(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let xml = blocking(&state, |state| {
        let posts = state.loader().load_posts()?;
        let config = &state.site.config;
        Ok(Sitemap::build(config.base_url(), &config.sitemap.static_routes, &posts).into_xml())
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}

/// Serve files from the public directory, or the not-found page
async fn fallback_handler(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    let mut service =
        ServeDir::new(&state.site.public_dir).append_index_html_on_directories(true);

    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => state.not_found().into_response(),
        Err(e) => {
            tracing::error!("Failed to serve static file: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}
