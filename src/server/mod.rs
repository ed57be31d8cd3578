//! HTTP API over the post repository

mod error;
mod routes;

pub use error::ApiError;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, Response};
use axum::Router;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::repository::PostRepository;
use crate::Folio;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub repo: PostRepository,
    pub config: Arc<SiteConfig>,
}

/// Build the API router with its caching and tracing layers
pub fn router(state: AppState) -> Result<Router> {
    let cache_control = HeaderValue::from_str(&state.config.server.cache_control())?;

    // Only successful responses are cacheable
    Ok(routes::build_router(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            move |response: &Response<Body>| {
                response
                    .status()
                    .is_success()
                    .then(|| cache_control.clone())
            },
        ))
        .layer(TraceLayer::new_for_http()))
}

/// Start the API server
pub async fn start(folio: &Folio, ip: &str, port: u16, watch: bool) -> Result<()> {
    let repo = folio.repository();
    let state = AppState {
        repo: repo.clone(),
        config: Arc::new(folio.config.clone()),
    };
    let app = router(state)?;

    // Warm the cache; a failure here is reported again on every request
    match repo.snapshot().await {
        Ok(snapshot) => tracing::info!("Serving {} posts", snapshot.len()),
        Err(e) => tracing::warn!("Initial post cache build failed: {}", e),
    }

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    if watch {
        let content_dir = folio.content_dir.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_content(repo, content_dir).await {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    println!("API listening on http://{}:{}", ip, port);
    if watch {
        println!("Watching {} for changes...", folio.content_dir.display());
    }
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Invalidate and rebuild the cache whenever the content root changes
async fn watch_content(repo: PostRepository, content_dir: PathBuf) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |result: DebounceEventResult| {
            let _ = tx.send(result);
        },
    )?;
    debouncer
        .watcher()
        .watch(&content_dir, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {:?}", content_dir);

    while let Some(result) = rx.recv().await {
        match result {
            Ok(events) => {
                let changed: Vec<_> = events.iter().filter(|e| is_relevant(&e.path)).collect();
                if changed.is_empty() {
                    continue;
                }
                for event in &changed {
                    tracing::info!("Changed: {}", event.path.display());
                }

                repo.cache().invalidate();
                match repo.snapshot().await {
                    Ok(snapshot) => tracing::info!("Reloaded {} posts", snapshot.len()),
                    Err(e) => tracing::error!("Rebuild failed, keeping previous posts: {}", e),
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

/// Editor backups and hidden files never affect the corpus
fn is_relevant(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    !(name.starts_with('.') || name.ends_with('~') || name.ends_with(".swp"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentLoader;
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn write_post(dir: &Path, slug: &str, title: &str, created: &str, tags: &str) {
        let content = format!(
            "---\ntitle: {}\nsummary: A post about {}\ncreated: {}\ntags: {}\n---\n\nHello from {}.\n",
            title, slug, created, tags, slug
        );
        fs::write(dir.join(format!("{}.mdx", slug)), content).unwrap();
    }

    fn app(dir: &Path) -> Router {
        let config = SiteConfig {
            url: "https://example.com".to_string(),
            ..SiteConfig::default()
        };
        let repo = PostRepository::new(ContentLoader::new(dir, 200), config.search.clone());
        router(AppState {
            repo,
            config: Arc::new(config),
        })
        .unwrap()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_post(dir.path(), "first", "First Post", "2024-01-01", "[intro]");
        write_post(dir.path(), "second", "Second Post", "2024-02-01", "[intro, rust]");
        write_post(dir.path(), "third", "Third Post", "2024-03-01", "[]");
        dir
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, _, body) = get(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_list_posts() {
        let dir = fixture();
        let app = app(dir.path());

        let (status, headers, body) = get(&app, "/posts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "public, s-maxage=3600, stale-while-revalidate=21600"
        );

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let slugs: Vec<_> = json["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["slug"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(slugs, vec!["third", "second", "first"]);
        assert_eq!(json["posts"][0]["readingTime"], "1 min read");
        assert!(json["posts"][0].get("content").is_none());
    }

    #[tokio::test]
    async fn test_empty_corpus_is_404() {
        let dir = TempDir::new().unwrap();
        let app = app(dir.path());

        let (status, headers, _) = get(&app, "/posts").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!headers.contains_key(header::CACHE_CONTROL));
    }

    #[tokio::test]
    async fn test_get_post() {
        let dir = fixture();
        let app = app(dir.path());

        let (status, json) = get_json(&app, "/posts/second").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["title"], "Second Post");
        assert_eq!(json["content"], "Hello from second.\n");

        let (status, json) = get_json(&app, "/posts/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "post 'missing' not found");
    }

    #[tokio::test]
    async fn test_adjacent_posts() {
        let dir = fixture();
        let app = app(dir.path());

        let (_, json) = get_json(&app, "/posts/second/adjacent").await;
        assert_eq!(json["prev"]["slug"], "first");
        assert_eq!(json["next"]["slug"], "third");

        let (status, json) = get_json(&app, "/posts/unknown/adjacent").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["prev"].is_null());
        assert!(json["next"].is_null());
    }

    #[tokio::test]
    async fn test_tags() {
        let dir = fixture();
        let app = app(dir.path());

        let (_, json) = get_json(&app, "/tags").await;
        assert_eq!(json, serde_json::json!(["intro", "rust"]));

        let (_, json) = get_json(&app, "/tags/intro").await;
        assert_eq!(json["posts"].as_array().unwrap().len(), 2);

        let (status, json) = get_json(&app, "/tags/none").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["posts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search() {
        let dir = fixture();
        let app = app(dir.path());

        let (status, json) = get_json(&app, "/search?query=Third%20Post").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["slug"], "third");

        let (_, json) = get_json(&app, "/search").await;
        assert!(json.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feeds() {
        let dir = fixture();
        let app = app(dir.path());

        let (status, headers, body) = get(&app, "/feed.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/rss+xml; charset=utf-8"
        );
        assert!(String::from_utf8(body)
            .unwrap()
            .contains("https://example.com/blog/third"));

        let (_, headers, _) = get(&app, "/atom.xml").await;
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/atom+xml; charset=utf-8"
        );

        let (_, json) = get_json(&app, "/feed.json").await;
        assert_eq!(json["items"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_content_root_is_500() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir.path().join("missing"));

        let (status, headers, body) = get(&app, "/posts").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!headers.contains_key(header::CACHE_CONTROL));
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "failed to load posts");
    }

    #[test]
    fn test_is_relevant() {
        assert!(is_relevant(Path::new("content/posts/hello.mdx")));
        assert!(!is_relevant(Path::new("content/posts/.hello.mdx.swp")));
        assert!(!is_relevant(Path::new("content/posts/hello.mdx~")));
    }
}
