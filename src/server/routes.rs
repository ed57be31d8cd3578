//! Read endpoints over the post repository

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::content::{AdjacentPosts, Post, PostMetadata};
use crate::feed::Feed;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/:slug", get(get_post))
        .route("/posts/:slug/adjacent", get(adjacent_posts))
        .route("/tags", get(list_tags))
        .route("/tags/:tag", get(posts_by_tag))
        .route("/search", get(search))
        .route("/feed.xml", get(rss_feed))
        .route("/atom.xml", get(atom_feed))
        .route("/feed.json", get(json_feed))
        .with_state(state)
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let posts = state.repo.all_posts().await?;
    if posts.is_empty() {
        return Err(ApiError::NotFound("no posts found".to_string()));
    }
    Ok(Json(json!({ "posts": posts })))
}

async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    state
        .repo
        .post(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("post '{}' not found", slug)))
}

async fn adjacent_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<AdjacentPosts>, ApiError> {
    Ok(Json(state.repo.adjacent_posts(&slug).await?))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.repo.tags().await?))
}

async fn posts_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let posts = state.repo.posts_by_tag(&tag).await?;
    Ok(Json(json!({ "posts": posts })))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PostMetadata>>, ApiError> {
    let query = params.query.unwrap_or_default();
    let results = state.repo.search(&query).await?;
    Ok(Json(results.into_iter().map(|r| r.item).collect()))
}

async fn rss_feed(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.repo.snapshot().await?;
    let xml = Feed::new(&state.config, snapshot.posts()).to_rss()?;
    Ok(with_content_type("application/rss+xml; charset=utf-8", xml))
}

async fn atom_feed(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.repo.snapshot().await?;
    let xml = Feed::new(&state.config, snapshot.posts()).to_atom();
    Ok(with_content_type("application/atom+xml; charset=utf-8", xml))
}

async fn json_feed(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.repo.snapshot().await?;
    let json = Feed::new(&state.config, snapshot.posts()).to_json()?;
    Ok(with_content_type("application/feed+json; charset=utf-8", json))
}

fn with_content_type(content_type: &'static str, body: String) -> Response {
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}
