/// Public lookup endpoints
use crate::{
    api::extract::JsonBody,
    error::SeekerResult,
    profile::{PostSummary, ProfileRecord},
    AppContext,
};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::{headers::UserAgent, TypedHeader};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Build lookup routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/search", post(search_profile))
        .route("/get_posts/:username", get(get_posts))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Missing and null both count as empty
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: ProfileRecord,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub success: bool,
    pub posts: Vec<PostSummary>,
}

/// Resolve a profile and record the search
pub async fn search_profile(
    State(ctx): State<AppContext>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    user_agent: Option<TypedHeader<UserAgent>>,
    JsonBody(req): JsonBody<SearchRequest>,
) -> SeekerResult<Json<SearchResponse>> {
    let origin = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let signature = user_agent
        .map(|TypedHeader(ua)| ua.as_str().to_string())
        .unwrap_or_default();

    let username = req.username.unwrap_or_default();
    let profile = ctx.gateway.lookup(&username, &origin, &signature).await?;

    Ok(Json(SearchResponse {
        success: true,
        data: profile,
    }))
}

/// Resolve a profile again and return just its posts
pub async fn get_posts(
    State(ctx): State<AppContext>,
    Path(username): Path<String>,
) -> (StatusCode, Json<PostsResponse>) {
    match ctx.gateway.posts(&username).await {
        Ok(posts) => (
            StatusCode::OK,
            Json(PostsResponse {
                success: true,
                posts,
            }),
        ),
        Err(e) => {
            tracing::debug!(username = %username, error = %e, "posts lookup failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(PostsResponse {
                    success: false,
                    posts: Vec::new(),
                }),
            )
        }
    }
}
