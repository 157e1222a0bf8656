/// Admin API Endpoints
/// Session-cookie login plus a read-only view over the search log
use crate::{
    api::extract::JsonOrForm,
    auth::{AdminAuthContext, SESSION_COOKIE},
    error::SeekerResult,
    search_log::SearchSummary,
    AppContext,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

/// Number of recent searches shown on the dashboard
const DASHBOARD_RECENT_LIMIT: i64 = 50;

/// Build admin routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/logout", get(logout))
        .route("/admin/dashboard", get(dashboard))
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub username: String,
    pub expires_at: i64,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub admin: String,
    #[serde(flatten)]
    pub summary: SearchSummary,
}

/// Verify operator credentials and set the session cookie
///
/// Accepts a urlencoded form or a JSON object with the same fields.
async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    JsonOrForm(form): JsonOrForm<LoginForm>,
) -> SeekerResult<(CookieJar, Json<LoginResponse>)> {
    let session = ctx
        .admin_manager
        .login(form.username.trim(), &form.password)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.id.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            username: session.username,
            expires_at: session.expires_at.timestamp(),
        }),
    ))
}

/// Clear the session cookie and drop the server-side session
async fn logout(
    State(ctx): State<AppContext>,
    jar: CookieJar,
) -> SeekerResult<(CookieJar, Json<serde_json::Value>)> {
    let mut jar = jar;
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let session_id = cookie.value().to_string();
        ctx.admin_manager.logout(&session_id).await?;
        jar = jar.remove(Cookie::from(SESSION_COOKIE));
    }

    Ok((jar, Json(serde_json::json!({ "success": true }))))
}

/// Search statistics and the most recent entries
async fn dashboard(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
) -> SeekerResult<Json<DashboardResponse>> {
    let summary = ctx.search_log.summary(DASHBOARD_RECENT_LIMIT).await?;

    Ok(Json(DashboardResponse {
        success: true,
        admin: auth.session.username,
        summary,
    }))
}
