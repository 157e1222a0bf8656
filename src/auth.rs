/// Authentication extractors and utilities
use crate::{admin::AdminSession, context::AppContext, error::SeekerError};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

/// Name of the admin session cookie
pub const SESSION_COOKIE: &str = "seeker_admin_session";

/// Admin authentication context - requires a live session cookie
#[derive(Debug, Clone)]
pub struct AdminAuthContext {
    pub session: AdminSession,
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuthContext {
    type Rejection = SeekerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| SeekerError::Authentication("Admin login required".to_string()))?;

        let session = state.admin_manager.validate_session(&session_id).await?;
        tracing::debug!(username = %session.username, "admin session validated");

        Ok(AdminAuthContext { session })
    }
}
