/// API routes and handlers
pub mod admin;
pub mod extract;
pub mod health;
pub mod search;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(search::routes())
        .merge(admin::routes())
        .merge(health::routes())
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{body::Body, http::Response};
    use serde_json::Value;

    pub async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
