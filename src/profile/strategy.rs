/// Retrieval strategies, one per upstream access surface
use super::{embedded, StrategyError};
use crate::{
    config::UpstreamConfig,
    error::{SeekerError, SeekerResult},
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use serde_json::{json, Value};

/// One independent way of fetching the raw upstream user object
#[async_trait]
pub trait ProfileStrategy: Send + Sync {
    /// Stable name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Fetch the nested user object for `handle`
    async fn attempt(&self, handle: &str) -> Result<Value, StrategyError>;
}

/// Build the shared upstream HTTP client with the browser header set
pub fn build_http_client(config: &UpstreamConfig) -> SeekerResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .gzip(true)
        .timeout(config.timeout())
        .build()
        .map_err(|e| SeekerError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Default strategy order: structured API, rendered page, query endpoint
pub fn default_strategies(
    client: &reqwest::Client,
    config: &UpstreamConfig,
) -> Vec<Box<dyn ProfileStrategy>> {
    vec![
        Box::new(ApiStrategy::new(client.clone(), config)),
        Box::new(PageStrategy::new(client.clone(), config)),
        Box::new(QueryStrategy::new(client.clone(), config)),
    ]
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StrategyError> {
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(StrategyError::Status(status));
    }
    Ok(response)
}

/// Pull `data.user` out of a JSON envelope
pub fn user_from_envelope(mut body: Value) -> Result<Value, StrategyError> {
    match body.pointer_mut("/data/user").map(Value::take) {
        Some(user) if user.is_object() => Ok(user),
        Some(_) => Err(StrategyError::Shape("data.user is not an object".to_string())),
        None => Err(StrategyError::Shape("missing data.user".to_string())),
    }
}

/// Machine-oriented profile endpoint on the API host
pub struct ApiStrategy {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
}

impl ApiStrategy {
    pub fn new(client: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
        }
    }
}

#[async_trait]
impl ProfileStrategy for ApiStrategy {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn attempt(&self, handle: &str) -> Result<Value, StrategyError> {
        let url = format!("{}/api/v1/users/web_profile_info/", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("username", handle)])
            .header("X-IG-App-ID", &self.app_id)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        let body: Value = ensure_success(response)?.json().await?;
        user_from_envelope(body)
    }
}

/// Human-facing profile page with embedded bootstrap JSON
pub struct PageStrategy {
    client: reqwest::Client,
    base_url: String,
}

impl PageStrategy {
    pub fn new(client: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            base_url: config.web_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProfileStrategy for PageStrategy {
    fn name(&self) -> &'static str {
        "page"
    }

    async fn attempt(&self, handle: &str) -> Result<Value, StrategyError> {
        let url = format!("{}/{}/", self.base_url, urlencoding::encode(handle));

        let response = self.client.get(&url).send().await?;
        let html = ensure_success(response)?.text().await?;

        embedded::extract_user(&html)
    }
}

/// Generic query endpoint with a fixed query identifier
pub struct QueryStrategy {
    client: reqwest::Client,
    base_url: String,
    query_hash: String,
}

impl QueryStrategy {
    pub fn new(client: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            base_url: config.web_base_url.trim_end_matches('/').to_string(),
            query_hash: config.query_hash.clone(),
        }
    }

    /// Variables payload selecting the profile facets to include
    pub fn variables(handle: &str) -> String {
        json!({
            "username": handle,
            "fetch_mutual": false,
            "include_chaining": false,
            "include_reel": true,
            "include_suggested_users": false,
            "include_logged_out_extras": false,
            "include_highlight_reels": true,
        })
        .to_string()
    }
}

#[async_trait]
impl ProfileStrategy for QueryStrategy {
    fn name(&self) -> &'static str {
        "query"
    }

    async fn attempt(&self, handle: &str) -> Result<Value, StrategyError> {
        let url = format!("{}/graphql/query/", self.base_url);
        let variables = Self::variables(handle);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query_hash", self.query_hash.as_str()),
                ("variables", variables.as_str()),
            ])
            .send()
            .await?;

        let body: Value = ensure_success(response)?.json().await?;
        user_from_envelope(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{embedded::extract_user, fixtures::sample_user, normalize_user};

    #[test]
    fn test_user_from_envelope() {
        let body = json!({ "data": { "user": sample_user(1) }, "status": "ok" });
        assert_eq!(user_from_envelope(body).unwrap(), sample_user(1));
    }

    #[test]
    fn test_envelope_without_user() {
        assert!(matches!(
            user_from_envelope(json!({ "data": {} })),
            Err(StrategyError::Shape(_))
        ));
        assert!(matches!(
            user_from_envelope(json!({ "data": { "user": null } })),
            Err(StrategyError::Shape(_))
        ));
        assert!(user_from_envelope(json!("oops")).is_err());
    }

    #[test]
    fn test_all_surfaces_normalize_identically() {
        let user = sample_user(4);

        let api_body = json!({ "data": { "user": user.clone() }, "status": "ok" });
        let page_html = format!(
            "<script>window._sharedData = {};</script>",
            json!({ "entry_data": { "ProfilePage": [ { "graphql": { "user": user.clone() } } ] } })
        );
        let query_body = json!({ "data": { "user": user.clone() }, "extensions": {} });

        let from_api = normalize_user(&user_from_envelope(api_body).unwrap()).unwrap();
        let from_page = normalize_user(&extract_user(&page_html).unwrap()).unwrap();
        let from_query = normalize_user(&user_from_envelope(query_body).unwrap()).unwrap();

        assert_eq!(from_api, from_page);
        assert_eq!(from_page, from_query);
    }

    #[test]
    fn test_query_variables() {
        let vars: Value = serde_json::from_str(&QueryStrategy::variables("someuser")).unwrap();
        assert_eq!(vars["username"], "someuser");
        assert_eq!(vars["include_reel"], true);
        assert_eq!(vars["fetch_mutual"], false);
    }

    #[test]
    fn test_default_strategy_order() {
        let config = UpstreamConfig::default();
        let client = build_http_client(&config).unwrap();
        let names: Vec<_> = default_strategies(&client, &config)
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, vec!["api", "page", "query"]);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let config = UpstreamConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            web_base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..UpstreamConfig::default()
        };
        let client = build_http_client(&config).unwrap();

        for strategy in default_strategies(&client, &config) {
            let result = strategy.attempt("someuser").await;
            assert!(matches!(result, Err(StrategyError::Transport(_))), "{}", strategy.name());
        }
    }
}
