/// Application context and dependency injection
use crate::{
    admin::AdminManager,
    config::ServerConfig,
    db,
    error::SeekerResult,
    gateway::RequestGateway,
    profile::{strategy::build_http_client, ProfileResolver},
    rate_limit::RateLimiter,
    search_log::SearchLog,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub search_log: Arc<SearchLog>,
    pub gateway: Arc<RequestGateway>,
    pub admin_manager: Arc<AdminManager>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> SeekerResult<Self> {
        // Validate configuration
        config.validate()?;

        // Initialize database
        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        // One upstream client for the whole process; connections are pooled
        let http_client = build_http_client(&config.upstream)?;
        let resolver = ProfileResolver::from_config(&http_client, &config.upstream);
        tracing::info!(strategies = ?resolver.strategy_names(), "profile resolver ready");

        let ctx = Self::from_parts(config, db, resolver);
        ctx.bootstrap_admin().await?;

        Ok(ctx)
    }

    /// Assemble the context around an existing pool and resolver
    pub fn from_parts(config: ServerConfig, db: SqlitePool, resolver: ProfileResolver) -> Self {
        let search_log = Arc::new(SearchLog::new(db.clone()));
        let gateway = Arc::new(RequestGateway::new(
            Arc::new(resolver),
            Arc::clone(&search_log),
        ));
        let admin_manager = Arc::new(AdminManager::new(
            db.clone(),
            chrono::Duration::seconds(config.admin.session_ttl_secs),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Self {
            config: Arc::new(config),
            db,
            search_log,
            gateway,
            admin_manager,
            rate_limiter,
        }
    }

    /// Seed the operator account from configured credentials
    async fn bootstrap_admin(&self) -> SeekerResult<()> {
        match (&self.config.admin.username, &self.config.admin.password) {
            (Some(username), Some(password)) => {
                self.admin_manager.bootstrap(username, password).await?;
            }
            _ => {
                tracing::warn!(
                    "SEEKER_ADMIN_USERNAME / SEEKER_ADMIN_PASSWORD not set; admin dashboard unavailable"
                );
            }
        }
        Ok(())
    }

    /// Release shared resources at shutdown
    pub async fn close(&self) {
        self.db.close().await;
        tracing::info!("database pool closed");
    }

    /// Get service address
    pub fn bind_address(&self) -> String {
        format!(
            "{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}

/// In-memory context around a scripted resolver, with the test operator seeded
#[cfg(test)]
pub(crate) async fn test_context(resolver: ProfileResolver) -> AppContext {
    let ctx = AppContext::from_parts(crate::config::test_config(), db::memory_pool().await, resolver);
    ctx.bootstrap_admin().await.unwrap();
    ctx
}
