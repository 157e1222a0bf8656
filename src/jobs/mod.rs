use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::expired_session_cleanup_job(Arc::clone(&self)));
    }

    /// Cleanup expired admin sessions (runs every hour)
    async fn expired_session_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(3600));

        loop {
            interval.tick().await;

            match scheduler.context.admin_manager.cleanup_expired().await {
                Ok(0) => debug!("Session cleanup: no expired admin sessions"),
                Ok(count) => info!("Cleaned up {} expired admin sessions", count),
                Err(e) => error!("Failed to cleanup expired admin sessions: {}", e),
            }

            if scheduler.context.db.is_closed() {
                break;
            }
        }
    }
}
