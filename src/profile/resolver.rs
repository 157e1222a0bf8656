/// Profile Resolver - runs the strategy chain and normalizes the winner
use super::{
    normalize_handle, normalize_user,
    strategy::{default_strategies, ProfileStrategy},
    ProfileRecord, ResolutionError, StrategyError,
};
use crate::{config::UpstreamConfig, metrics};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Ordered strategy chain with a per-call timeout
pub struct ProfileResolver {
    strategies: Vec<Box<dyn ProfileStrategy>>,
    timeout: Duration,
}

impl ProfileResolver {
    pub fn new(strategies: Vec<Box<dyn ProfileStrategy>>, timeout: Duration) -> Self {
        Self {
            strategies,
            timeout,
        }
    }

    /// Resolver over the three upstream surfaces, sharing one HTTP client
    pub fn from_config(client: &reqwest::Client, config: &UpstreamConfig) -> Self {
        Self::new(default_strategies(client, config), config.timeout())
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve a handle to a complete profile record
    ///
    /// Strategies run strictly in order and the first one whose payload
    /// normalizes wins. Individual failures are logged and then dropped;
    /// callers only ever see [`ResolutionError::Unavailable`].
    pub async fn resolve(&self, handle: &str) -> Result<ProfileRecord, ResolutionError> {
        let handle = normalize_handle(handle);
        if handle.is_empty() {
            return Err(ResolutionError::Unavailable);
        }

        for strategy in &self.strategies {
            let started = Instant::now();
            let outcome = self.run(strategy.as_ref(), &handle).await;
            let elapsed = started.elapsed().as_secs_f64();

            match outcome {
                Ok(record) => {
                    metrics::record_strategy_attempt(strategy.name(), "success", elapsed);
                    info!(handle = %handle, strategy = strategy.name(), "profile resolved");
                    return Ok(record);
                }
                Err(e) => {
                    metrics::record_strategy_attempt(strategy.name(), e.kind(), elapsed);
                    debug!(handle = %handle, strategy = strategy.name(), error = %e, "strategy failed");
                }
            }
        }

        warn!(handle = %handle, "all profile strategies exhausted");
        Err(ResolutionError::Unavailable)
    }

    async fn run(
        &self,
        strategy: &dyn ProfileStrategy,
        handle: &str,
    ) -> Result<ProfileRecord, StrategyError> {
        let raw = tokio::time::timeout(self.timeout, strategy.attempt(handle))
            .await
            .map_err(|_| StrategyError::Timeout(self.timeout))??;

        Ok(normalize_user(&raw)?)
    }
}
