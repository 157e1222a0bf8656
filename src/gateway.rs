/// Request Gateway - validates, records and resolves lookups
use crate::{
    error::{SeekerError, SeekerResult},
    metrics,
    profile::{normalize_handle, PostSummary, ProfileRecord, ProfileResolver},
    search_log::SearchLog,
};
use std::sync::Arc;

pub const EMPTY_HANDLE_MESSAGE: &str = "Please enter a username";

#[derive(Clone)]
pub struct RequestGateway {
    resolver: Arc<ProfileResolver>,
    search_log: Arc<SearchLog>,
}

impl RequestGateway {
    pub fn new(resolver: Arc<ProfileResolver>, search_log: Arc<SearchLog>) -> Self {
        Self {
            resolver,
            search_log,
        }
    }

    /// Look up a profile on behalf of a client
    ///
    /// Empty handles are rejected before anything is recorded. Every other
    /// attempt is logged up front, so failed resolutions still show up in
    /// the search history.
    pub async fn lookup(
        &self,
        handle: &str,
        origin_address: &str,
        client_signature: &str,
    ) -> SeekerResult<ProfileRecord> {
        let handle = normalize_handle(handle);
        if handle.is_empty() {
            metrics::record_lookup("invalid");
            return Err(SeekerError::Validation(EMPTY_HANDLE_MESSAGE.to_string()));
        }

        let entry = self
            .search_log
            .record(&handle, origin_address, client_signature)
            .await?;

        let profile = match self.resolver.resolve(&handle).await {
            Ok(profile) => profile,
            Err(e) => {
                metrics::record_lookup("unavailable");
                return Err(e.into());
            }
        };

        if profile.is_private {
            if let Err(e) = self.search_log.mark_private(entry).await {
                tracing::warn!(entry = entry.id(), error = %e, "failed to flag search as private");
            }
        }

        metrics::record_lookup("success");
        Ok(profile)
    }

    /// Resolve again and return only the posts; nothing is recorded
    pub async fn posts(&self, handle: &str) -> SeekerResult<Vec<PostSummary>> {
        let profile = self.resolver.resolve(handle).await?;
        Ok(profile.posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::profile::fixtures::{calls, private_user, sample_user, Script, ScriptedStrategy};
    use crate::profile::{ProfileStrategy, UNAVAILABLE_MESSAGE};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    async fn gateway_with(script: Script) -> (RequestGateway, Arc<SearchLog>, Arc<AtomicUsize>) {
        let strategy = ScriptedStrategy::new("api", script);
        let counter = strategy.counter();
        let strategies: Vec<Box<dyn ProfileStrategy>> = vec![Box::new(strategy)];
        let resolver = Arc::new(ProfileResolver::new(strategies, Duration::from_secs(1)));
        let search_log = Arc::new(SearchLog::new(memory_pool().await));
        (
            RequestGateway::new(resolver, Arc::clone(&search_log)),
            search_log,
            counter,
        )
    }

    #[tokio::test]
    async fn test_lookup_records_and_returns_profile() {
        let (gateway, log, _) = gateway_with(Script::User(sample_user(3))).await;

        let profile = gateway.lookup("  SomeUser ", "10.0.0.1", "ua").await.unwrap();
        assert_eq!(profile.handle, "someuser");

        let entries = log.list_recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].handle, "someuser");
        assert!(!entries[0].is_private);
    }

    #[tokio::test]
    async fn test_empty_handle_rejected_without_side_effects() {
        let (gateway, log, counter) = gateway_with(Script::User(sample_user(1))).await;

        for input in ["", "   ", "\t\n"] {
            let err = gateway.lookup(input, "10.0.0.1", "ua").await.unwrap_err();
            assert!(matches!(err, SeekerError::Validation(_)));
            assert_eq!(err.to_string(), EMPTY_HANDLE_MESSAGE);
        }

        assert_eq!(calls(&counter), 0);
        assert_eq!(log.count_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_resolution_is_still_logged() {
        let (gateway, log, _) = gateway_with(Script::Fail).await;

        let err = gateway.lookup("ghost", "10.0.0.1", "ua").await.unwrap_err();
        assert!(matches!(err, SeekerError::UpstreamUnavailable(_)));
        assert_eq!(err.to_string(), UNAVAILABLE_MESSAGE);
        assert_eq!(log.count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_private_profile_upgrades_entry() {
        let (gateway, log, _) = gateway_with(Script::User(private_user())).await;

        let profile = gateway.lookup("someuser", "10.0.0.1", "ua").await.unwrap();
        assert!(profile.is_private);

        let entries = log.list_recent(1).await.unwrap();
        assert!(entries[0].is_private);
    }

    #[tokio::test]
    async fn test_posts_does_not_log() {
        let (gateway, log, counter) = gateway_with(Script::User(sample_user(12))).await;

        let posts = gateway.posts("someuser").await.unwrap();
        assert_eq!(posts.len(), 9);
        assert_eq!(calls(&counter), 1);
        assert_eq!(log.count_all().await.unwrap(), 0);
    }
}
