/// Rate Limiting System
use crate::config::RateLimitConfig;
use crate::error::{SeekerError, SeekerResult};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

type DirectLimiter = GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Which quota a request draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitClass {
    Lookup,
    Admin,
    Unlimited,
}

impl LimitClass {
    pub fn for_path(path: &str) -> Self {
        if path == "/search" || path.starts_with("/get_posts/") {
            LimitClass::Lookup
        } else if path.starts_with("/admin") {
            LimitClass::Admin
        } else {
            LimitClass::Unlimited
        }
    }
}

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    lookups: Arc<DirectLimiter>,
    admin: Arc<DirectLimiter>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let lookup_quota = Quota::per_minute(
            NonZeroU32::new(config.lookups_per_minute).unwrap_or(NonZeroU32::MIN),
        );
        let admin_quota = Quota::per_minute(
            NonZeroU32::new(config.admin_per_minute).unwrap_or(NonZeroU32::MIN),
        );

        Self {
            enabled: config.enabled,
            lookups: Arc::new(GovernorLimiter::direct(lookup_quota)),
            admin: Arc::new(GovernorLimiter::direct(admin_quota)),
        }
    }

    /// Check the quota for a class of request
    pub fn check(&self, class: LimitClass) -> SeekerResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let limiter = match class {
            LimitClass::Lookup => &self.lookups,
            LimitClass::Admin => &self.admin,
            LimitClass::Unlimited => return Ok(()),
        };

        limiter.check().map_err(|_| SeekerError::RateLimitExceeded {
            retry_after: Duration::from_secs(1),
        })
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, SeekerError> {
    let class = LimitClass::for_path(request.uri().path());

    if let Err(e) = ctx.rate_limiter.check(class) {
        tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
        return Err(e);
    }

    Ok(next.run(request).await)
}
