/// Configuration management for Profile Seeker
use crate::error::{SeekerError, SeekerResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Browser user agent presented to the upstream service
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Log filter used when neither `RUST_LOG` nor `SEEKER_LOG_LEVEL` is set
pub const DEFAULT_LOG_FILTER: &str = "profile_seeker=debug,tower_http=debug";

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub upstream: UpstreamConfig,
    pub admin: AdminConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database: PathBuf,
}

/// Upstream profile service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the machine-oriented API host
    pub api_base_url: String,
    /// Base URL of the human-facing web host
    pub web_base_url: String,
    /// Application id sent with structured API calls
    pub app_id: String,
    /// Fixed query identifier for the query endpoint
    pub query_hash: String,
    pub user_agent: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://i.instagram.com".to_string(),
            web_base_url: "https://www.instagram.com".to_string(),
            app_id: "936619743392459".to_string(),
            query_hash: "c9100bf9110dd6361671f113dd02e7d6".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Operator account and session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub session_ttl_secs: i64,
}

/// Inbound rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub lookups_per_minute: u32,
    pub admin_per_minute: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> SeekerResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("SEEKER_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env_or("SEEKER_PORT", 5000)?;

        let database = env::var("SEEKER_DATABASE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/seeker.sqlite"));

        let defaults = UpstreamConfig::default();
        let upstream = UpstreamConfig {
            api_base_url: env::var("SEEKER_UPSTREAM_API_URL").unwrap_or(defaults.api_base_url),
            web_base_url: env::var("SEEKER_UPSTREAM_WEB_URL").unwrap_or(defaults.web_base_url),
            app_id: env::var("SEEKER_UPSTREAM_APP_ID").unwrap_or(defaults.app_id),
            query_hash: env::var("SEEKER_UPSTREAM_QUERY_HASH").unwrap_or(defaults.query_hash),
            user_agent: env::var("SEEKER_UPSTREAM_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout_secs: env_or("SEEKER_UPSTREAM_TIMEOUT_SECS", defaults.timeout_secs)?,
        };

        let admin = AdminConfig {
            username: env::var("SEEKER_ADMIN_USERNAME").ok().filter(|s| !s.trim().is_empty()),
            password: env::var("SEEKER_ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
            session_ttl_secs: env_or("SEEKER_ADMIN_SESSION_TTL_SECS", 86400)?,
        };

        let rate_limit = RateLimitConfig {
            enabled: env_or("SEEKER_RATE_LIMITS_ENABLED", true)?,
            lookups_per_minute: env_or("SEEKER_RATE_LIMIT_LOOKUPS_PER_MINUTE", 30)?,
            admin_per_minute: env_or("SEEKER_RATE_LIMIT_ADMIN_PER_MINUTE", 120)?,
        };

        let logging = LoggingConfig {
            level: env::var("SEEKER_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
            json: env_or("SEEKER_LOG_JSON", false)?,
        };

        Ok(ServerConfig {
            service: ServiceConfig { hostname, port },
            storage: StorageConfig { database },
            upstream,
            admin,
            rate_limit,
            logging,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> SeekerResult<()> {
        if self.service.hostname.is_empty() {
            return Err(SeekerError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.upstream.api_base_url.is_empty() || self.upstream.web_base_url.is_empty() {
            return Err(SeekerError::Validation(
                "Upstream base URLs cannot be empty".to_string(),
            ));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(SeekerError::Validation(
                "Upstream timeout must be at least one second".to_string(),
            ));
        }

        if self.admin.session_ttl_secs <= 0 {
            return Err(SeekerError::Validation(
                "Admin session TTL must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Read an optional environment variable, falling back to `default` when unset
fn env_or<T: FromStr>(name: &str, default: T) -> SeekerResult<T> {
    parse_setting(name, env::var(name).ok(), default)
}

fn parse_setting<T: FromStr>(name: &str, raw: Option<String>, default: T) -> SeekerResult<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| SeekerError::Validation(format!("Invalid value for {}: {:?}", name, value))),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
        },
        storage: StorageConfig {
            database: PathBuf::from(":memory:"),
        },
        upstream: UpstreamConfig::default(),
        admin: AdminConfig {
            username: Some("operator".to_string()),
            password: Some("correct horse battery staple".to_string()),
            session_ttl_secs: 3600,
        },
        rate_limit: RateLimitConfig {
            enabled: false,
            lookups_per_minute: 30,
            admin_per_minute: 120,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            json: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_upstream_timeout() {
        let upstream = UpstreamConfig::default();
        assert_eq!(upstream.timeout(), Duration::from_secs(10));
        assert!(upstream.user_agent.contains("Chrome"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = test_config();
        assert!(config.validate().is_ok());

        config.upstream.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(SeekerError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_hostname() {
        let mut config = test_config();
        config.service.hostname.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_admin_password_not_serialized() {
        let config = test_config();
        let json = serde_json::to_string(&config.admin).unwrap();
        assert!(json.contains("operator"));
        assert!(!json.contains("battery"));
    }

    #[test]
    fn test_parse_setting_uses_default_when_unset() {
        assert_eq!(parse_setting("SEEKER_PORT", None, 5000u16).unwrap(), 5000);
        assert_eq!(parse_setting("SEEKER_PORT", Some(" 8080 ".to_string()), 5000u16).unwrap(), 8080);
    }

    #[test]
    fn test_parse_setting_rejects_invalid_values() {
        let err = parse_setting("SEEKER_ADMIN_SESSION_TTL_SECS", Some("forever".to_string()), 86400i64)
            .unwrap_err();
        assert!(matches!(err, SeekerError::Validation(_)));
        assert!(err.to_string().contains("SEEKER_ADMIN_SESSION_TTL_SECS"));

        assert!(parse_setting("SEEKER_RATE_LIMITS_ENABLED", Some("yes".to_string()), true).is_err());
        assert!(parse_setting("SEEKER_RATE_LIMIT_LOOKUPS_PER_MINUTE", Some("-3".to_string()), 30u32).is_err());
        assert!(parse_setting("SEEKER_LOG_JSON", Some("true".to_string()), false).unwrap());
    }
}
