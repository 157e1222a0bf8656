/// Admin account and session management
///
/// One operator account is seeded from configuration at startup. Logging in
/// creates a server-side session whose random id travels in a cookie.
use crate::{
    error::{SeekerError, SeekerResult},
    metrics,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Validated admin session
#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    #[serde(skip_serializing)]
    pub id: String,
    pub admin_id: i64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Admin manager
#[derive(Clone)]
pub struct AdminManager {
    db: SqlitePool,
    session_ttl: Duration,
}

impl AdminManager {
    pub fn new(db: SqlitePool, session_ttl: Duration) -> Self {
        Self { db, session_ttl }
    }

    /// Seed an operator account unless one with that username exists
    ///
    /// Returns true if an account was created.
    pub async fn bootstrap(&self, username: &str, password: &str) -> SeekerResult<bool> {
        if username.trim().is_empty() {
            return Err(SeekerError::Validation("Admin username is required".to_string()));
        }
        if password.is_empty() {
            return Err(SeekerError::Validation("Admin password is required".to_string()));
        }

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM admin_user WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.db)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let password_hash = hash_password(password)?;

        sqlx::query(
            "INSERT INTO admin_user (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(username)
        .bind(&password_hash)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.db)
        .await?;

        tracing::info!(username = %username, "admin account seeded");
        Ok(true)
    }

    /// Verify credentials and open a session
    pub async fn login(&self, username: &str, password: &str) -> SeekerResult<AdminSession> {
        let row = sqlx::query("SELECT id, password_hash FROM admin_user WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.db)
            .await?;

        let verified = match &row {
            Some(row) => verify_password(password, &row.try_get::<String, _>("password_hash")?)?,
            None => false,
        };

        metrics::record_admin_login(verified);

        let Some(row) = row.filter(|_| verified) else {
            tracing::warn!(username = %username, "admin login rejected");
            return Err(SeekerError::Authentication("Invalid credentials".to_string()));
        };

        let admin_id: i64 = row.try_get("id")?;
        let now = Utc::now();
        let session = AdminSession {
            id: Uuid::new_v4().to_string(),
            admin_id,
            username: username.to_string(),
            expires_at: now + self.session_ttl,
        };

        sqlx::query(
            "INSERT INTO admin_session (id, admin_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&session.id)
        .bind(admin_id)
        .bind(format_timestamp(now))
        .bind(format_timestamp(session.expires_at))
        .execute(&self.db)
        .await?;

        tracing::info!(username = %username, "admin logged in");
        Ok(session)
    }

    /// Look up a live session by id
    pub async fn validate_session(&self, session_id: &str) -> SeekerResult<AdminSession> {
        let row = sqlx::query(
            r#"
            SELECT s.id, s.admin_id, s.expires_at, u.username
            FROM admin_session s
            JOIN admin_user u ON u.id = s.admin_id
            WHERE s.id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| SeekerError::Authentication("Invalid session".to_string()))?;

        let expires_at = parse_timestamp(&row.try_get::<String, _>("expires_at")?)?;
        if expires_at <= Utc::now() {
            self.logout(session_id).await?;
            return Err(SeekerError::Authentication("Session expired".to_string()));
        }

        Ok(AdminSession {
            id: row.try_get("id")?,
            admin_id: row.try_get("admin_id")?,
            username: row.try_get("username")?,
            expires_at,
        })
    }

    /// End a session; unknown ids are ignored
    pub async fn logout(&self, session_id: &str) -> SeekerResult<()> {
        sqlx::query("DELETE FROM admin_session WHERE id = ?1")
            .bind(session_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Drop expired sessions, returning how many were removed
    pub async fn cleanup_expired(&self) -> SeekerResult<u64> {
        let result = sqlx::query("DELETE FROM admin_session WHERE expires_at <= ?1")
            .bind(format_timestamp(Utc::now()))
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

fn hash_password(password: &str) -> SeekerResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SeekerError::Internal(format!("argon2 hash failed: {}", e)))
}

fn verify_password(password: &str, password_hash: &str) -> SeekerResult<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| SeekerError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> SeekerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SeekerError::Internal(format!("Invalid timestamp: {}", e)))
}
