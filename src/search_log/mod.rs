/// Search Log - append-only record of lookup requests
///
/// Every lookup that passes input validation is recorded before resolution
/// starts. The only mutation ever applied afterwards is raising the privacy
/// flag once the resolved profile turns out to be private.
use crate::error::{SeekerError, SeekerResult};
use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

/// Handle to a recorded entry, used for the later privacy upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryHandle(i64);

impl EntryHandle {
    pub fn id(self) -> i64 {
        self.0
    }
}

/// Persisted lookup request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchLogEntry {
    pub id: i64,
    #[serde(rename = "username")]
    pub handle: String,
    #[serde(rename = "ip_address")]
    pub origin_address: String,
    #[serde(rename = "user_agent")]
    pub client_signature: String,
    pub timestamp: DateTime<Utc>,
    pub is_private: bool,
}

/// Predicate for [`SearchLog::count_where`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Entries flagged private
    Private,
    /// Entries recorded at or after the instant
    Since(DateTime<Utc>),
    /// Entries for one handle
    Handle(String),
}

/// Summary statistics for the admin dashboard
#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub total_searches: i64,
    pub unique_ips: i64,
    pub today_searches: i64,
    pub private_searches: i64,
    pub searches: Vec<SearchLogEntry>,
}

/// Search log store
#[derive(Clone)]
pub struct SearchLog {
    db: SqlitePool,
}

impl SearchLog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append a lookup request
    ///
    /// The timestamp is taken inside the insert, under SQLite's write lock,
    /// and never falls below the newest stored one. Timestamp order thus
    /// follows id order even when lookups race for pool connections.
    pub async fn record(
        &self,
        handle: &str,
        origin_address: &str,
        client_signature: &str,
    ) -> SeekerResult<EntryHandle> {
        let result = sqlx::query(
            r#"
            INSERT INTO search_history (username, ip_address, user_agent, timestamp, is_private)
            SELECT ?1, ?2, ?3,
                   max(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                       coalesce((SELECT max(timestamp) FROM search_history), '')),
                   0
            "#,
        )
        .bind(handle)
        .bind(origin_address)
        .bind(client_signature)
        .execute(&self.db)
        .await?;

        Ok(EntryHandle(result.last_insert_rowid()))
    }

    /// Raise the privacy flag; repeated calls are no-ops
    pub async fn mark_private(&self, entry: EntryHandle) -> SeekerResult<()> {
        sqlx::query("UPDATE search_history SET is_private = 1 WHERE id = ?1 AND is_private = 0")
            .bind(entry.0)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get(&self, entry: EntryHandle) -> SeekerResult<Option<SearchLogEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, ip_address, user_agent, timestamp, is_private
            FROM search_history
            WHERE id = ?1
            "#,
        )
        .bind(entry.0)
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    /// Most recent entries first
    pub async fn list_recent(&self, limit: i64) -> SeekerResult<Vec<SearchLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, ip_address, user_agent, timestamp, is_private
            FROM search_history
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    pub async fn count_all(&self) -> SeekerResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM search_history")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn count_distinct_origins(&self) -> SeekerResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(DISTINCT ip_address) FROM search_history")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn count_where(&self, filter: &SearchFilter) -> SeekerResult<i64> {
        let count = match filter {
            SearchFilter::Private => {
                sqlx::query_scalar("SELECT COUNT(*) FROM search_history WHERE is_private = 1")
                    .fetch_one(&self.db)
                    .await?
            }
            SearchFilter::Since(instant) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM search_history WHERE timestamp >= ?1")
                    .bind(format_timestamp(*instant))
                    .fetch_one(&self.db)
                    .await?
            }
            SearchFilter::Handle(handle) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM search_history WHERE username = ?1")
                    .bind(handle)
                    .fetch_one(&self.db)
                    .await?
            }
        };
        Ok(count)
    }

    /// Entries recorded since midnight UTC
    pub async fn count_today(&self) -> SeekerResult<i64> {
        let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        self.count_where(&SearchFilter::Since(midnight)).await
    }

    /// Dashboard statistics plus the most recent entries
    pub async fn summary(&self, recent_limit: i64) -> SeekerResult<SearchSummary> {
        Ok(SearchSummary {
            total_searches: self.count_all().await?,
            unique_ips: self.count_distinct_origins().await?,
            today_searches: self.count_today().await?,
            private_searches: self.count_where(&SearchFilter::Private).await?,
            searches: self.list_recent(recent_limit).await?,
        })
    }
}

/// Fixed-width UTC timestamps so text comparison matches time order
///
/// Same shape as SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ')`.
fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> SeekerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SeekerError::Internal(format!("Invalid timestamp: {}", e)))
}

fn entry_from_row(row: &SqliteRow) -> SeekerResult<SearchLogEntry> {
    Ok(SearchLogEntry {
        id: row.try_get("id")?,
        handle: row.try_get("username")?,
        origin_address: row.try_get("ip_address")?,
        client_signature: row.try_get("user_agent")?,
        timestamp: parse_timestamp(&row.try_get::<String, _>("timestamp")?)?,
        is_private: row.try_get("is_private")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use chrono::Duration;

    async fn create_test_log() -> SearchLog {
        SearchLog::new(memory_pool().await)
    }

    #[tokio::test]
    async fn test_record_and_get() {
        let log = create_test_log().await;

        let entry = log.record("someuser", "10.0.0.1", "curl/8.0").await.unwrap();
        let stored = log.get(entry).await.unwrap().unwrap();

        assert_eq!(stored.id, entry.id());
        assert_eq!(stored.handle, "someuser");
        assert_eq!(stored.origin_address, "10.0.0.1");
        assert_eq!(stored.client_signature, "curl/8.0");
        assert!(!stored.is_private);
        assert!(Utc::now() - stored.timestamp < Duration::minutes(1));
    }

    #[tokio::test]
    async fn test_record_passes_handle_through() {
        let log = create_test_log().await;

        // No validation at this layer
        let entry = log.record("", "", "").await.unwrap();
        assert_eq!(log.get(entry).await.unwrap().unwrap().handle, "");
    }

    #[tokio::test]
    async fn test_mark_private_is_idempotent() {
        let log = create_test_log().await;
        let entry = log.record("hidden", "10.0.0.1", "ua").await.unwrap();

        log.mark_private(entry).await.unwrap();
        log.mark_private(entry).await.unwrap();

        assert!(log.get(entry).await.unwrap().unwrap().is_private);
        assert_eq!(log.count_where(&SearchFilter::Private).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_recent_most_recent_first() {
        let log = create_test_log().await;
        for handle in ["first", "second", "third"] {
            log.record(handle, "10.0.0.1", "ua").await.unwrap();
        }

        let recent = log.list_recent(2).await.unwrap();
        let handles: Vec<_> = recent.iter().map(|e| e.handle.as_str()).collect();
        assert_eq!(handles, vec!["third", "second"]);
        assert!(recent[0].timestamp >= recent[1].timestamp);
    }

    #[tokio::test]
    async fn test_counts() {
        let log = create_test_log().await;
        log.record("a", "10.0.0.1", "ua").await.unwrap();
        log.record("b", "10.0.0.1", "ua").await.unwrap();
        let private = log.record("a", "10.0.0.2", "ua").await.unwrap();
        log.mark_private(private).await.unwrap();

        assert_eq!(log.count_all().await.unwrap(), 3);
        assert_eq!(log.count_distinct_origins().await.unwrap(), 2);
        assert_eq!(log.count_today().await.unwrap(), 3);
        assert_eq!(log.count_where(&SearchFilter::Private).await.unwrap(), 1);
        assert_eq!(
            log.count_where(&SearchFilter::Handle("a".to_string())).await.unwrap(),
            2
        );
        assert_eq!(
            log.count_where(&SearchFilter::Since(Utc::now() + Duration::hours(1)))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_summary() {
        let log = create_test_log().await;
        for i in 0..60 {
            log.record(&format!("user{}", i), "10.0.0.1", "ua").await.unwrap();
        }

        let summary = log.summary(50).await.unwrap();
        assert_eq!(summary.total_searches, 60);
        assert_eq!(summary.unique_ips, 1);
        assert_eq!(summary.today_searches, 60);
        assert_eq!(summary.private_searches, 0);
        assert_eq!(summary.searches.len(), 50);
        assert_eq!(summary.searches[0].handle, "user59");
    }

    #[tokio::test]
    async fn test_concurrent_records_keep_timestamp_order() {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::create_pool(
            &dir.path().join("seeker.sqlite"),
            crate::db::DatabaseOptions::default(),
        )
        .await
        .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        let log = SearchLog::new(pool.clone());

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move {
                    log.record(&format!("user{}", i), "10.0.0.1", "ua").await.unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // Most recent first, so timestamps must never increase down the list
        let entries = log.list_recent(100).await.unwrap();
        assert_eq!(entries.len(), 32);
        for pair in entries.windows(2) {
            assert!(pair[0].id > pair[1].id);
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        pool.close().await;
    }

    #[tokio::test]
    async fn test_record_never_steps_back_in_time() {
        let log = create_test_log().await;
        let future = format_timestamp(Utc::now() + Duration::hours(1));
        sqlx::query(
            "INSERT INTO search_history (username, ip_address, user_agent, timestamp) VALUES ('early', '', '', ?1)",
        )
        .bind(&future)
        .execute(&log.db)
        .await
        .unwrap();

        let entry = log.record("later", "10.0.0.1", "ua").await.unwrap();
        let stored = log.get(entry).await.unwrap().unwrap();
        assert_eq!(format_timestamp(stored.timestamp), future);
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let a = format_timestamp(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let b = format_timestamp(DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap());
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_timestamp(&a).unwrap().timestamp(), 1_700_000_000);
    }
}
