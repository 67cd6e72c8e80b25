use std::time::Duration;

use anyhow::Context;
use redis::aio::ConnectionManager;

use crate::metrics::{record_cache_hit, record_cache_miss, track_cache_operation};
use crate::models::article::QuizGenerationResponse;

const KEY_PREFIX: &str = "wikiquiz:quiz:";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Optional Redis cache of generation responses keyed by article URL.
///
/// Every failure is logged and treated as a miss; the cache never fails a
/// request.
#[derive(Clone)]
pub struct QuizCache {
    conn: Option<ConnectionManager>,
    ttl_secs: u64,
}

impl QuizCache {
    pub fn disabled() -> Self {
        Self {
            conn: None,
            ttl_secs: 0,
        }
    }

    pub async fn connect(uri: Option<&str>, ttl_secs: u64) -> Self {
        let Some(uri) = uri else {
            tracing::info!("REDIS_URI not set, quiz cache disabled");
            return Self::disabled();
        };

        match Self::open(uri).await {
            Ok(conn) => {
                tracing::info!("Redis connection established, quiz cache enabled");
                Self {
                    conn: Some(conn),
                    ttl_secs,
                }
            }
            Err(e) => {
                tracing::warn!("Redis unavailable, quiz cache disabled: {:#}", e);
                Self::disabled()
            }
        }
    }

    async fn open(uri: &str) -> anyhow::Result<ConnectionManager> {
        let client = redis::Client::open(uri).context("Invalid REDIS_URI")?;

        let conn = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| anyhow::anyhow!("Redis connection timeout after 10s"))??;

        let mut ping_conn = conn.clone();
        tokio::time::timeout(
            PING_TIMEOUT,
            redis::cmd("PING").query_async::<String>(&mut ping_conn),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;

        Ok(conn)
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    fn key(url: &str) -> String {
        format!("{KEY_PREFIX}{url}")
    }

    pub async fn get(&self, url: &str) -> Option<QuizGenerationResponse> {
        let mut conn = self.conn.clone()?;
        let key = Self::key(url);

        let cached = track_cache_operation("get", async {
            redis::cmd("GET")
                .arg(&key)
                .query_async::<Option<String>>(&mut conn)
                .await
                .context("Failed to read quiz from Redis")
        })
        .await;

        let payload = match cached {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                record_cache_miss();
                return None;
            }
            Err(e) => {
                tracing::warn!("Quiz cache read failed for {}: {:#}", url, e);
                record_cache_miss();
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(response) => {
                record_cache_hit();
                Some(response)
            }
            Err(e) => {
                tracing::warn!("Discarding undecodable cached quiz for {}: {}", url, e);
                record_cache_miss();
                None
            }
        }
    }

    pub async fn put(&self, url: &str, response: &QuizGenerationResponse) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };

        let payload = match serde_json::to_string(response) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to encode quiz for cache: {}", e);
                return;
            }
        };

        let key = Self::key(url);
        let stored = track_cache_operation("setex", async {
            redis::cmd("SETEX")
                .arg(&key)
                .arg(self.ttl_secs)
                .arg(payload)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to save quiz to Redis")
        })
        .await;

        if let Err(e) = stored {
            tracing::warn!("Quiz cache write failed for {}: {:#}", url, e);
        }
    }

    pub async fn invalidate(&self, url: &str) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };

        let key = Self::key(url);
        let deleted = track_cache_operation("del", async {
            redis::cmd("DEL")
                .arg(&key)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to delete quiz from Redis")
        })
        .await;

        if let Err(e) = deleted {
            tracing::warn!("Quiz cache delete failed for {}: {:#}", url, e);
        }
    }

    /// `None` when the cache is disabled.
    pub async fn ping(&self) -> Option<Result<(), String>> {
        let mut conn = self.conn.clone()?;
        let result = tokio::time::timeout(
            Duration::from_millis(500),
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await;

        Some(match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(format!("Redis error: {}", e)),
            Err(_) => Err("Redis timeout after 500ms".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_uri_disables_cache() {
        let cache = QuizCache::connect(None, 60).await;
        assert!(!cache.is_enabled());
        assert!(cache.ping().await.is_none());
        assert!(cache.get("https://en.wikipedia.org/wiki/Paris").await.is_none());
    }

    #[tokio::test]
    async fn invalid_uri_disables_cache() {
        let cache = QuizCache::connect(Some("not-a-redis-uri"), 60).await;
        assert!(!cache.is_enabled());
    }

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(
            QuizCache::key("https://en.wikipedia.org/wiki/Paris"),
            "wikiquiz:quiz:https://en.wikipedia.org/wiki/Paris"
        );
    }
}
