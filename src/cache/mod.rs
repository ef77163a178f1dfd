//! Expiring key/value storage for phone verification codes

use crate::config::RedisConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key prefixes
mod keys {
    pub const VERIFY_CODE: &str = "hotelhub:verify_code";
}

/// A code issued to a phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Storage for issued verification codes, keyed by phone number.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    async fn put(&self, phone: &str, code: &VerificationCode, ttl: Duration) -> Result<()>;
    /// Expired entries are never returned.
    async fn get(&self, phone: &str) -> Result<Option<VerificationCode>>;
    async fn remove(&self, phone: &str) -> Result<()>;
    async fn ping(&self) -> Result<()>;
}

/// Cache manager for Redis operations
#[derive(Clone)]
pub struct CacheManager {
    conn: ConnectionManager,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e))
        })?;

        Ok(Self { conn })
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(v) => {
                let parsed = serde_json::from_str(&v).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Cache deserialize error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(value).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Cache serialize error: {}", e))
        })?;

        let _: () = conn.set_ex(key, serialized, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

fn code_key(phone: &str) -> String {
    format!("{}:{}", keys::VERIFY_CODE, phone)
}

#[async_trait]
impl VerificationCodeStore for CacheManager {
    async fn put(&self, phone: &str, code: &VerificationCode, ttl: Duration) -> Result<()> {
        self.set_json(&code_key(phone), code, ttl).await
    }

    async fn get(&self, phone: &str) -> Result<Option<VerificationCode>> {
        let entry: Option<VerificationCode> = self.get_json(&code_key(phone)).await?;
        Ok(entry.filter(|c| !c.is_expired(Utc::now())))
    }

    async fn remove(&self, phone: &str) -> Result<()> {
        self.delete(&code_key(phone)).await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Process-local store used when Redis is disabled and in tests.
#[derive(Default)]
pub struct InMemoryCodeStore {
    entries: RwLock<HashMap<String, VerificationCode>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationCodeStore for InMemoryCodeStore {
    async fn put(&self, phone: &str, code: &VerificationCode, _ttl: Duration) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(phone.to_string(), code.clone());
        Ok(())
    }

    async fn get(&self, phone: &str) -> Result<Option<VerificationCode>> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        match entries.get(phone) {
            Some(code) if code.is_expired(now) => {
                entries.remove(phone);
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    async fn remove(&self, phone: &str) -> Result<()> {
        self.entries.write().await.remove(phone);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
