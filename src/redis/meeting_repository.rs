use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::error::{AppError, Result};
use crate::models::{Meeting, UserRegistration};

/// Repository for meeting and registration records.
///
/// Records expire through key TTLs; "not found" is the sole expiry signal,
/// so callers must re-query rather than cache existence.
#[derive(Clone)]
pub struct MeetingRepository {
    pool: Pool,
    ttl_seconds: u64,
}

impl MeetingRepository {
    pub fn new(pool: Pool, ttl_seconds: u64) -> Self {
        Self { pool, ttl_seconds }
    }

    // ==================== Meeting Operations ====================

    /// Create a new meeting with TTL
    pub async fn create_meeting(&self, meeting: &Meeting) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let key = format!("meeting:{}", meeting.meeting_id);
        let json = serde_json::to_string(meeting)?;

        redis::cmd("SETEX")
            .arg(&key)
            .arg(self.ttl_seconds as i64)
            .arg(&json)
            .query_async::<()>(&mut *conn)
            .await?;

        tracing::info!(meeting_id = %meeting.meeting_id, "Meeting created");
        Ok(())
    }

    /// Get meeting by ID. `None` means never created or already expired.
    pub async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>> {
        let mut conn = self.pool.get().await?;
        let key = format!("meeting:{}", meeting_id);

        let json: Option<String> = conn.get(&key).await?;

        match json {
            Some(data) => {
                let meeting: Meeting = serde_json::from_str(&data)?;
                Ok(Some(meeting))
            }
            None => Ok(None),
        }
    }

    // ==================== Registration Operations ====================

    /// Register a username for a meeting
    pub async fn register_user(&self, registration: &UserRegistration) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let key = format!("meeting:{}:users", registration.meeting_id);
        let json = serde_json::to_string(registration)?;

        conn.hset::<_, _, _, ()>(&key, &registration.username, &json)
            .await?;

        // Keep the registration set alive exactly as long as the meeting record.
        let remaining: i64 = conn
            .ttl(format!("meeting:{}", registration.meeting_id))
            .await?;
        if remaining > 0 {
            conn.expire::<_, ()>(&key, remaining).await?;
        }

        tracing::debug!(
            meeting_id = %registration.meeting_id,
            username = %registration.username,
            "User registered"
        );
        Ok(())
    }

    /// Check whether a username is already registered to a meeting
    pub async fn user_exists(&self, meeting_id: &str, username: &str) -> Result<bool> {
        let mut conn = self.pool.get().await?;
        let key = format!("meeting:{}:users", meeting_id);

        let exists: bool = conn.hexists(&key, username).await?;
        Ok(exists)
    }

    // ==================== Health Check ====================

    /// Check Redis connection health
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.pool.get().await?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;

        Ok(pong == "PONG")
    }
}
