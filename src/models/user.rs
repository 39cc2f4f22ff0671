use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A username registered to a meeting. Unique per (meeting_id, username);
/// expires together with the meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegistration {
    pub meeting_id: String,
    pub username: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRegistration {
    pub fn new(meeting_id: String, username: String, admin: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            meeting_id,
            username,
            admin,
            created_at,
        }
    }
}
