use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::security;

/// Meeting record stored in Redis. Immutable after creation; the store's
/// key TTL is the only expiry mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub meeting_id: String,
    pub password_hash: String,
    pub salt: String,
    pub admin_username: String,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    pub fn new(admin_username: String, password_hash: String, salt: String) -> Self {
        Self {
            meeting_id: security::generate_meeting_id(),
            password_hash,
            salt,
            admin_username,
            created_at: Utc::now(),
        }
    }
}

/// Request to create a meeting
#[derive(Debug, Deserialize)]
pub struct CreateMeetingRequest {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
}

/// Request to sign into an existing meeting
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Meeting")]
    pub meeting: String,
}

/// Response for both create-meeting and sign-in
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Meeting")]
    pub meeting: String,
    #[serde(rename = "Admin")]
    pub admin: bool,
    #[serde(rename = "JWT")]
    pub jwt: String,
}
