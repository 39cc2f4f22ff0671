use serde::{Deserialize, Serialize};
use serde_json::json;

/// Wrapper for all WebSocket events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    // Defaults to Null so a payload-less frame still dispatches and fails
    // inside the matching handler.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ChannelMessage {
    pub fn new(msg_type: &str, payload: serde_json::Value) -> Self {
        Self {
            msg_type: msg_type.to_string(),
            payload,
        }
    }

    pub fn enter_success() -> Self {
        Self::new(msg_types::ENTER_SUCCESS, json!({}))
    }

    pub fn received_message(data: &str, username: &str) -> Self {
        Self::new(
            msg_types::RECEIVED_MESSAGE,
            json!({ "Data": data, "Username": username }),
        )
    }

    pub fn call_request(peer_id: &str) -> Self {
        Self::new(msg_types::CALL_REQUEST, json!({ "peerId": peer_id }))
    }

    pub fn peer_disconnected(peer_id: &str) -> Self {
        Self::new(msg_types::PEER_DISCONNECTED, json!({ "PeerID": peer_id }))
    }

    pub fn error(message: &str) -> Self {
        Self::new(msg_types::ERROR, json!({ "Error": message }))
    }
}

// ==================== Client -> Server Payloads ====================

/// ENTER-MEETING payload. Both fields are required; absence is an
/// authentication failure rather than a deserialization error.
#[derive(Debug, Clone, Deserialize)]
pub struct EnterMeetingPayload {
    #[serde(rename = "JWT")]
    pub jwt: Option<String>,
    #[serde(rename = "PeerID")]
    pub peer_id: Option<String>,
}

/// SENT-MESSAGE payload
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessagePayload {
    #[serde(default)]
    pub message: Option<String>,
}

/// CALL-REQUEST payload
#[derive(Debug, Clone, Deserialize)]
pub struct CallRequestPayload {
    #[serde(rename = "peerId")]
    pub peer_id: String,
}

/// Event names on the wire
pub mod msg_types {
    // Client -> Server
    pub const ENTER_MEETING: &str = "ENTER-MEETING";
    pub const SENT_MESSAGE: &str = "SENT-MESSAGE";
    // CALL-REQUEST travels in both directions.
    pub const CALL_REQUEST: &str = "CALL-REQUEST";

    // Server -> Client
    pub const ENTER_SUCCESS: &str = "ENTER-SUCCESS";
    pub const RECEIVED_MESSAGE: &str = "RECEIVED-MESSAGE";
    pub const PEER_DISCONNECTED: &str = "PEER-DISCONNECTED";
    pub const ERROR: &str = "ERROR";
}

/// Error texts emitted over the channel
pub mod error_text {
    pub const AUTH_FAILED: &str = "Failed to authenticate. Please try again.";
    pub const MEETING_FULL: &str = "Meeting full.";
    pub const MEETING_EXPIRED: &str = "Meeting expired.";
    pub const STORAGE: &str = "Database internal error.";
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn envelope_round_trips() {
        let msg = ChannelMessage::new(msg_types::SENT_MESSAGE, json!({ "message": "hi" }));
        let wire = serde_json::to_string(&msg).expect("serialize");
        let parsed: ChannelMessage = serde_json::from_str(&wire).expect("deserialize");

        assert_eq!(parsed.msg_type, "SENT-MESSAGE");
        assert_eq!(parsed.payload["message"], "hi");
    }

    #[test]
    fn envelope_uses_type_key_on_the_wire() {
        let wire = serde_json::to_value(ChannelMessage::enter_success()).expect("serialize");
        assert_eq!(wire["type"], "ENTER-SUCCESS");
        assert!(wire.get("msg_type").is_none());
    }

    #[test]
    fn outbound_payloads_keep_wire_casing() {
        let msg = ChannelMessage::received_message("hello", "alice");
        assert_eq!(msg.payload["Data"], "hello");
        assert_eq!(msg.payload["Username"], "alice");

        let msg = ChannelMessage::peer_disconnected("peer-1");
        assert_eq!(msg.payload["PeerID"], "peer-1");

        let msg = ChannelMessage::call_request("peer-1");
        assert_eq!(msg.payload["peerId"], "peer-1");

        let msg = ChannelMessage::error(error_text::MEETING_FULL);
        assert_eq!(msg.msg_type, "ERROR");
        assert_eq!(msg.payload["Error"], "Meeting full.");
    }

    #[test]
    fn enter_payload_fields_are_optional_at_parse_time() {
        let payload: EnterMeetingPayload =
            serde_json::from_value(json!({ "PeerID": "peer-1" })).expect("deserialize");
        assert!(payload.jwt.is_none());
        assert_eq!(payload.peer_id.as_deref(), Some("peer-1"));
    }

    #[test]
    fn sent_message_tolerates_missing_text() {
        let payload: SentMessagePayload = serde_json::from_value(json!({})).expect("deserialize");
        assert!(payload.message.is_none());
    }
}
