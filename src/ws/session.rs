use std::sync::Arc;
use tokio::sync::mpsc;

use crate::ws::ChannelMessage;

/// Per-connection protocol state.
///
/// Events are dispatched according to the current state: before entry only
/// ENTER-MEETING is honored, and room events are dropped. This replaces the
/// pattern of attaching room handlers only after a successful entry.
#[derive(Debug)]
pub enum ConnState {
    Connected,
    InRoom {
        meeting_id: String,
        username: String,
        peer_id: String,
    },
    Disconnected,
}

/// Client connection handle for sending events
#[derive(Clone)]
pub struct ClientHandle {
    pub conn_id: String,
    pub sender: mpsc::UnboundedSender<ChannelMessage>,
}

impl ClientHandle {
    pub fn new(conn_id: String, sender: mpsc::UnboundedSender<ChannelMessage>) -> Self {
        Self { conn_id, sender }
    }

    pub fn send(
        &self,
        msg: ChannelMessage,
    ) -> Result<(), mpsc::error::SendError<ChannelMessage>> {
        self.sender.send(msg)
    }
}

/// Tracks all subscribed connections in one meeting room
pub struct RoomConnections {
    clients: dashmap::DashMap<String, ClientHandle>, // conn_id -> ClientHandle
}

impl RoomConnections {
    pub fn new() -> Self {
        Self {
            clients: dashmap::DashMap::new(),
        }
    }

    pub fn add_client(&self, handle: ClientHandle) {
        self.clients.insert(handle.conn_id.clone(), handle);
    }

    pub fn remove_client(&self, conn_id: &str) -> Option<ClientHandle> {
        self.clients.remove(conn_id).map(|(_, v)| v)
    }

    /// Best-effort delivery to every subscriber except `exclude_conn_id`.
    pub fn broadcast(&self, msg: ChannelMessage, exclude_conn_id: Option<&str>) {
        for client in self.clients.iter() {
            if let Some(exclude) = exclude_conn_id {
                if client.conn_id == exclude {
                    continue;
                }
            }
            let _ = client.send(msg.clone());
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for RoomConnections {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks every active room, keyed by meeting id
pub struct ConnectionsManager {
    rooms: dashmap::DashMap<String, Arc<RoomConnections>>,
}

impl ConnectionsManager {
    pub fn new() -> Self {
        Self {
            rooms: dashmap::DashMap::new(),
        }
    }

    pub fn get_or_create_room(&self, meeting_id: &str) -> Arc<RoomConnections> {
        self.rooms
            .entry(meeting_id.to_string())
            .or_insert_with(|| Arc::new(RoomConnections::new()))
            .clone()
    }

    pub fn get_room(&self, meeting_id: &str) -> Option<Arc<RoomConnections>> {
        self.rooms.get(meeting_id).map(|r| r.clone())
    }

    pub fn remove_client_from_room(&self, meeting_id: &str, conn_id: &str) -> Option<ClientHandle> {
        if let Some(room) = self.rooms.get(meeting_id) {
            let handle = room.remove_client(conn_id);

            // Clean up empty rooms
            if room.is_empty() {
                self.rooms.remove(meeting_id);
            }

            handle
        } else {
            None
        }
    }

    pub fn broadcast_to_room(
        &self,
        meeting_id: &str,
        msg: ChannelMessage,
        exclude_conn_id: Option<&str>,
    ) {
        if let Some(room) = self.rooms.get(meeting_id) {
            room.broadcast(msg, exclude_conn_id);
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for ConnectionsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn client(conn_id: &str) -> (ClientHandle, mpsc::UnboundedReceiver<ChannelMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientHandle::new(conn_id.to_string(), tx), rx)
    }

    #[test]
    fn broadcast_excludes_the_sender() {
        let room = RoomConnections::new();
        let (alice, mut alice_rx) = client("conn-a");
        let (bob, mut bob_rx) = client("conn-b");
        room.add_client(alice);
        room.add_client(bob);

        room.broadcast(ChannelMessage::received_message("hi", "alice"), Some("conn-a"));

        assert!(alice_rx.try_recv().is_err());
        let delivered = bob_rx.try_recv().expect("bob receives");
        assert_eq!(delivered.payload["Data"], "hi");
    }

    #[test]
    fn empty_rooms_are_removed() {
        let manager = ConnectionsManager::new();
        let (alice, _alice_rx) = client("conn-a");

        manager.get_or_create_room("a1b2c3d4").add_client(alice);
        assert_eq!(manager.room_count(), 1);

        manager.remove_client_from_room("a1b2c3d4", "conn-a");
        assert_eq!(manager.room_count(), 0);
        assert!(manager.get_room("a1b2c3d4").is_none());
    }

    #[test]
    fn broadcast_to_unknown_room_is_a_no_op() {
        let manager = ConnectionsManager::new();
        manager.broadcast_to_room("zzzzzzzz", ChannelMessage::enter_success(), None);
    }
}
