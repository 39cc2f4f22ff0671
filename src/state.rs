use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Config;
use crate::redis::MeetingRepository;
use crate::registry::RoomRegistry;
use crate::ws::ConnectionsManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub meeting_repo: Arc<MeetingRepository>,
    pub registry: Arc<RoomRegistry>,
    pub connections: Arc<ConnectionsManager>,
}

impl AppState {
    pub fn new(config: Config, auth: AuthService, meeting_repo: MeetingRepository) -> Self {
        let registry = RoomRegistry::new(config.room_capacity);
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            meeting_repo: Arc::new(meeting_repo),
            registry: Arc::new(registry),
            connections: Arc::new(ConnectionsManager::new()),
        }
    }
}
