pub mod handler;
pub mod messages;
pub mod session;

pub use handler::ws_routes;
pub use messages::{
    error_text, msg_types, CallRequestPayload, ChannelMessage, EnterMeetingPayload,
    SentMessagePayload,
};
pub use session::{ClientHandle, ConnState, ConnectionsManager, RoomConnections};
