//! UseCase layer: the operations a session performs against the shared state.

mod connect_session;
mod disconnect_session;
mod error;
mod get_server_state;
mod heartbeat;
mod send_message;

pub use connect_session::{ConnectSessionUseCase, ConnectedSession};
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{ConnectError, SendMessageError};
pub use get_server_state::{GetServerStateUseCase, ServerState};
pub use heartbeat::{HeartbeatReport, HeartbeatUseCase};
pub use send_message::{SendMessageUseCase, SentMessage};
