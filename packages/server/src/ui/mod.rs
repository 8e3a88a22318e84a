//! WebSocket chat server implementation.

mod handler;
mod outbound;
mod server;
pub mod session;
mod signal;
pub mod state;

pub use server::Server;
pub use session::{InboundEvent, Session, SessionHandler, SessionState};
