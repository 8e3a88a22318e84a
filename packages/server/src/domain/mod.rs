//! Domain layer: entities, value objects, and the interfaces the use cases depend on.

pub mod entity;
pub mod error;
pub mod pusher;
pub mod repository;
pub mod value_object;

pub use entity::{
    ChatMessage, Connection, ConnectionSummary, FIELD_ID, FIELD_NAME, FIELD_TIMESTAMP,
    FIELD_TYPE, StoredMessage, Visit,
};
pub use error::{HistoryError, RegistryError, TransportError};
pub use pusher::{BroadcastReport, MessagePusher, OutboundFrame, PusherChannel};
pub use repository::{ConnectionRegistry, MessageHistory};
pub use value_object::{
    ConnectionHandle, ConnectionHandleFactory, DisplayName, SequenceId, Timestamp,
};

#[cfg(test)]
pub use pusher::MockMessagePusher;
