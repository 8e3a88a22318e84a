//! Data Transfer Objects (DTOs) for the chat server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket wire schema (control messages and inbound classification)
//! - `http`: HTTP API response DTOs

pub mod http;
pub mod websocket;
