//! Bounded group-chat broadcast server.
//!
//! A fixed number of WebSocket clients share one chat room. Every message is
//! stamped, given a server-assigned id, kept in a bounded history and
//! broadcast to every active connection. New connections receive the history
//! before any live message, and a heartbeat evicts unresponsive clients.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
