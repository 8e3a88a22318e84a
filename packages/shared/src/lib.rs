//! Utilities shared by the hiroba crates.

pub mod logger;
pub mod time;
