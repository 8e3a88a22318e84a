//! Repository 実装
//!
//! - `inmemory`: 容量固定のインメモリ実装（再起動をまたいだ永続化はしない）

pub mod inmemory;

pub use inmemory::{InMemoryConnectionRegistry, InMemoryMessageHistory};
