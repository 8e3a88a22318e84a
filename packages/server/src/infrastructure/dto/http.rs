//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::ConnectionSummary;

/// Active connection as shown by the diagnostics endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub handle: String,
    pub name: String,
    pub alive: bool,
}

impl From<ConnectionSummary> for ConnectionDto {
    fn from(summary: ConnectionSummary) -> Self {
        Self {
            handle: summary.handle.to_string(),
            name: summary.name.as_str().to_string(),
            alive: summary.alive,
        }
    }
}

/// History statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDto {
    pub count: usize,
    pub capacity: usize,
    pub last_id: Option<u64>,
}

/// Response of `GET /debug/state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStateDto {
    pub capacity: usize,
    pub connections: Vec<ConnectionDto>,
    pub history: HistoryDto,
    /// Server time (RFC 3339, UTC)
    pub server_time: Option<String>,
}
