use chrono::{DateTime, Utc};
use std::net::SocketAddr;

/// One entry in the connection history.
///
/// `name` is assigned exactly once and never reused within a process run.
/// `disconnected_at` is `None` while the connection is live and set exactly
/// once by the handler's cleanup path, after which the record never changes.
#[derive(Debug, Clone)]
pub struct Session {
    pub name: String,
    pub client_addr: SocketAddr,
    pub connected_at: DateTime<Utc>,
    pub disconnected_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.disconnected_at.is_none()
    }
}
