use super::session::Session;
use chrono::Utc;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Mutex;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Thread-safe registry of every session the process has served.
///
/// One mutex guards both the name counter and the records, so no
/// interleaving can hand out a duplicate name or observe a half-written
/// entry. Critical sections are short and never span network I/O; `status`
/// replies are rendered from a snapshot taken under the lock.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    counter: u32,
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next session name and records the connection.
    ///
    /// Names are `Client<NN>` with a zero-padded monotonically increasing
    /// counter; they are unique for the lifetime of the process.
    pub fn allocate(&self, client_addr: SocketAddr) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.counter += 1;
        let name = format!("Client{:02}", inner.counter);
        inner.sessions.push(Session {
            name: name.clone(),
            client_addr,
            connected_at: Utc::now(),
            disconnected_at: None,
        });
        name
    }

    /// Records the disconnection time for a session.
    ///
    /// Unknown names are ignored, and an already-set disconnection time is
    /// never overwritten; after it is set the record is immutable.
    pub fn mark_disconnected(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(session) = inner.sessions.iter_mut().find(|s| s.name == name) {
            if session.disconnected_at.is_none() {
                session.disconnected_at = Some(Utc::now());
            }
        }
    }

    /// Point-in-time copy of all records, in insertion order.
    pub fn snapshot(&self) -> Vec<Session> {
        self.inner.lock().unwrap().sessions.clone()
    }

    /// Number of sessions ever created.
    pub fn total(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    /// Renders the registry for a `status` reply.
    pub fn render_status(&self) -> String {
        let sessions = self.snapshot();
        if sessions.is_empty() {
            return "No clients in cache at the moment".to_string();
        }

        let mut status = String::from("-----Client Connection Cache-----\n");
        for session in &sessions {
            let _ = write!(status, "\n{}:\n", session.name);
            let _ = write!(status, "  Address: {}\n", session.client_addr);
            let _ = write!(
                status,
                "  Connected: {}\n",
                session.connected_at.format(TIME_FORMAT)
            );
            let disconnected = match session.disconnected_at {
                Some(t) => t.format(TIME_FORMAT).to_string(),
                None => "Still connected".to_string(),
            };
            let _ = write!(status, "  Disconnected: {}\n", disconnected);
        }
        status
    }
}
