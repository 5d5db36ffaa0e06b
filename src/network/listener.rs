//! Admission-controlled accept loop.
//!
//! Owns the listening socket. Each inbound connection is tested against the
//! admission ceiling: at capacity the peer gets a fixed rejection message
//! and an immediate close (no session name, no registry entry); otherwise a
//! session handler task is spawned with the admission slot. The accept call
//! is bounded by the poll interval so the loop stays responsive to the
//! shutdown flag, and shutdown joins outstanding handlers with a bounded
//! per-handler grace window.

use crate::configuration::ServerConfig;
use crate::network::admission::AdmissionControl;
use crate::repository::FileRepository;
use crate::session_management::{SessionHandler, SessionRegistry};
use crate::shutdown::Shutdown;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::time::timeout;

pub const REJECTION: &str = "Maximum clients reached. Server is full. Please try again later.";

pub struct Listener {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    repository: Arc<FileRepository>,
    admission: AdmissionControl,
    shutdown: Shutdown,
}

impl Listener {
    pub fn new(
        config: ServerConfig,
        registry: Arc<SessionRegistry>,
        repository: Arc<FileRepository>,
        shutdown: Shutdown,
    ) -> Self {
        let admission = AdmissionControl::new(config.max_clients);
        Self {
            config,
            registry,
            repository,
            admission,
            shutdown,
        }
    }

    /// Drives the accept loop until shutdown, then joins the outstanding
    /// handlers. The socket is bound by the caller; binding is the only
    /// fatal failure in the server and is handled there.
    pub async fn run(&self, listener: TcpListener) {
        let poll = self.config.poll_interval();
        let mut handlers: JoinSet<()> = JoinSet::new();

        info!("[Server] Waiting for connections...");
        loop {
            if self.shutdown.is_raised() {
                info!("[Server] Shutdown raised, no longer accepting");
                break;
            }

            // Reap handlers that finished since the last pass
            while handlers.try_join_next().is_some() {}

            let (mut stream, client_addr) = match timeout(poll, listener.accept()).await {
                // Poll tick: re-check the shutdown flag
                Err(_) => continue,
                Ok(Ok(accepted)) => accepted,
                Ok(Err(e)) => {
                    error!("[Server] Accept error: {}", e);
                    continue;
                }
            };

            let slot = match self.admission.try_admit() {
                Some(slot) => slot,
                None => {
                    warn!(
                        "[Rejected] Connection from {} - server at capacity",
                        client_addr
                    );
                    let _ = stream.write_all(REJECTION.as_bytes()).await;
                    continue;
                }
            };
            info!(
                "[Info] Active clients: {}/{}",
                self.admission.active(),
                self.admission.max_clients()
            );

            let handler = SessionHandler::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.repository),
                self.shutdown.clone(),
                self.config.buffer_size,
                poll,
            );
            handlers.spawn(async move {
                handler.run(&mut stream, client_addr, slot).await;
            });
        }

        self.drain(handlers).await;
    }

    /// Waits a bounded time per handler, then proceeds regardless.
    async fn drain(&self, mut handlers: JoinSet<()>) {
        let grace = self.config.shutdown_grace();
        while !handlers.is_empty() {
            match timeout(grace, handlers.join_next()).await {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "[Server] Shutdown grace expired with {} handler(s) outstanding",
                        handlers.len()
                    );
                    handlers.abort_all();
                    break;
                }
            }
        }
        info!("[Server] All sessions closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_management::handler::FAREWELL;
    use serial_test::serial;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    struct Fixture {
        addr: SocketAddr,
        registry: Arc<SessionRegistry>,
        shutdown: Shutdown,
        _repo_dir: TempDir,
        task: JoinHandle<()>,
    }

    async fn start_listener(max_clients: usize) -> Fixture {
        let config = ServerConfig {
            max_clients,
            poll_interval_ms: 20,
            shutdown_grace_secs: 1,
            ..Default::default()
        };
        let registry = Arc::new(SessionRegistry::new());
        let repo_dir = TempDir::new().unwrap();
        let repository = Arc::new(FileRepository::new(repo_dir.path()));
        let shutdown = Shutdown::new();

        let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        let listener = Listener::new(
            config,
            Arc::clone(&registry),
            repository,
            shutdown.clone(),
        );
        let task = tokio::spawn(async move {
            listener.run(socket).await;
        });

        Fixture {
            addr,
            registry,
            shutdown,
            _repo_dir: repo_dir,
            task,
        }
    }

    async fn read_text(stream: &mut TcpStream) -> String {
        let mut buf = vec![0u8; 4096];
        let n = stream.read(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).to_string()
    }

    #[tokio::test]
    #[serial]
    async fn test_ceiling_rejection_and_slot_reuse() {
        let fx = start_listener(2).await;

        let mut first = TcpStream::connect(fx.addr).await.unwrap();
        assert_eq!(read_text(&mut first).await, "Client01");
        let mut second = TcpStream::connect(fx.addr).await.unwrap();
        assert_eq!(read_text(&mut second).await, "Client02");

        // Third concurrent attempt is rejected before any session state
        let mut third = TcpStream::connect(fx.addr).await.unwrap();
        assert_eq!(read_text(&mut third).await, REJECTION);
        let mut buf = [0u8; 16];
        assert_eq!(third.read(&mut buf).await.unwrap(), 0);
        assert_eq!(fx.registry.total(), 2);

        // Releasing one admitted session frees exactly one slot
        first.write_all(b"exit").await.unwrap();
        assert_eq!(read_text(&mut first).await, FAREWELL);

        let mut admitted = None;
        for _ in 0..50 {
            let mut candidate = TcpStream::connect(fx.addr).await.unwrap();
            let reply = read_text(&mut candidate).await;
            if reply != REJECTION {
                admitted = Some(reply);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(admitted.as_deref(), Some("Client03"));

        fx.shutdown.raise();
        tokio_test::assert_ok!(
            timeout(Duration::from_secs(5), fx.task).await,
            "listener did not stop within the grace window"
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_shutdown_closes_active_sessions() {
        let fx = start_listener(2).await;

        let mut client = TcpStream::connect(fx.addr).await.unwrap();
        assert_eq!(read_text(&mut client).await, "Client01");

        fx.shutdown.raise();
        tokio_test::assert_ok!(
            timeout(Duration::from_secs(5), fx.task).await,
            "listener did not stop within the grace window"
        );

        let snapshot = fx.registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot[0].is_connected());
    }
}
