use crate::network::admission::AdmissionSlot;
use crate::repository::FileRepository;
use crate::session_management::registry::SessionRegistry;
use crate::shutdown::Shutdown;
use crate::transfer::{TransferEngine, TransferOutcome};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

pub const FAREWELL: &str = "BYE BYE! ACK";
pub const LIST_HEADER: &str = "Available files:";
pub const NO_FILES: &str = "No files available in repository";

/// What the command loop should do after a dispatch.
enum Flow {
    Continue,
    Close,
}

/// Owns one accepted connection end to end.
///
/// Lifecycle: allocate an identity and send it as the first message
/// (ASSIGNING), then loop reading commands with a poll timeout (ACTIVE),
/// and finally record the disconnection and release the admission slot
/// (CLOSING). Errors never escape `run`; every failure path resolves into
/// the closing sequence so one broken session cannot affect the rest of
/// the server.
pub struct SessionHandler {
    registry: Arc<SessionRegistry>,
    repository: Arc<FileRepository>,
    shutdown: Shutdown,
    buffer_size: usize,
    poll_interval: Duration,
}

impl SessionHandler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        repository: Arc<FileRepository>,
        shutdown: Shutdown,
        buffer_size: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            registry,
            repository,
            shutdown,
            buffer_size,
            poll_interval,
        }
    }

    /// Serves the connection until the peer leaves, asks to exit, or
    /// shutdown is raised. The admission slot is released when this
    /// returns, on every path.
    pub async fn run<S>(&self, stream: &mut S, client_addr: SocketAddr, slot: AdmissionSlot)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let name = self.registry.allocate(client_addr);
        info!("[Connected] {} from {}", name, client_addr);

        if let Err(e) = stream.write_all(name.as_bytes()).await {
            error!("[{}] Failed to send assigned name: {}", name, e);
            return self.close(&name, slot);
        }
        debug!("[{}] Session active", name);

        let engine = TransferEngine::new(
            self.buffer_size,
            self.poll_interval,
            self.shutdown.clone(),
        );
        let mut buf = vec![0u8; self.buffer_size];

        while !self.shutdown.is_raised() {
            let n = match timeout(self.poll_interval, stream.read(&mut buf)).await {
                // Poll tick: re-check the shutdown flag and keep waiting
                Err(_) => continue,
                Ok(Ok(0)) => {
                    debug!("[{}] Peer closed the connection", name);
                    break;
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    warn!("[{}] Read error: {}", name, e);
                    break;
                }
            };

            let message = String::from_utf8_lossy(&buf[..n]).trim().to_string();
            if message.is_empty() {
                break;
            }
            debug!("[{}] Received: {}", name, message);

            match self.dispatch(stream, &name, &engine, &message).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Close) => break,
                Err(e) => {
                    warn!("[{}] Send error: {}", name, e);
                    break;
                }
            }
        }

        self.close(&name, slot)
    }

    async fn dispatch<S>(
        &self,
        stream: &mut S,
        name: &str,
        engine: &TransferEngine,
        message: &str,
    ) -> std::io::Result<Flow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let lower = message.to_lowercase();
        match lower.as_str() {
            "exit" => {
                stream.write_all(FAREWELL.as_bytes()).await?;
                info!("[Disconnect] {} requested exit", name);
                Ok(Flow::Close)
            }
            "status" => {
                stream.write_all(self.registry.render_status().as_bytes()).await?;
                info!("[Status] Sent cache status to {}", name);
                Ok(Flow::Continue)
            }
            "list" => {
                let files = self.repository.list();
                let reply = if files.is_empty() {
                    NO_FILES.to_string()
                } else {
                    let mut reply = LIST_HEADER.to_string();
                    for file in &files {
                        reply.push_str("\n  - ");
                        reply.push_str(file);
                    }
                    reply
                };
                stream.write_all(reply.as_bytes()).await?;
                info!("[List] Sent file list to {}", name);
                Ok(Flow::Continue)
            }
            _ if lower.starts_with("download:") => {
                // Filename keeps its original case; only the command word is
                // case-insensitive
                let filename = message
                    .split_once(':')
                    .map(|(_, rest)| rest.trim())
                    .unwrap_or("");
                info!("[Download] {} requested: {}", name, filename);

                match engine.send_file(stream, &self.repository, filename).await {
                    Ok(TransferOutcome::Interrupted { .. }) => Ok(Flow::Close),
                    Ok(outcome) => {
                        debug!("[{}] Transfer outcome: {:?}", name, outcome);
                        Ok(Flow::Continue)
                    }
                    Err(e) => {
                        warn!("[{}] Transfer error: {}", name, e);
                        Ok(Flow::Close)
                    }
                }
            }
            _ => {
                let reply = format!("{} ACK", message);
                stream.write_all(reply.as_bytes()).await?;
                Ok(Flow::Continue)
            }
        }
    }

    fn close(&self, name: &str, slot: AdmissionSlot) {
        debug!("[{}] Closing session", name);
        self.registry.mark_disconnected(name);
        drop(slot);
        info!("[Closed] {} connection closed", name);
    }
}
