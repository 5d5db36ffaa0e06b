//! File transfer sub-protocol.
//!
//! Sending one file is a three-phase exchange on the already-established
//! connection:
//!
//! 1. header `FILE_START|<name>|<size>` as a single send
//! 2. wait for the peer's `READY` acknowledgment
//! 3. stream the file bytes in fixed-size chunks until the declared size
//!    has been sent
//!
//! A missing file short-circuits with an `ERROR:` payload in place of the
//! header. A wrong acknowledgment abandons the transfer without sending any
//! file bytes. Shutdown raised mid-stream truncates the stream; the peer
//! must treat a short transfer as a failure.

use crate::error_handling::types::{RepositoryError, TransferError};
use crate::repository::FileRepository;
use crate::shutdown::Shutdown;
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

pub const READY_ACK: &[u8] = b"READY";
pub const ERR_NOT_AVAILABLE: &str = "ERROR: File not available.";
pub const ERR_TRANSFER_FAILED: &str = "ERROR: File transfer failed.";

/// How a single transfer attempt ended. Only `Interrupted` requires the
/// caller to tear the connection down; every other outcome leaves the
/// session usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed { bytes_sent: u64 },
    /// File absent or name rejected; the peer got an `ERROR:` payload.
    NotFound,
    /// Acknowledgment was not `READY`; abandoned silently, no bytes sent.
    Refused,
    /// Shutdown fired before or during streaming; stream truncated.
    Interrupted { bytes_sent: u64 },
    /// Read or send failure mid-stream; an `ERROR:` payload was attempted.
    Failed { bytes_sent: u64 },
}

enum AckStatus {
    Ready,
    Refused,
    ShutdownRaised,
}

pub struct TransferEngine {
    buffer_size: usize,
    poll_interval: Duration,
    shutdown: Shutdown,
}

impl TransferEngine {
    pub fn new(buffer_size: usize, poll_interval: Duration, shutdown: Shutdown) -> Self {
        Self {
            buffer_size,
            poll_interval,
            shutdown,
        }
    }

    /// Sends one file over `stream`.
    ///
    /// `Err` is returned only when the connection itself is unusable
    /// (peer gone during the handshake); the handler reacts by closing the
    /// session. All protocol-level failures are reported as outcomes.
    pub async fn send_file<S>(
        &self,
        stream: &mut S,
        repository: &FileRepository,
        name: &str,
    ) -> Result<TransferOutcome, TransferError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut file, size) = match repository.open(name).await {
            Ok(opened) => opened,
            Err(e) => {
                match e {
                    RepositoryError::PathTraversal(_) => {
                        warn!("Rejected download name {:?}: {}", name, e)
                    }
                    _ => debug!("Download of {:?} refused: {}", name, e),
                }
                stream.write_all(ERR_NOT_AVAILABLE.as_bytes()).await?;
                return Ok(TransferOutcome::NotFound);
            }
        };

        let header = format!("FILE_START|{}|{}", name, size);
        stream.write_all(header.as_bytes()).await?;

        match self.await_ack(stream).await? {
            AckStatus::Ready => {}
            AckStatus::Refused => {
                debug!("Transfer of {} abandoned: bad acknowledgment", name);
                return Ok(TransferOutcome::Refused);
            }
            AckStatus::ShutdownRaised => {
                return Ok(TransferOutcome::Interrupted { bytes_sent: 0 })
            }
        }

        let mut buf = vec![0u8; self.buffer_size];
        let mut bytes_sent: u64 = 0;
        while bytes_sent < size {
            if self.shutdown.is_raised() {
                warn!(
                    "Shutdown raised mid-transfer of {} after {} byte(s)",
                    name, bytes_sent
                );
                return Ok(TransferOutcome::Interrupted { bytes_sent });
            }

            // Never read past the size the header declared; the file may
            // have grown since it was opened and the peer frames the stream
            // by that size
            let want = ((size - bytes_sent).min(buf.len() as u64)) as usize;
            let n = match file.read(&mut buf[..want]).await {
                // File shrank under us; stop rather than block forever
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    error!("Read failure while sending {}: {}", name, e);
                    let _ = stream.write_all(ERR_TRANSFER_FAILED.as_bytes()).await;
                    return Ok(TransferOutcome::Failed { bytes_sent });
                }
            };
            if let Err(e) = stream.write_all(&buf[..n]).await {
                error!("Send failure while sending {}: {}", name, e);
                let _ = stream.write_all(ERR_TRANSFER_FAILED.as_bytes()).await;
                return Ok(TransferOutcome::Failed { bytes_sent });
            }
            bytes_sent += n as u64;
        }

        info!("Finished sending file: {} ({} bytes)", name, bytes_sent);
        Ok(TransferOutcome::Completed { bytes_sent })
    }

    /// Blocks for the acknowledgment, polling the shutdown flag each time
    /// the read times out. The acknowledgment must be exactly `READY`.
    async fn await_ack<S>(&self, stream: &mut S) -> Result<AckStatus, TransferError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut ack = vec![0u8; self.buffer_size];
        loop {
            if self.shutdown.is_raised() {
                return Ok(AckStatus::ShutdownRaised);
            }
            match timeout(self.poll_interval, stream.read(&mut ack)).await {
                // Poll tick, not an error
                Err(_) => continue,
                Ok(Ok(0)) => return Err(TransferError::PeerClosed),
                Ok(Ok(n)) if &ack[..n] == READY_ACK => return Ok(AckStatus::Ready),
                Ok(Ok(_)) => return Ok(AckStatus::Refused),
                Ok(Err(e)) => return Err(TransferError::IoError(e)),
            }
        }
    }
}
