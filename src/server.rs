use crate::configuration::ServerConfig;
use crate::error_handling::types::{NetworkError, ServerError};
use crate::network::Listener;
use crate::repository::FileRepository;
use crate::session_management::SessionRegistry;
use crate::shutdown::Shutdown;
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Wires the configuration into the registry, repository and accept loop
/// and runs the whole thing to completion.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the listening endpoint and serves until the shutdown flag is
    /// raised. Failure to bind is the only fatal error; everything after
    /// that is absorbed per session.
    pub async fn run(&self, shutdown: Shutdown) -> Result<(), ServerError> {
        let addr = self.config.socket_addr()?;
        let socket = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::NetworkError(NetworkError::BindError(e)))?;

        let registry = Arc::new(SessionRegistry::new());
        let repository = Arc::new(FileRepository::new(self.config.file_repo.clone()));

        info!("[Server] Started on {}", addr);
        info!(
            "[Server] Maximum concurrent clients: {}",
            self.config.max_clients
        );
        info!("[Server] File repository: {}/", repository.root().display());

        let listener = Listener::new(self.config.clone(), registry, repository, shutdown);
        listener.run(socket).await;

        info!("[Server] Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_is_exposed_after_validation() {
        let config = ServerConfig {
            port: 9000,
            max_clients: 8,
            ..Default::default()
        };
        let server = Server::new(config).unwrap();
        assert_eq!(server.config().port, 9000);
        assert_eq!(server.config().max_clients, 8);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ServerConfig {
            max_clients: 0,
            ..Default::default()
        };
        assert!(matches!(
            Server::new(config),
            Err(ServerError::ConfigurationError(_))
        ));
    }

    #[tokio::test]
    #[serial]
    async fn test_bind_conflict_is_fatal() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let config = ServerConfig {
            port,
            ..Default::default()
        };
        let server = Server::new(config).unwrap();
        assert!(matches!(
            server.run(Shutdown::new()).await,
            Err(ServerError::NetworkError(NetworkError::BindError(_)))
        ));
    }
}
