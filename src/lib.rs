pub mod configuration;
pub mod error_handling;
pub mod network;
pub mod repository;
pub mod server;
pub mod session_management;
pub mod shutdown;
pub mod transfer;

pub use configuration::ServerConfig;
pub use repository::FileRepository;
pub use server::Server;
pub use session_management::{Session, SessionHandler, SessionRegistry};
pub use shutdown::Shutdown;
pub use transfer::{TransferEngine, TransferOutcome};
