//! Session management core module.
//!
//! Tracks every connection the server has ever served (the registry is an
//! append-only history) and owns the per-connection command loop.

/// Submodule for the per-connection handler state machine.
pub mod handler;
/// Submodule for the shared session registry.
pub mod registry;
/// Submodule for the session record type.
pub mod session;

pub use handler::SessionHandler;
pub use registry::SessionRegistry;
pub use session::Session;
