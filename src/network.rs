//! Listening endpoint and admission control.

pub mod admission;
pub mod listener;

pub use admission::{AdmissionControl, AdmissionSlot};
pub use listener::Listener;
