use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admission ceiling for concurrent sessions.
///
/// Each admitted connection holds an [`AdmissionSlot`]; the slot is the
/// concurrency ticket and releasing it is tied to the slot's drop, so a
/// handler terminating on any path (exit, peer close, error, shutdown)
/// frees exactly one slot, exactly once. The active count can never exceed
/// the ceiling and never goes negative.
pub struct AdmissionControl {
    permits: Arc<Semaphore>,
    max_clients: usize,
}

/// The ticket held by one admitted session for its whole lifetime.
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionControl {
    pub fn new(max_clients: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_clients)),
            max_clients,
        }
    }

    /// Non-blocking admission test: a slot if the ceiling allows, `None`
    /// if the server is full.
    pub fn try_admit(&self) -> Option<AdmissionSlot> {
        Arc::clone(&self.permits)
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionSlot { _permit: permit })
    }

    /// Number of currently admitted sessions.
    pub fn active(&self) -> usize {
        self.max_clients - self.permits.available_permits()
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_is_enforced() {
        let admission = AdmissionControl::new(2);
        let first = admission.try_admit().unwrap();
        let _second = admission.try_admit().unwrap();
        assert_eq!(admission.active(), 2);

        assert!(admission.try_admit().is_none());

        // Releasing one slot admits exactly one more
        drop(first);
        assert_eq!(admission.active(), 1);
        let _third = admission.try_admit().unwrap();
        assert!(admission.try_admit().is_none());
    }

    #[test]
    fn test_slot_release_is_tied_to_drop() {
        let admission = AdmissionControl::new(1);
        {
            let _slot = admission.try_admit().unwrap();
            assert_eq!(admission.active(), 1);
        }
        assert_eq!(admission.active(), 0);
    }
}
