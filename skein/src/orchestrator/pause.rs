//! Pause flag shared between the orchestrator's public API and whatever task
//! is polling it mid-step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cheaply clonable paused/running flag for one task.
#[derive(Clone)]
pub struct PauseMode(Arc<AtomicBool>);

impl PauseMode {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, paused: bool) {
        self.0.store(paused, Ordering::SeqCst);
    }
}

impl Default for PauseMode {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PauseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PauseMode")
            .field("paused", &self.is_paused())
            .finish()
    }
}
