use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::udf::ScalarFunc;

/// Tracks which descriptor instances are currently bound to the engine.
///
/// An instance is claimed when its native function is built and released
/// by the function's delete callback, so a claim lives exactly as long as
/// the engine holds the registration.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    claimed: Mutex<HashSet<usize>>,
}

impl HandleRegistry {
    pub fn new() -> HandleRegistry {
        HandleRegistry::default()
    }

    /// Claims `key`, false if it is already claimed.
    pub fn acquire(&self, key: usize) -> bool {
        self.lock().insert(key)
    }

    pub fn release(&self, key: usize) {
        self.lock().remove(&key);
    }

    pub fn is_bound(&self, key: usize) -> bool {
        self.lock().contains(&key)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<usize>> {
        // The set stays consistent even if a holder panicked.
        self.claimed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Identity of a descriptor instance: the address of its shared allocation.
pub fn handle_key(udf: &Arc<dyn ScalarFunc>) -> usize {
    Arc::as_ptr(udf) as *const () as usize
}
