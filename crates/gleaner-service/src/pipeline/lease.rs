use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Record ids currently being processed in this process.
#[derive(Clone, Default)]
pub struct LeaseSet {
    held: Arc<Mutex<HashSet<i32>>>,
}

/// Released when dropped, including when the processing future is cancelled.
pub struct Lease {
    set: LeaseSet,
    id: i32,
}

impl LeaseSet {
    /// `None` when another task already holds `id`.
    pub fn acquire(&self, id: i32) -> Option<Lease> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        held.insert(id).then(|| Lease {
            set: self.clone(),
            id,
        })
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.set
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
