//! Per-model-name mutex table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// Hands out one mutex per model name. Locks are not reentrant: a critical
/// section must not ask for the same model's lock again.
///
/// An entry lives only while some caller holds or waits on it, so the table
/// stays bounded by the number of concurrent callers.
#[derive(Debug, Default)]
pub(crate) struct ModelLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ModelLocks {
    pub(crate) fn run(&self, name: &str, critical: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let lock = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(name.to_string()).or_default())
        };
        let result = {
            let _guard = lock.lock();
            tracing::debug!(model = name, "model lock acquired");
            critical()
        };
        self.release(name, lock);
        result
    }

    /// Drop the table entry once the table's own handle is the last one left.
    fn release(&self, name: &str, lock: Arc<Mutex<()>>) {
        let mut table = self.table.lock();
        drop(lock);
        if table.get(name).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            table.remove(name);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().len()
    }
}
