use crossbeam_skiplist::SkipMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per document name, so a read-modify-write on a document
/// never interleaves with another one on the same document. An entry lives
/// only while someone holds or waits for it.
pub struct PathLocks {
    lookup: SkipMap<String, Arc<Mutex<()>>>,
}

/// Held for the duration of a mutation. Dropping the last one removes the
/// entry from the table.
pub struct PathGuard<'a> {
    locks: &'a PathLocks,
    key: String,
    guard: OwnedMutexGuard<()>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self {
            lookup: SkipMap::new(),
        }
    }

    pub async fn lock(&self, name: &str) -> PathGuard<'_> {
        loop {
            let lock = {
                let entry = self
                    .lookup
                    .get_or_insert(name.to_string(), Arc::new(Mutex::new(())));
                Arc::clone(entry.value())
            };
            let guard = lock.lock_owned().await;

            // The previous holder may have dropped the entry while we waited;
            // only the mutex still in the table counts.
            let current = self.lookup.get(name).map_or(false, |entry| {
                Arc::ptr_eq(entry.value(), OwnedMutexGuard::mutex(&guard))
            });
            if current {
                return PathGuard {
                    locks: self,
                    key: name.to_string(),
                    guard,
                };
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

impl Default for PathLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        // the table's copy plus ours: nobody else is waiting
        if Arc::strong_count(OwnedMutexGuard::mutex(&self.guard)) == 2 {
            self.locks.lookup.remove(&self.key);
        }
    }
}
