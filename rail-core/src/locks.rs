use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Per-train exclusive scopes.
///
/// Registration, booking and removal of the same train number run one at a
/// time; different trains never wait on each other. An entry lives only while
/// some caller holds or waits on it, so the map stays as small as the number
/// of trains currently in use.
#[derive(Default)]
pub struct TrainLocks {
    inner: Arc<LockMap>,
}

/// Exclusive access to one train. Dropping it releases the lock and prunes
/// the entry once nobody else is waiting.
pub struct TrainGuard {
    guard: Option<OwnedMutexGuard<()>>,
    train_no: String,
    map: Arc<LockMap>,
}

impl TrainLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `train_no`. Access ends when the guard drops.
    pub async fn acquire(&self, train_no: &str) -> TrainGuard {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(train_no.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        TrainGuard {
            guard: Some(lock.lock_owned().await),
            train_no: train_no.to_string(),
            map: self.inner.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for TrainGuard {
    fn drop(&mut self) {
        // Release first so the map's clone is the only one left when idle.
        drop(self.guard.take());

        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if map
            .get(&self.train_no)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.train_no);
        }
    }
}
