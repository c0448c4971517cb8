//! Per-key lock registry with a fixed global acquisition order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use siteledger_core::{MaterialId, StockError, StockResult, WarehouseId};

/// Key of one materialized stock row.
///
/// `Ord` on the (material, warehouse) tuple is the global lock-acquisition
/// order: every multi-key operation sorts its key set before locking, so two
/// writers touching overlapping pairs in opposite directions cannot deadlock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub material_id: MaterialId,
    pub warehouse_id: WarehouseId,
}

impl StockKey {
    pub fn new(material_id: MaterialId, warehouse_id: WarehouseId) -> Self {
        Self {
            material_id,
            warehouse_id,
        }
    }
}

/// Registry of per-(material, warehouse) mutexes.
///
/// Handles are created lazily and never removed: a key that has seen activity
/// keeps its mutex for the life of the registry, mirroring the stock rows
/// themselves.
#[derive(Debug)]
pub struct LockRegistry {
    locks: RwLock<HashMap<StockKey, Arc<Mutex<()>>>>,
    max_wait: Duration,
}

impl LockRegistry {
    pub fn new(max_wait: Duration) -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
            max_wait,
        }
    }

    /// Run `f` while holding every key's mutex.
    ///
    /// Keys are deduplicated and locked in ascending [`StockKey`] order.
    /// Exceeding the registry's wait bound on any key returns
    /// [`StockError::Busy`] with nothing applied. Locks are released in
    /// reverse acquisition order.
    pub fn with_keys<T>(
        &self,
        keys: &[StockKey],
        f: impl FnOnce() -> StockResult<T>,
    ) -> StockResult<T> {
        let mut sorted = keys.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut handles = Vec::with_capacity(sorted.len());
        for key in &sorted {
            handles.push(self.handle(*key)?);
        }

        let deadline = Instant::now() + self.max_wait;
        let mut guards: Vec<MutexGuard<'_, ()>> = Vec::with_capacity(handles.len());
        for handle in &handles {
            guards.push(Self::lock_until(handle, deadline)?);
        }

        let out = f();

        while let Some(guard) = guards.pop() {
            drop(guard);
        }

        out
    }

    fn handle(&self, key: StockKey) -> StockResult<Arc<Mutex<()>>> {
        if let Ok(map) = self.locks.read() {
            if let Some(handle) = map.get(&key) {
                return Ok(handle.clone());
            }
        }

        let mut map = self
            .locks
            .write()
            .map_err(|_| StockError::storage("lock registry poisoned"))?;
        Ok(map
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    fn lock_until<'a>(
        mutex: &'a Mutex<()>,
        deadline: Instant,
    ) -> StockResult<MutexGuard<'a, ()>> {
        loop {
            match mutex.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(StockError::Busy);
                    }
                    std::thread::sleep(Duration::from_micros(100));
                }
                Err(TryLockError::Poisoned(_)) => {
                    return Err(StockError::storage("stock key lock poisoned"));
                }
            }
        }
    }
}
