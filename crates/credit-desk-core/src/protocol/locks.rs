use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::CompanyId;

type LockMap = DashMap<CompanyId, Arc<Mutex<()>>>;

/// One async mutex per company id. Entries live only while someone holds or
/// waits for them.
#[derive(Clone, Default)]
pub struct CompanyLocks {
    inner: Arc<LockMap>,
}

/// Exclusive access to one company. Dropping it releases the mutex and
/// evicts the entry when nobody is waiting.
pub struct CompanyGuard {
    company_id: CompanyId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl CompanyLocks {
    /// Wait for exclusive access to `company_id`.
    pub async fn acquire(&self, company_id: CompanyId) -> CompanyGuard {
        let lock = self.inner.entry(company_id).or_default().clone();
        let guard = lock.lock_owned().await;
        CompanyGuard {
            company_id,
            guard: Some(guard),
            locks: Arc::clone(&self.inner),
        }
    }

    pub fn tracked(&self) -> usize {
        self.inner.len()
    }
}

impl Drop for CompanyGuard {
    fn drop(&mut self) {
        // Release first so the map holds the last reference when idle.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.company_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
