use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{LoanFilter, LoanStore};
use crate::errors::{LoanError, Result};
use crate::record::{LoanRecord, StatusUpdate};
use crate::types::{LoanId, LoanStatus};

/// loan store keeping records in a map behind a mutex
///
/// listing is ordered by id and compare-and-swap is atomic. latency and
/// outages can be injected to exercise timeout handling.
pub struct InMemoryLoanStore {
    records: Mutex<BTreeMap<LoanId, LoanRecord>>,
    latency_micros: AtomicU64,
    available: AtomicBool,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            latency_micros: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// simulated round-trip time charged to every call
    pub fn set_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_micros.store(micros, Ordering::SeqCst);
    }

    pub fn latency(&self) -> Duration {
        Duration::from_micros(self.latency_micros.load(Ordering::SeqCst))
    }

    /// take the store offline or bring it back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// fail before touching any record when the call cannot complete in time
    fn reach(&self, timeout: Duration) -> Result<()> {
        if !self.available.load(Ordering::SeqCst) {
            log::warn!("loan store is offline");
            return Err(LoanError::Unavailable {
                message: "loan store is offline".to_string(),
            });
        }

        let latency = self.latency();
        if latency > timeout {
            log::warn!("loan store call timed out: latency {:?} exceeds {:?}", latency, timeout);
            return Err(LoanError::Unavailable {
                message: format!("request timed out after {:?}", timeout),
            });
        }

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<LoanId, LoanRecord>>> {
        self.records.lock().map_err(|_| LoanError::Internal {
            message: "loan store lock poisoned".to_string(),
        })
    }
}

impl Default for InMemoryLoanStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LoanStore for InMemoryLoanStore {
    fn insert(&self, record: LoanRecord, timeout: Duration) -> Result<LoanRecord> {
        self.reach(timeout)?;
        let mut records = self.lock()?;
        if records.contains_key(&record.id) {
            return Err(LoanError::Internal {
                message: format!("duplicate loan id {}", record.id),
            });
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    fn get(&self, id: &LoanId, timeout: Duration) -> Result<LoanRecord> {
        self.reach(timeout)?;
        let records = self.lock()?;
        records
            .get(id)
            .cloned()
            .ok_or(LoanError::LoanNotFound { id: *id })
    }

    fn compare_and_swap(
        &self,
        id: &LoanId,
        expected: LoanStatus,
        update: StatusUpdate,
        timeout: Duration,
    ) -> Result<LoanRecord> {
        self.reach(timeout)?;
        let mut records = self.lock()?;
        let record = records
            .get_mut(id)
            .ok_or(LoanError::LoanNotFound { id: *id })?;

        if record.status != expected {
            log::debug!(
                "stale transition on loan {}: expected {}, found {}",
                id,
                expected,
                record.status
            );
            return Err(LoanError::InvalidTransition {
                current: record.status,
                action: update.action,
            });
        }

        update.apply(record);
        Ok(record.clone())
    }

    fn list(&self, filter: &LoanFilter, timeout: Duration) -> Result<Vec<LoanRecord>> {
        self.reach(timeout)?;
        let records = self.lock()?;
        Ok(records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}
