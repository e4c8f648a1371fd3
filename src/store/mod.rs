mod memory;

pub use memory::InMemoryLoanStore;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::record::{LoanRecord, StatusUpdate};
use crate::types::{AccountId, LoanId, LoanStatus};

/// optional criteria for listing loans
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanFilter {
    pub account_id: Option<AccountId>,
    pub status: Option<LoanStatus>,
}

impl LoanFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn account(account_id: impl Into<AccountId>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            status: None,
        }
    }

    pub fn status(mut self, status: LoanStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, record: &LoanRecord) -> bool {
        self.account_id.as_ref().map_or(true, |a| *a == record.account_id)
            && self.status.map_or(true, |s| s == record.status)
    }
}

/// storage backend holding the authoritative copy of every loan
///
/// status changes go through a compare-and-swap on the current status, so of
/// two concurrent transitions only the first lands. every call fails with
/// `Unavailable` when it cannot finish within the caller's timeout, leaving
/// stored state untouched.
pub trait LoanStore: Send + Sync {
    /// persist a new record
    fn insert(&self, record: LoanRecord, timeout: Duration) -> Result<LoanRecord>;

    /// fetch one record
    fn get(&self, id: &LoanId, timeout: Duration) -> Result<LoanRecord>;

    /// apply `update` only if the stored status still equals `expected`
    ///
    /// A mismatch fails with `InvalidTransition` carrying the status actually
    /// stored and the attempted action.
    fn compare_and_swap(
        &self,
        id: &LoanId,
        expected: LoanStatus,
        update: StatusUpdate,
        timeout: Duration,
    ) -> Result<LoanRecord>;

    /// matching records, ordered by id
    fn list(&self, filter: &LoanFilter, timeout: Duration) -> Result<Vec<LoanRecord>>;
}

impl<T: LoanStore + ?Sized> LoanStore for Arc<T> {
    fn insert(&self, record: LoanRecord, timeout: Duration) -> Result<LoanRecord> {
        (**self).insert(record, timeout)
    }

    fn get(&self, id: &LoanId, timeout: Duration) -> Result<LoanRecord> {
        (**self).get(id, timeout)
    }

    fn compare_and_swap(
        &self,
        id: &LoanId,
        expected: LoanStatus,
        update: StatusUpdate,
        timeout: Duration,
    ) -> Result<LoanRecord> {
        (**self).compare_and_swap(id, expected, update, timeout)
    }

    fn list(&self, filter: &LoanFilter, timeout: Duration) -> Result<Vec<LoanRecord>> {
        (**self).list(filter, timeout)
    }
}
