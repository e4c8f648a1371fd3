use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{AccountId, ActorRole, LoanAction, LoanId, LoanStatus};

/// events emitted by successful loan operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoanEvent {
    LoanRequested {
        loan_id: LoanId,
        account_id: AccountId,
        principal: Money,
        term_months: u32,
        annual_rate: Rate,
        requested_by: ActorRole,
        timestamp: DateTime<Utc>,
    },
    LoanApproved {
        loan_id: LoanId,
        monthly_payment: Money,
        total_payback: Money,
        timestamp: DateTime<Utc>,
    },
    LoanRejected {
        loan_id: LoanId,
        timestamp: DateTime<Utc>,
    },
    LoanAnnulled {
        loan_id: LoanId,
        timestamp: DateTime<Utc>,
    },
    /// figures replaced on approval because they no longer matched the terms
    FiguresRecomputed {
        loan_id: LoanId,
        old_monthly_payment: Money,
        new_monthly_payment: Money,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        action: LoanAction,
        timestamp: DateTime<Utc>,
    },
}

impl LoanEvent {
    pub fn loan_id(&self) -> LoanId {
        match self {
            LoanEvent::LoanRequested { loan_id, .. }
            | LoanEvent::LoanApproved { loan_id, .. }
            | LoanEvent::LoanRejected { loan_id, .. }
            | LoanEvent::LoanAnnulled { loan_id, .. }
            | LoanEvent::FiguresRecomputed { loan_id, .. }
            | LoanEvent::StatusChanged { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<LoanEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: LoanEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<LoanEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[LoanEvent] {
        &self.events
    }

}
