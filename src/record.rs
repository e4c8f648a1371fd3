use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amortization::{AmortizationEngine, ScheduleSummary};
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::lifecycle::LoanLifecycle;
use crate::request::LoanRequest;
use crate::types::{AccountId, LoanAction, LoanId, LoanStatus};

/// persisted loan, as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: LoanId,
    pub account_id: AccountId,

    // terms
    pub principal: Money,
    pub term_months: u32,
    pub annual_rate: Rate,

    // derived figures
    pub monthly_payment: Money,
    pub total_payback: Money,

    // status
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: DateTime<Utc>,
}

impl LoanRecord {
    /// new pending record from a validated request and its figures
    pub fn open(id: LoanId, request: &LoanRequest, summary: ScheduleSummary, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            account_id: request.account_id.clone(),
            principal: request.principal,
            term_months: request.term_months,
            annual_rate: request.annual_rate,
            monthly_payment: summary.monthly_payment,
            total_payback: summary.total_payback,
            status: LoanLifecycle::INITIAL,
            created_at,
            status_changed_at: created_at,
        }
    }

    pub fn figures(&self) -> ScheduleSummary {
        ScheduleSummary {
            monthly_payment: self.monthly_payment,
            total_payback: self.total_payback,
        }
    }

    /// the request this record was created from
    pub fn terms(&self) -> LoanRequest {
        LoanRequest::new(self.account_id.clone(), self.principal, self.term_months, self.annual_rate)
    }

    /// recompute the figures from the stored terms; they were validated at creation
    pub fn expected_figures(&self) -> Result<ScheduleSummary> {
        AmortizationEngine::compute_unchecked(self.principal, self.term_months, self.annual_rate)
    }

    /// stored figures must match what the engine derives from the terms
    pub fn verify_figures(&self) -> Result<()> {
        let expected = self.expected_figures()?;
        if expected != self.figures() {
            return Err(LoanError::Internal {
                message: format!(
                    "loan {} stores {} / {} but its terms give {} / {}",
                    self.id,
                    self.monthly_payment,
                    self.total_payback,
                    expected.monthly_payment,
                    expected.total_payback
                ),
            });
        }
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn available_actions(&self) -> Vec<LoanAction> {
        LoanLifecycle::available_actions(self.status)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LoanError::Internal {
            message: e.to_string(),
        })
    }
}

/// change applied atomically by the store when the status still matches
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub action: LoanAction,
    pub status: LoanStatus,
    pub changed_at: DateTime<Utc>,
    /// replacement figures, only ever set on approval
    pub figures: Option<ScheduleSummary>,
}

impl StatusUpdate {
    pub fn apply(&self, record: &mut LoanRecord) {
        record.status = self.status;
        record.status_changed_at = self.changed_at;
        if let Some(figures) = self.figures {
            record.monthly_payment = figures.monthly_payment;
            record.total_payback = figures.total_payback;
        }
    }
}
