use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::record::LoanRecord;
use crate::types::LoanStatus;

/// loan totals shown on an account overview
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPortfolioSummary {
    /// approved loans
    pub active_count: u32,
    pub pending_count: u32,
    /// sum of total payback over approved loans
    pub total_outstanding_payback: Money,
    /// sum of monthly payments over approved loans
    pub monthly_installments_due: Money,
}

impl LoanPortfolioSummary {
    pub fn from_records<'a, I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a LoanRecord>,
    {
        let mut summary = Self::default();
        for record in records {
            match record.status {
                LoanStatus::Approved => {
                    summary.active_count += 1;
                    summary.total_outstanding_payback = accumulate(summary.total_outstanding_payback, record.total_payback)?;
                    summary.monthly_installments_due = accumulate(summary.monthly_installments_due, record.monthly_payment)?;
                }
                LoanStatus::Pending => summary.pending_count += 1,
                LoanStatus::Rejected | LoanStatus::Annulled => {}
            }
        }
        Ok(summary)
    }
}

fn accumulate(total: Money, amount: Money) -> Result<Money> {
    total.checked_add(amount).ok_or_else(|| LoanError::Internal {
        message: format!("decimal overflow summing loan totals at {}", total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::AmortizationEngine;
    use crate::decimal::Rate;
    use crate::request::LoanRequest;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(principal: i64, status: LoanStatus) -> LoanRecord {
        let request = LoanRequest::new("ACC-1", Money::from_major(principal), 12, Rate::ZERO);
        let summary = AmortizationEngine::standard().compute_for(&request).unwrap();
        let mut record = LoanRecord::open(Uuid::new_v4(), &request, summary, Utc::now());
        record.status = status;
        record
    }

    #[test]
    fn test_only_approved_loans_count_as_active() {
        let records = vec![
            record(1_200, LoanStatus::Approved),
            record(2_400, LoanStatus::Approved),
            record(12_000, LoanStatus::Pending),
            record(6_000, LoanStatus::Rejected),
            record(3_600, LoanStatus::Annulled),
        ];

        let summary = LoanPortfolioSummary::from_records(&records).unwrap();
        assert_eq!(summary.active_count, 2);
        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.total_outstanding_payback, Money::from_major(3_600));
        assert_eq!(summary.monthly_installments_due, Money::from_major(300));
    }

    #[test]
    fn test_empty_portfolio() {
        let summary = LoanPortfolioSummary::from_records(&Vec::<LoanRecord>::new()).unwrap();
        assert_eq!(summary, LoanPortfolioSummary::default());
    }

    #[test]
    fn test_overflowing_totals_report_internal_error() {
        let huge = Money::from_decimal(rust_decimal::Decimal::MAX);
        let mut records = vec![record(1_200, LoanStatus::Approved), record(1_200, LoanStatus::Approved)];
        for record in records.iter_mut() {
            record.total_payback = huge;
        }
        assert!(matches!(
            LoanPortfolioSummary::from_records(&records),
            Err(LoanError::Internal { .. })
        ));
    }
}
