use serde::{Deserialize, Serialize};

use crate::config::LoanPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::{AccountId, LoanField};

/// customer-submitted loan request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub account_id: AccountId,
    pub principal: Money,
    pub term_months: u32,
    pub annual_rate: Rate,
}

impl LoanRequest {
    pub fn new(account_id: impl Into<AccountId>, principal: Money, term_months: u32, annual_rate: Rate) -> Self {
        Self {
            account_id: account_id.into(),
            principal,
            term_months,
            annual_rate,
        }
    }

    /// validate every field against the policy, account first
    pub fn validate(&self, policy: &LoanPolicy) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(LoanError::invalid(LoanField::AccountId, "must not be empty"));
        }
        validate_terms(policy, self.principal, self.term_months, self.annual_rate)
    }
}

/// validate the financial terms of a loan
pub fn validate_terms(
    policy: &LoanPolicy,
    principal: Money,
    term_months: u32,
    annual_rate: Rate,
) -> Result<()> {
    if !principal.is_positive() {
        return Err(LoanError::invalid(
            LoanField::Principal,
            format!("must be greater than zero, got {}", principal),
        ));
    }

    if let Some(min) = policy.min_principal {
        if principal < min {
            return Err(LoanError::invalid(
                LoanField::Principal,
                format!("must be at least {}, got {}", min, principal),
            ));
        }
    }

    if let Some(max) = policy.max_principal {
        if principal > max {
            return Err(LoanError::invalid(
                LoanField::Principal,
                format!("must be at most {}, got {}", max, principal),
            ));
        }
    }

    if term_months == 0
        || term_months < policy.min_term_months
        || term_months > policy.max_term_months
    {
        return Err(LoanError::invalid(
            LoanField::TermMonths,
            format!(
                "must be between {} and {}, got {}",
                policy.min_term_months.max(1),
                policy.max_term_months,
                term_months
            ),
        ));
    }

    if annual_rate.is_negative() {
        return Err(LoanError::invalid(
            LoanField::AnnualRate,
            format!("must not be negative, got {}", annual_rate),
        ));
    }

    if let Some(max) = policy.max_annual_rate {
        if annual_rate > max {
            return Err(LoanError::invalid(
                LoanField::AnnualRate,
                format!("must be at most {}, got {}", max, annual_rate),
            ));
        }
    }

    Ok(())
}
