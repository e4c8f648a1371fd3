use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::LoanPolicy;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::request::{validate_terms, LoanRequest};

/// published figures of a fixed-rate annuity loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub monthly_payment: Money,
    pub total_payback: Money,
}

impl ScheduleSummary {
    /// interest paid over the life of the loan
    pub fn total_interest(&self, principal: Money) -> Money {
        self.total_payback - principal
    }
}

/// compute monthly payment and total payback under the standard policy
pub fn compute_schedule(principal: Money, term_months: u32, annual_rate: Rate) -> Result<ScheduleSummary> {
    AmortizationEngine::standard().compute_schedule(principal, term_months, annual_rate)
}

/// amortization engine, pure and side-effect free
#[derive(Debug, Clone, Default)]
pub struct AmortizationEngine {
    policy: LoanPolicy,
}

impl AmortizationEngine {
    pub fn new(policy: LoanPolicy) -> Self {
        Self { policy }
    }

    pub fn standard() -> Self {
        Self::new(LoanPolicy::standard())
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// validate inputs, then apply the annuity formula
    pub fn compute_schedule(
        &self,
        principal: Money,
        term_months: u32,
        annual_rate: Rate,
    ) -> Result<ScheduleSummary> {
        validate_terms(&self.policy, principal, term_months, annual_rate)?;
        Self::compute_unchecked(principal, term_months, annual_rate)
    }

    /// apply the annuity formula to terms accepted earlier, whatever the current policy
    ///
    /// a zero term is still refused since no payment can be derived from it
    pub fn compute_unchecked(principal: Money, term_months: u32, annual_rate: Rate) -> Result<ScheduleSummary> {
        if term_months == 0 {
            return Err(LoanError::Internal {
                message: "cannot amortize over zero months".to_string(),
            });
        }

        let payment = monthly_payment_exact(principal, term_months, annual_rate)?;
        let monthly_payment = Money::from_decimal(payment);
        let total_payback = monthly_payment.checked_times(term_months)?;

        Ok(ScheduleSummary {
            monthly_payment,
            total_payback,
        })
    }

    pub fn compute_for(&self, request: &LoanRequest) -> Result<ScheduleSummary> {
        self.compute_schedule(request.principal, request.term_months, request.annual_rate)
    }
}

/// unrounded level payment
///
/// EMI = P * r / (1 - (1 + r)^-n), or P / n when r is zero
fn monthly_payment_exact(principal: Money, term_months: u32, annual_rate: Rate) -> Result<Decimal> {
    let p = principal.as_decimal();
    let n = Decimal::from(term_months);
    let r = annual_rate.monthly_rate().as_decimal();

    if r.is_zero() {
        return Ok(p / n);
    }

    let compound = compound_factor(r, term_months)?;
    let discount = Decimal::ONE
        .checked_div(compound)
        .ok_or_else(|| overflow("discount factor"))?;
    let denominator = Decimal::ONE - discount;
    if denominator.is_zero() {
        return Err(overflow("annuity denominator"));
    }

    p.checked_mul(r)
        .and_then(|numerator| numerator.checked_div(denominator))
        .ok_or_else(|| overflow("monthly payment"))
}

/// (1 + r)^n by repeated multiplication
fn compound_factor(monthly_rate: Decimal, periods: u32) -> Result<Decimal> {
    let base = Decimal::ONE
        .checked_add(monthly_rate)
        .ok_or_else(|| overflow("compound base"))?;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor = factor
            .checked_mul(base)
            .ok_or_else(|| overflow("compound factor"))?;
    }
    Ok(factor)
}

fn overflow(what: &str) -> LoanError {
    LoanError::Internal {
        message: format!("decimal overflow computing {}", what),
    }
}

fn checked_total(mut amounts: impl Iterator<Item = Money>, what: &str) -> Result<Money> {
    amounts.try_fold(Money::ZERO, |acc, amount| {
        acc.checked_add(amount).ok_or_else(|| overflow(what))
    })
}

/// one monthly installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub closing_balance: Money,
}

/// full month-by-month repayment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub summary: ScheduleSummary,
    pub installments: Vec<Installment>,
    pub total_interest: Money,
    pub total_paid: Money,
}

impl AmortizationSchedule {
    /// generate the plan; the last installment absorbs rounding residue
    pub fn generate(
        engine: &AmortizationEngine,
        request: &LoanRequest,
        first_due_date: NaiveDate,
    ) -> Result<Self> {
        let summary = engine.compute_for(request)?;
        let monthly_rate = request.annual_rate.monthly_rate().as_decimal();

        let mut installments = Vec::with_capacity(request.term_months as usize);
        let mut balance = request.principal;

        for number in 1..=request.term_months {
            let due_date = first_due_date
                .checked_add_months(Months::new(number - 1))
                .ok_or_else(|| LoanError::Internal {
                    message: format!("due date out of range for installment {}", number),
                })?;

            let interest_portion = balance
                .as_decimal()
                .checked_mul(monthly_rate)
                .map(Money::from_decimal)
                .ok_or_else(|| overflow("installment interest"))?;

            let (payment, principal_portion) = if number == request.term_months {
                let payment = balance
                    .checked_add(interest_portion)
                    .ok_or_else(|| overflow("final installment"))?;
                (payment, balance)
            } else {
                let principal_portion = summary
                    .monthly_payment
                    .checked_sub(interest_portion)
                    .ok_or_else(|| overflow("principal portion"))?
                    .min(balance);
                (summary.monthly_payment, principal_portion)
            };

            let closing_balance = balance
                .checked_sub(principal_portion)
                .ok_or_else(|| overflow("closing balance"))?
                .max(Money::ZERO);

            installments.push(Installment {
                number,
                due_date,
                opening_balance: balance,
                payment,
                interest_portion,
                principal_portion,
                closing_balance,
            });

            balance = closing_balance;
        }

        let total_interest = checked_total(installments.iter().map(|i| i.interest_portion), "total interest")?;
        let total_paid = checked_total(installments.iter().map(|i| i.payment), "total paid")?;

        Ok(Self {
            principal: request.principal,
            annual_rate: request.annual_rate,
            term_months: request.term_months,
            summary,
            installments,
            total_interest,
            total_paid,
        })
    }

    pub fn installment(&self, number: u32) -> Option<&Installment> {
        number
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
    }

    /// balance left after the given installment is paid
    pub fn balance_after(&self, number: u32) -> Money {
        self.installment(number)
            .map(|i| i.closing_balance)
            .unwrap_or(self.principal)
    }
}
