use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// opaque reference to the account that owns a loan
pub type AccountId = String;

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// requested, awaiting an employee decision
    Pending,
    /// approved by an employee
    Approved,
    /// turned down before approval
    Rejected,
    /// approved and later cancelled
    Annulled,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Pending,
        LoanStatus::Approved,
        LoanStatus::Rejected,
        LoanStatus::Annulled,
    ];

    /// no transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Rejected | LoanStatus::Annulled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Annulled => "annulled",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// action requested against an existing loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanAction {
    Approve,
    Reject,
    Annul,
}

impl LoanAction {
    pub const ALL: [LoanAction; 3] = [LoanAction::Approve, LoanAction::Reject, LoanAction::Annul];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanAction::Approve => "approve",
            LoanAction::Reject => "reject",
            LoanAction::Annul => "annul",
        }
    }
}

impl fmt::Display for LoanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// role of whoever issues a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Employee,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Customer => f.write_str("customer"),
            ActorRole::Employee => f.write_str("employee"),
        }
    }
}

/// authenticated caller, passed explicitly into every operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: ActorRole,
    /// accounts the actor owns
    pub account_ids: Vec<AccountId>,
}

impl Actor {
    pub fn customer<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AccountId>,
    {
        Self {
            role: ActorRole::Customer,
            account_ids: accounts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn employee() -> Self {
        Self {
            role: ActorRole::Employee,
            account_ids: Vec::new(),
        }
    }

    pub fn is_employee(&self) -> bool {
        self.role == ActorRole::Employee
    }

    pub fn owns(&self, account_id: &str) -> bool {
        self.account_ids.iter().any(|a| a == account_id)
    }

    /// employees see every account, customers only their own
    pub fn can_view(&self, account_id: &str) -> bool {
        self.is_employee() || self.owns(account_id)
    }
}

/// loan request field, named in validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanField {
    Principal,
    TermMonths,
    AnnualRate,
    AccountId,
}

impl fmt::Display for LoanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanField::Principal => f.write_str("principal"),
            LoanField::TermMonths => f.write_str("term_months"),
            LoanField::AnnualRate => f.write_str("annual_rate"),
            LoanField::AccountId => f.write_str("account_id"),
        }
    }
}
