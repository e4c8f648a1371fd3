use crate::errors::{LoanError, Result};
use crate::types::{AccountId, Actor, ActorRole, LoanAction, LoanStatus};

/// lifecycle state machine
///
/// pending loans are approved or rejected by an employee, approved loans may
/// later be annulled. rejected and annulled are terminal. checks are pure;
/// persisting the outcome is left to the store.
pub struct LoanLifecycle;

impl LoanLifecycle {
    /// status every new loan starts in
    pub const INITIAL: LoanStatus = LoanStatus::Pending;

    /// target status for an action, or None when the edge does not exist
    pub fn target(current: LoanStatus, action: LoanAction) -> Option<LoanStatus> {
        match (current, action) {
            (LoanStatus::Pending, LoanAction::Approve) => Some(LoanStatus::Approved),
            (LoanStatus::Pending, LoanAction::Reject) => Some(LoanStatus::Rejected),
            (LoanStatus::Approved, LoanAction::Annul) => Some(LoanStatus::Annulled),
            _ => None,
        }
    }

    /// role an actor must hold to perform the action
    pub fn required_role(_action: LoanAction) -> ActorRole {
        ActorRole::Employee
    }

    /// role gate, independent of the loan's current status
    pub fn authorize(actor: &Actor, action: LoanAction) -> Result<()> {
        let required = Self::required_role(action);
        if actor.role != required {
            return Err(LoanError::Unauthorized {
                role: actor.role,
                operation: action.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// customers may only request loans on accounts they own
    pub fn authorize_create(actor: &Actor, account_id: &AccountId) -> Result<()> {
        if actor.is_employee() || actor.owns(account_id) {
            return Ok(());
        }
        Err(LoanError::Unauthorized {
            role: actor.role,
            operation: format!("request a loan on account {}", account_id),
        })
    }

    /// validate an action end to end and return the new status
    pub fn transition(current: LoanStatus, action: LoanAction, actor: &Actor) -> Result<LoanStatus> {
        Self::authorize(actor, action)?;
        Self::target(current, action).ok_or(LoanError::InvalidTransition { current, action })
    }

    /// actions that lead somewhere from the given status
    pub fn available_actions(current: LoanStatus) -> Vec<LoanAction> {
        LoanAction::ALL
            .into_iter()
            .filter(|action| Self::target(current, *action).is_some())
            .collect()
    }

    /// whether approval should (re)compute the stored figures
    pub fn computes_figures(action: LoanAction) -> bool {
        action == LoanAction::Approve
    }
}
