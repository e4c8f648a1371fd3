use thiserror::Error;

use crate::types::{ActorRole, LoanAction, LoanField, LoanId, LoanStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("invalid loan parameters: {field} {message}")]
    InvalidLoanParameters {
        field: LoanField,
        message: String,
    },

    #[error("invalid transition: cannot {action} a loan that is {current}")]
    InvalidTransition {
        current: LoanStatus,
        action: LoanAction,
    },

    #[error("unauthorized: {role} may not {operation}")]
    Unauthorized {
        role: ActorRole,
        operation: String,
    },

    #[error("loan service unavailable: {message}")]
    Unavailable {
        message: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("internal error: {message}")]
    Internal {
        message: String,
    },
}

/// coarse classification callers branch on when rendering or retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidLoanParameters,
    InvalidTransition,
    Unauthorized,
    Unavailable,
    NotFound,
    Internal,
}

impl LoanError {
    pub fn invalid(field: LoanField, message: impl Into<String>) -> Self {
        LoanError::InvalidLoanParameters {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanError::InvalidLoanParameters { .. } => ErrorKind::InvalidLoanParameters,
            LoanError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            LoanError::Unauthorized { .. } => ErrorKind::Unauthorized,
            LoanError::Unavailable { .. } => ErrorKind::Unavailable,
            LoanError::LoanNotFound { .. } => ErrorKind::NotFound,
            LoanError::InvalidConfiguration { .. } | LoanError::Internal { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// only transport failures are worth retrying unchanged
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Unavailable
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
