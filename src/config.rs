use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// bounds a loan request must satisfy before a record is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPolicy {
    pub min_term_months: u32,
    pub max_term_months: u32,
    pub max_annual_rate: Option<Rate>,
    pub min_principal: Option<Money>,
    pub max_principal: Option<Money>,
}

impl LoanPolicy {
    /// retail personal loans: 1 to 60 monthly installments
    pub fn standard() -> Self {
        Self {
            min_term_months: 1,
            max_term_months: 60,
            max_annual_rate: None,
            min_principal: None,
            max_principal: None,
        }
    }

    /// policy with a different term ceiling
    pub fn with_max_term(max_term_months: u32) -> Self {
        Self {
            max_term_months,
            ..Self::standard()
        }
    }

    pub fn max_annual_rate(mut self, rate: Rate) -> Self {
        self.max_annual_rate = Some(rate);
        self
    }

    pub fn principal_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_principal = min;
        self.max_principal = max;
        self
    }

    /// check the policy itself is coherent
    pub fn validate(&self) -> Result<()> {
        if self.min_term_months == 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "min_term_months must be at least 1".to_string(),
            });
        }

        if self.min_term_months > self.max_term_months {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "min_term_months {} exceeds max_term_months {}",
                    self.min_term_months, self.max_term_months
                ),
            });
        }

        if let Some(rate) = self.max_annual_rate {
            if rate.is_negative() {
                return Err(LoanError::InvalidConfiguration {
                    message: format!("max_annual_rate must not be negative, got {}", rate),
                });
            }
        }

        if let (Some(min), Some(max)) = (self.min_principal, self.max_principal) {
            if min > max {
                return Err(LoanError::InvalidConfiguration {
                    message: format!("min_principal {} exceeds max_principal {}", min, max),
                });
            }
        }

        Ok(())
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// loan service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub policy: LoanPolicy,
    /// applied to store calls when the caller supplies no timeout
    pub default_timeout: Duration,
}

impl ServiceConfig {
    pub fn new(policy: LoanPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// parse and validate a json configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ServiceConfig =
            serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.policy.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LoanError::Internal {
            message: e.to_string(),
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            policy: LoanPolicy::standard(),
            default_timeout: Duration::from_secs(5),
        }
    }
}
