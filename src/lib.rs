pub mod amortization;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod record;
pub mod request;
pub mod service;
pub mod store;
pub mod summary;
pub mod types;

// re-export key types
pub use amortization::{
    compute_schedule, AmortizationEngine, AmortizationSchedule, Installment, ScheduleSummary,
};
pub use config::{LoanPolicy, ServiceConfig};
pub use decimal::{Money, Rate};
pub use errors::{ErrorKind, LoanError, Result};
pub use events::{EventStore, LoanEvent};
pub use lifecycle::LoanLifecycle;
pub use record::{LoanRecord, StatusUpdate};
pub use request::LoanRequest;
pub use service::{LoanService, RequestContext};
pub use store::{InMemoryLoanStore, LoanFilter, LoanStore};
pub use summary::LoanPortfolioSummary;
pub use types::{AccountId, Actor, ActorRole, LoanAction, LoanField, LoanId, LoanStatus};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
