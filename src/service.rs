use std::time::Duration;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::amortization::{AmortizationEngine, AmortizationSchedule, ScheduleSummary};
use crate::config::ServiceConfig;
use crate::errors::{LoanError, Result};
use crate::events::{EventStore, LoanEvent};
use crate::lifecycle::LoanLifecycle;
use crate::record::{LoanRecord, StatusUpdate};
use crate::request::LoanRequest;
use crate::store::{LoanFilter, LoanStore};
use crate::summary::LoanPortfolioSummary;
use crate::types::{Actor, LoanAction, LoanId, LoanStatus};

/// credentials and limits for a single call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub actor: Actor,
    /// overrides the configured default timeout
    pub timeout: Option<Duration>,
}

impl RequestContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// typed entry point for every loan operation
pub struct LoanService<S: LoanStore> {
    store: S,
    engine: AmortizationEngine,
    config: ServiceConfig,
    events: EventStore,
}

impl<S: LoanStore> LoanService<S> {
    pub fn new(store: S, config: ServiceConfig) -> Result<Self> {
        config.policy.validate()?;
        Ok(Self {
            store,
            engine: AmortizationEngine::new(config.policy.clone()),
            config,
            events: EventStore::new(),
        })
    }

    /// service over the standard policy
    pub fn with_defaults(store: S) -> Result<Self> {
        Self::new(store, ServiceConfig::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &AmortizationEngine {
        &self.engine
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn timeout(&self, ctx: &RequestContext) -> Duration {
        ctx.timeout.unwrap_or(self.config.default_timeout)
    }

    /// figures the service would store for this request
    pub fn preview(&self, request: &LoanRequest) -> Result<ScheduleSummary> {
        request.validate(&self.config.policy)?;
        self.engine.compute_for(request)
    }

    /// month-by-month plan for a request
    pub fn schedule(&self, request: &LoanRequest, first_due_date: NaiveDate) -> Result<AmortizationSchedule> {
        request.validate(&self.config.policy)?;
        AmortizationSchedule::generate(&self.engine, request, first_due_date)
    }

    /// create a pending loan
    pub fn create_loan(
        &mut self,
        ctx: &RequestContext,
        request: &LoanRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanRecord> {
        if let Err(e) = LoanLifecycle::authorize_create(&ctx.actor, &request.account_id) {
            log::warn!("loan request refused for account {}: {}", request.account_id, e);
            return Err(e);
        }

        let summary = self.preview(request)?;
        let now = time_provider.now();
        let record = LoanRecord::open(Uuid::new_v4(), request, summary, now);

        let stored = self.store.insert(record, self.timeout(ctx))?;

        log::info!(
            "loan {} requested on account {}: {} over {} months at {}, {} per month",
            stored.id,
            stored.account_id,
            stored.principal,
            stored.term_months,
            stored.annual_rate,
            stored.monthly_payment
        );

        self.events.emit(LoanEvent::LoanRequested {
            loan_id: stored.id,
            account_id: stored.account_id.clone(),
            principal: stored.principal,
            term_months: stored.term_months,
            annual_rate: stored.annual_rate,
            requested_by: ctx.actor.role,
            timestamp: now,
        });

        Ok(stored)
    }

    /// apply a lifecycle action to an existing loan
    pub fn transition_loan(
        &mut self,
        ctx: &RequestContext,
        loan_id: &LoanId,
        action: LoanAction,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanRecord> {
        if let Err(e) = LoanLifecycle::authorize(&ctx.actor, action) {
            log::warn!("{} on loan {} refused: {}", action, loan_id, e);
            return Err(e);
        }

        let timeout = self.timeout(ctx);
        let current = self.store.get(loan_id, timeout)?;

        let new_status = match LoanLifecycle::transition(current.status, action, &ctx.actor) {
            Ok(status) => status,
            Err(e) => {
                log::debug!("{} on loan {} rejected: {}", action, loan_id, e);
                return Err(e);
            }
        };

        let figures = if LoanLifecycle::computes_figures(action) {
            let expected = current.expected_figures()?;
            (expected != current.figures()).then_some(expected)
        } else {
            None
        };

        let now = time_provider.now();
        let update = StatusUpdate {
            action,
            status: new_status,
            changed_at: now,
            figures,
        };

        let updated = self
            .store
            .compare_and_swap(loan_id, current.status, update, timeout)?;

        log::info!("loan {} {} -> {} by {}", loan_id, current.status, updated.status, ctx.actor.role);

        self.events.emit(LoanEvent::StatusChanged {
            loan_id: updated.id,
            old_status: current.status,
            new_status: updated.status,
            action,
            timestamp: now,
        });

        if let Some(figures) = figures {
            self.events.emit(LoanEvent::FiguresRecomputed {
                loan_id: updated.id,
                old_monthly_payment: current.monthly_payment,
                new_monthly_payment: figures.monthly_payment,
                timestamp: now,
            });
        }

        match updated.status {
            LoanStatus::Approved => self.events.emit(LoanEvent::LoanApproved {
                loan_id: updated.id,
                monthly_payment: updated.monthly_payment,
                total_payback: updated.total_payback,
                timestamp: now,
            }),
            LoanStatus::Rejected => self.events.emit(LoanEvent::LoanRejected {
                loan_id: updated.id,
                timestamp: now,
            }),
            LoanStatus::Annulled => self.events.emit(LoanEvent::LoanAnnulled {
                loan_id: updated.id,
                timestamp: now,
            }),
            LoanStatus::Pending => {}
        }

        Ok(updated)
    }

    pub fn approve(&mut self, ctx: &RequestContext, loan_id: &LoanId, time_provider: &SafeTimeProvider) -> Result<LoanRecord> {
        self.transition_loan(ctx, loan_id, LoanAction::Approve, time_provider)
    }

    pub fn reject(&mut self, ctx: &RequestContext, loan_id: &LoanId, time_provider: &SafeTimeProvider) -> Result<LoanRecord> {
        self.transition_loan(ctx, loan_id, LoanAction::Reject, time_provider)
    }

    pub fn annul(&mut self, ctx: &RequestContext, loan_id: &LoanId, time_provider: &SafeTimeProvider) -> Result<LoanRecord> {
        self.transition_loan(ctx, loan_id, LoanAction::Annul, time_provider)
    }

    /// one loan, if the actor may see it
    pub fn get_loan(&self, ctx: &RequestContext, loan_id: &LoanId) -> Result<LoanRecord> {
        let record = self.store.get(loan_id, self.timeout(ctx))?;
        if !ctx.actor.can_view(&record.account_id) {
            return Err(LoanError::Unauthorized {
                role: ctx.actor.role,
                operation: format!("view loan {}", loan_id),
            });
        }
        Ok(record)
    }

    /// loans visible to the actor that match the filter, ordered by id
    pub fn list_loans(&self, ctx: &RequestContext, filter: &LoanFilter) -> Result<Vec<LoanRecord>> {
        if let Some(account_id) = &filter.account_id {
            if !ctx.actor.can_view(account_id) {
                return Err(LoanError::Unauthorized {
                    role: ctx.actor.role,
                    operation: format!("list loans of account {}", account_id),
                });
            }
        }

        let mut records = self.store.list(filter, self.timeout(ctx))?;
        records.retain(|record| ctx.actor.can_view(&record.account_id));
        Ok(records)
    }

    /// totals over the loans visible to the actor
    pub fn summary(&self, ctx: &RequestContext, account_id: Option<&str>) -> Result<LoanPortfolioSummary> {
        let filter = LoanFilter {
            account_id: account_id.map(str::to_string),
            status: None,
        };
        let records = self.list_loans(ctx, &filter)?;
        LoanPortfolioSummary::from_records(&records)
    }

    pub fn events(&self) -> &[LoanEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<LoanEvent> {
        self.events.take_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoanPolicy;
    use crate::decimal::{Money, Rate};
    use crate::errors::ErrorKind;
    use crate::store::InMemoryLoanStore;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use std::sync::Arc;

    fn clock() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
    }

    fn service() -> LoanService<Arc<InMemoryLoanStore>> {
        LoanService::with_defaults(Arc::new(InMemoryLoanStore::new())).unwrap()
    }

    fn customer() -> RequestContext {
        RequestContext::new(Actor::customer(["ACC-1"]))
    }

    fn employee() -> RequestContext {
        RequestContext::new(Actor::employee())
    }

    fn request() -> LoanRequest {
        LoanRequest::new("ACC-1", Money::from_major(120_000), 12, Rate::from_percentage(10))
    }

    #[test]
    fn test_create_stores_pending_with_figures() {
        let time = clock();
        let mut service = service();

        let loan = service.create_loan(&customer(), &request(), &time).unwrap();

        assert_eq!(loan.status, LoanStatus::Pending);
        assert_eq!(loan.monthly_payment, Money::from_str_exact("10549.91").unwrap());
        assert_eq!(loan.total_payback, Money::from_str_exact("126598.92").unwrap());
        assert_eq!(loan.created_at, time.now());
        assert_eq!(service.preview(&request()).unwrap(), loan.figures());
        assert!(matches!(service.events(), [LoanEvent::LoanRequested { .. }]));
    }

    #[test]
    fn test_invalid_request_creates_nothing() {
        let time = clock();
        let mut service = service();
        let bad = LoanRequest::new("ACC-1", Money::from_major(1_000), 61, Rate::ZERO);

        let err = service.create_loan(&customer(), &bad, &time).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanParameters);
        assert!(service.store().is_empty());
        assert!(service.events().is_empty());
    }

    #[test]
    fn test_customer_cannot_borrow_on_foreign_account() {
        let time = clock();
        let mut service = service();
        let foreign = LoanRequest::new("ACC-9", Money::from_major(1_000), 6, Rate::ZERO);

        let err = service.create_loan(&customer(), &foreign, &time).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        // employees may open loans on any account
        assert!(service.create_loan(&employee(), &foreign, &time).is_ok());
    }

    #[test]
    fn test_approve_then_reject_fails() {
        let time = clock();
        let control = time.test_control().unwrap();
        let mut service = service();
        let loan = service.create_loan(&customer(), &request(), &time).unwrap();

        control.advance(chrono::Duration::days(1));
        let approved = service.approve(&employee(), &loan.id, &time).unwrap();
        assert_eq!(approved.status, LoanStatus::Approved);
        assert_eq!(approved.status_changed_at, time.now());
        assert_eq!(approved.figures(), loan.figures());

        let err = service.reject(&employee(), &loan.id, &time).unwrap_err();
        assert_eq!(
            err,
            LoanError::InvalidTransition {
                current: LoanStatus::Approved,
                action: LoanAction::Reject,
            }
        );
        assert_eq!(service.get_loan(&employee(), &loan.id).unwrap().status, LoanStatus::Approved);
    }

    #[test]
    fn test_reject_then_approve_fails() {
        let time = clock();
        let mut service = service();
        let loan = service.create_loan(&customer(), &request(), &time).unwrap();

        service.reject(&employee(), &loan.id, &time).unwrap();
        let err = service.approve(&employee(), &loan.id, &time).unwrap_err();
        assert_eq!(
            err,
            LoanError::InvalidTransition {
                current: LoanStatus::Rejected,
                action: LoanAction::Approve,
            }
        );
        assert_eq!(service.get_loan(&customer(), &loan.id).unwrap().status, LoanStatus::Rejected);
    }

    #[test]
    fn test_annul_keeps_figures() {
        let time = clock();
        let mut service = service();
        let loan = service.create_loan(&customer(), &request(), &time).unwrap();

        service.approve(&employee(), &loan.id, &time).unwrap();
        let annulled = service.annul(&employee(), &loan.id, &time).unwrap();

        assert_eq!(annulled.status, LoanStatus::Annulled);
        assert_eq!(annulled.figures(), loan.figures());
        assert!(service.annul(&employee(), &loan.id, &time).is_err());

        let events = service.take_events();
        assert!(events.iter().any(|e| matches!(e, LoanEvent::LoanApproved { .. })));
        assert!(events.iter().any(|e| matches!(e, LoanEvent::LoanAnnulled { .. })));
        assert!(service.events().is_empty());
    }

    #[test]
    fn test_customer_transition_unauthorized_in_any_state() {
        let time = clock();
        let mut service = service();
        let pending = service.create_loan(&customer(), &request(), &time).unwrap();
        let approved = service.create_loan(&customer(), &request(), &time).unwrap();
        service.approve(&employee(), &approved.id, &time).unwrap();

        for id in [pending.id, approved.id] {
            for action in LoanAction::ALL {
                let before = service.get_loan(&customer(), &id).unwrap();
                let err = service.transition_loan(&customer(), &id, action, &time).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::Unauthorized);
                assert_eq!(service.get_loan(&customer(), &id).unwrap(), before);
            }
        }

        // the role check runs before the lookup
        let err = service
            .transition_loan(&customer(), &Uuid::new_v4(), LoanAction::Approve, &time)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_unknown_loan_not_found() {
        let time = clock();
        let mut service = service();
        let id = Uuid::new_v4();
        let err = service.approve(&employee(), &id, &time).unwrap_err();
        assert_eq!(err, LoanError::LoanNotFound { id });
    }

    #[test]
    fn test_approval_repairs_stale_figures() {
        let time = clock();
        let store = Arc::new(InMemoryLoanStore::new());
        let mut service = LoanService::with_defaults(store.clone()).unwrap();

        let legacy = LoanRecord::open(
            Uuid::new_v4(),
            &request(),
            ScheduleSummary {
                monthly_payment: Money::from_major(11_000),
                total_payback: Money::from_major(132_000),
            },
            time.now(),
        );
        store.insert(legacy.clone(), Duration::from_secs(1)).unwrap();

        let approved = service.approve(&employee(), &legacy.id, &time).unwrap();
        assert_eq!(approved.monthly_payment, Money::from_str_exact("10549.91").unwrap());
        assert!(approved.verify_figures().is_ok());
        assert!(service
            .events()
            .iter()
            .any(|e| matches!(e, LoanEvent::FiguresRecomputed { .. })));
    }

    #[test]
    fn test_timeout_surfaces_unavailable_and_changes_nothing() {
        let time = clock();
        let mut service = service();
        let loan = service.create_loan(&customer(), &request(), &time).unwrap();

        service.store().set_latency(Duration::from_millis(500));
        let hurried = employee().with_timeout(Duration::from_millis(50));
        let err = service.approve(&hurried, &loan.id, &time).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(err.is_retryable());

        service.store().set_latency(Duration::ZERO);
        assert_eq!(service.get_loan(&employee(), &loan.id).unwrap().status, LoanStatus::Pending);
    }

    #[test]
    fn test_concurrent_decisions_only_one_lands() {
        let store = Arc::new(InMemoryLoanStore::new());
        let time = clock();
        let mut creator = LoanService::with_defaults(store.clone()).unwrap();
        let loan = creator.create_loan(&customer(), &request(), &time).unwrap();

        let handles: Vec<_> = [LoanAction::Approve, LoanAction::Reject]
            .into_iter()
            .map(|action| {
                let store = store.clone();
                let id = loan.id;
                std::thread::spawn(move || {
                    let time = clock();
                    let mut service = LoanService::with_defaults(store).unwrap();
                    service.transition_loan(&employee(), &id, action, &time)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);

        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(loser.kind(), ErrorKind::InvalidTransition);

        let stored = store.get(&loan.id, Duration::from_secs(1)).unwrap();
        assert!(matches!(stored.status, LoanStatus::Approved | LoanStatus::Rejected));
    }

    #[test]
    fn test_listing_respects_ownership() {
        let time = clock();
        let mut service = service();
        let mine = service.create_loan(&customer(), &request(), &time).unwrap();
        let theirs = LoanRequest::new("ACC-2", Money::from_major(5_000), 6, Rate::ZERO);
        service.create_loan(&employee(), &theirs, &time).unwrap();

        let visible = service.list_loans(&customer(), &LoanFilter::all()).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, mine.id);

        assert_eq!(service.list_loans(&employee(), &LoanFilter::all()).unwrap().len(), 2);

        let err = service
            .list_loans(&customer(), &LoanFilter::account("ACC-2"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        service.approve(&employee(), &mine.id, &time).unwrap();
        let approved = service
            .list_loans(&customer(), &LoanFilter::account("ACC-1").status(LoanStatus::Approved))
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert!(service
            .list_loans(&customer(), &LoanFilter::all().status(LoanStatus::Pending))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_summary_over_visible_loans() {
        let time = clock();
        let mut service = service();
        let first = service.create_loan(&customer(), &request(), &time).unwrap();
        let second = LoanRequest::new("ACC-1", Money::from_major(1_200), 12, Rate::ZERO);
        let second = service.create_loan(&customer(), &second, &time).unwrap();
        service.create_loan(&customer(), &request(), &time).unwrap();

        service.approve(&employee(), &first.id, &time).unwrap();
        service.approve(&employee(), &second.id, &time).unwrap();

        let summary = service.summary(&customer(), Some("ACC-1")).unwrap();
        assert_eq!(summary.active_count, 2);
        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.monthly_installments_due, Money::from_str_exact("10649.91").unwrap());
        assert_eq!(summary.total_outstanding_payback, Money::from_str_exact("127798.92").unwrap());
    }

    #[test]
    fn test_service_policy_is_enforced() {
        let time = clock();
        let policy = LoanPolicy::with_max_term(24);
        let mut service =
            LoanService::new(Arc::new(InMemoryLoanStore::new()), ServiceConfig::new(policy)).unwrap();

        let long = LoanRequest::new("ACC-1", Money::from_major(1_000), 36, Rate::ZERO);
        assert!(service.preview(&long).is_err());
        assert!(service.create_loan(&customer(), &long, &time).is_err());

        let invalid = ServiceConfig::new(LoanPolicy::with_max_term(0));
        assert!(LoanService::new(InMemoryLoanStore::new(), invalid).is_err());
    }

    #[test]
    fn test_tightened_policy_still_approves_existing_loan() {
        let time = clock();
        let store = Arc::new(InMemoryLoanStore::new());
        let mut lenient = LoanService::with_defaults(store.clone()).unwrap();

        let long = LoanRequest::new("ACC-1", Money::from_major(10_000), 48, Rate::from_percentage(5));
        let loan = lenient.create_loan(&customer(), &long, &time).unwrap();

        let mut strict = LoanService::new(store, ServiceConfig::new(LoanPolicy::with_max_term(24))).unwrap();
        assert!(strict.preview(&long).is_err());

        let approved = strict.approve(&employee(), &loan.id, &time).unwrap();
        assert_eq!(approved.status, LoanStatus::Approved);
        assert_eq!(approved.figures(), loan.figures());
        assert!(!strict
            .events()
            .iter()
            .any(|e| matches!(e, LoanEvent::FiguresRecomputed { .. })));
    }

    #[test]
    fn test_schedule_matches_preview() {
        let service = service();
        let first_due = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let schedule = service.schedule(&request(), first_due).unwrap();
        assert_eq!(schedule.summary, service.preview(&request()).unwrap());
        assert_eq!(schedule.installments.len(), 12);
    }
}
