/// lifecycle - request, approve, annul, and the transitions that are refused
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use loan_lifecycle_rs::{
    Actor, InMemoryLoanStore, LoanFilter, LoanRequest, LoanService, Money, Rate, RequestContext,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let mut service = LoanService::with_defaults(Arc::new(InMemoryLoanStore::new()))?;
    let customer = RequestContext::new(Actor::customer(["ACC-001"]));
    let employee = RequestContext::new(Actor::employee());

    // 1. request
    println!("1. request");
    let request = LoanRequest::new("ACC-001", Money::from_major(50_000), 24, Rate::from_percentage(18));
    let loan = service.create_loan(&customer, &request, &time)?;
    println!("  loan {} is {}", loan.id, loan.status);
    println!("  {} per month, {} in total", loan.monthly_payment, loan.total_payback);

    // 2. customers cannot decide on their own loans
    println!("\n2. self-approval");
    match service.approve(&customer, &loan.id, &time) {
        Ok(_) => println!("  error: customer approved a loan!"),
        Err(e) => println!("  refused: {}", e),
    }

    // 3. employee approval
    println!("\n3. approval");
    controller.advance(Duration::days(2));
    let approved = service.approve(&employee, &loan.id, &time)?;
    println!("  {} on {}", approved.status, approved.status_changed_at.format("%Y-%m-%d"));

    // 4. an approved loan can no longer be rejected
    println!("\n4. late rejection");
    if let Err(e) = service.reject(&employee, &loan.id, &time) {
        println!("  refused: {}", e);
    }

    // 5. annulment
    println!("\n5. annulment");
    controller.advance(Duration::days(10));
    let annulled = service.annul(&employee, &loan.id, &time)?;
    println!("  {} (figures kept: {} per month)", annulled.status, annulled.monthly_payment);

    // 6. history
    println!("\n6. events");
    for event in service.take_events() {
        println!("  loan {}: {:?}", event.loan_id(), event);
    }

    let loans = service.list_loans(&customer, &LoanFilter::all())?;
    println!("\ncustomer sees {} loan(s)", loans.len());

    Ok(())
}
