/// schedule - month-by-month repayment plan
use chrono::NaiveDate;
use loan_lifecycle_rs::{AmortizationEngine, AmortizationSchedule, LoanRequest, Money, Rate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let engine = AmortizationEngine::standard();
    let request = LoanRequest::new("ACC-001", Money::from_major(12_000), 12, Rate::from_percentage(24));
    let first_due = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

    let schedule = AmortizationSchedule::generate(&engine, &request, first_due)?;

    println!("{:>3}  {:<10}  {:>10}  {:>9}  {:>9}  {:>10}", "#", "due", "payment", "interest", "principal", "balance");
    for row in &schedule.installments {
        println!(
            "{:>3}  {:<10}  {:>10}  {:>9}  {:>9}  {:>10}",
            row.number,
            row.due_date.to_string(),
            row.payment.to_string(),
            row.interest_portion.to_string(),
            row.principal_portion.to_string(),
            row.closing_balance.to_string()
        );
    }

    println!("\ntotal interest: {}", schedule.total_interest);
    println!("total paid:     {}", schedule.total_paid);

    Ok(())
}
