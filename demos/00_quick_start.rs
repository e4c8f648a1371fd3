/// quick start - preview the figures of a loan
use loan_lifecycle_rs::{compute_schedule, Money, Rate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 120,000 over 12 months at 10% a year
    let summary = compute_schedule(Money::from_major(120_000), 12, Rate::from_percentage(10))?;

    println!("monthly payment: {}", summary.monthly_payment);
    println!("total payback:   {}", summary.total_payback);
    println!("total interest:  {}", summary.total_interest(Money::from_major(120_000)));

    Ok(())
}
