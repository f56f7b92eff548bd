use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use calcworks_core::loans::{self, LoanTerms};

use crate::input;

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a percentage (6 = 6%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of payment periods
    #[arg(long)]
    pub term: Option<u32>,

    /// Payment periods per year
    #[arg(long, default_value_t = 12)]
    pub periods_per_year: u32,

    /// Extra principal paid every period
    #[arg(long)]
    pub extra_payment: Option<Decimal>,

    /// Lump sum due with the final payment
    #[arg(long)]
    pub balloon: Option<Decimal>,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = match input::read_request(args.input.as_deref())? {
        Some(terms) => terms,
        None => LoanTerms {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_periods: args.term.ok_or("--term is required (or provide --input)")?,
            periods_per_year: args.periods_per_year,
            extra_payment: args.extra_payment.unwrap_or(Decimal::ZERO),
            balloon_payment: args.balloon.unwrap_or(Decimal::ZERO),
        },
    };

    let result = loans::compute_schedule(&terms)?;
    Ok(serde_json::to_value(result)?)
}
