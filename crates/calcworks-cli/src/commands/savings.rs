use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use calcworks_core::savings::{self, ContributionTiming, ProjectionInput};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TimingArg {
    End,
    Beginning,
}

impl From<TimingArg> for ContributionTiming {
    fn from(t: TimingArg) -> Self {
        match t {
            TimingArg::End => ContributionTiming::End,
            TimingArg::Beginning => ContributionTiming::Beginning,
        }
    }
}

/// Arguments for a savings projection
#[derive(Args)]
pub struct ProjectionArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Balance at the start of the projection
    #[arg(long, default_value = "0")]
    pub starting_balance: Decimal,

    /// Amount deposited every period
    #[arg(long, default_value = "0")]
    pub contribution: Decimal,

    /// Annual growth rate as a percentage
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Years to project
    #[arg(long)]
    pub years: Option<u32>,

    /// Compounding periods per year
    #[arg(long, default_value_t = 12)]
    pub periods_per_year: u32,

    /// Annual inflation percentage used for real balances
    #[arg(long, default_value = "0")]
    pub inflation: Decimal,

    /// Whether deposits land at the start or end of each period
    #[arg(long, value_enum, default_value = "end")]
    pub timing: TimingArg,
}

pub fn run_projection(args: ProjectionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let projection_input: ProjectionInput = match input::read_request(args.input.as_deref())? {
        Some(input) => input,
        None => ProjectionInput {
            starting_balance: args.starting_balance,
            periodic_contribution: args.contribution,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            periods_per_year: args.periods_per_year,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            inflation_rate_percent: args.inflation,
            contribution_timing: args.timing.into(),
        },
    };

    let result = savings::compute_projection(&projection_input)?;
    Ok(serde_json::to_value(result)?)
}
