use clap::{Args, ValueEnum};
use serde_json::Value;

use calcworks_core::debt::{self, PayoffInput, PayoffStrategy};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Avalanche,
    Snowball,
}

/// Arguments for a debt payoff simulation
#[derive(Args)]
pub struct DebtPayoffArgs {
    /// Path to JSON/YAML input file with accounts and budget
    #[arg(long)]
    pub input: Option<String>,

    /// Override the strategy named in the input
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Override the month cap named in the input
    #[arg(long)]
    pub max_months: Option<u32>,
}

pub fn run_debt_payoff(args: DebtPayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input = read_payoff(&args)?;
    let result = debt::simulate_payoff(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_debt_compare(args: DebtPayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input = read_payoff(&args)?;
    let result = debt::compare_strategies(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}

fn read_payoff(args: &DebtPayoffArgs) -> Result<PayoffInput, Box<dyn std::error::Error>> {
    let mut payoff_input: PayoffInput = input::read_request(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for debt payoff")?;

    if let Some(strategy) = args.strategy {
        payoff_input.strategy = match strategy {
            StrategyArg::Avalanche => PayoffStrategy::Avalanche,
            StrategyArg::Snowball => PayoffStrategy::Snowball,
        };
    }
    if let Some(max_months) = args.max_months {
        payoff_input.max_months = max_months;
    }
    Ok(payoff_input)
}
