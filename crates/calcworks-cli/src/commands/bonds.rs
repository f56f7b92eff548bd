use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use calcworks_core::bonds::{self, BondSpec, SolverConfig, YieldInput};

use crate::input;

/// Arguments for bond pricing
#[derive(Args)]
pub struct BondPriceArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Face (par) value
    #[arg(long, default_value = "1000")]
    pub face_value: Decimal,

    /// Annual coupon rate as a percentage
    #[arg(long)]
    pub coupon_rate: Option<Decimal>,

    /// Market yield as a percentage
    #[arg(long)]
    pub market_rate: Option<Decimal>,

    /// Years to maturity
    #[arg(long)]
    pub years: Option<u32>,

    /// Coupon payments per year (1, 2, 4 or 12)
    #[arg(long, default_value_t = 2)]
    pub payments_per_year: u32,
}

pub fn run_bond_price(args: BondPriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bond: BondSpec = match input::read_request(args.input.as_deref())? {
        Some(bond) => bond,
        None => BondSpec {
            face_value: args.face_value,
            coupon_rate_percent: args
                .coupon_rate
                .ok_or("--coupon-rate is required (or provide --input)")?,
            market_rate_percent: args
                .market_rate
                .ok_or("--market-rate is required (or provide --input)")?,
            years_to_maturity: args.years.ok_or("--years is required (or provide --input)")?,
            payments_per_year: args.payments_per_year,
        },
    };

    let result = bonds::price_from_yield(&bond)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for yield to maturity
#[derive(Args)]
pub struct BondYieldArgs {
    /// Path to JSON/YAML input file with explicit cash flows
    #[arg(long)]
    pub input: Option<String>,

    /// Observed market price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Face (par) value
    #[arg(long, default_value = "1000")]
    pub face_value: Decimal,

    /// Annual coupon rate as a percentage
    #[arg(long)]
    pub coupon_rate: Option<Decimal>,

    /// Years to maturity
    #[arg(long)]
    pub years: Option<u32>,

    /// Coupon payments per year (1, 2, 4 or 12)
    #[arg(long, default_value_t = 2)]
    pub payments_per_year: u32,

    /// Newton-Raphson iteration cap
    #[arg(long, default_value_t = 100)]
    pub max_iterations: u32,

    /// Return the last estimate instead of failing when the solver does not converge
    #[arg(long)]
    pub accept_estimate: bool,
}

pub fn run_bond_yield(args: BondYieldArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let yield_input: YieldInput = match input::read_request(args.input.as_deref())? {
        Some(input) => input,
        None => {
            let bond = BondSpec {
                face_value: args.face_value,
                coupon_rate_percent: args
                    .coupon_rate
                    .ok_or("--coupon-rate is required (or provide --input)")?,
                market_rate_percent: Decimal::ZERO,
                years_to_maturity: args.years.ok_or("--years is required (or provide --input)")?,
                payments_per_year: args.payments_per_year,
            };
            let price = args.price.ok_or("--price is required (or provide --input)")?;
            YieldInput {
                solver: SolverConfig {
                    max_iterations: args.max_iterations,
                    ..SolverConfig::default()
                },
                accept_estimate: args.accept_estimate,
                ..YieldInput::from_bond(&bond, price)?
            }
        }
    };

    let result = bonds::yield_from_price(&yield_input)?;
    Ok(serde_json::to_value(result)?)
}
