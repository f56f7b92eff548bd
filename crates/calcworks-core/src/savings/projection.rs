use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::time_value::discount_factor;
use crate::types::{periodic_rate, with_metadata, ComputationOutput, Money, Percent};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// When each periodic contribution lands relative to that period's growth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionTiming {
    /// Deposit after the period's interest is credited (ordinary annuity).
    #[default]
    End,
    /// Deposit before the period's interest is credited (annuity due).
    Beginning,
}

fn default_periods_per_year() -> u32 {
    12
}

/// Input parameters for a savings / compound interest projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub starting_balance: Money,
    pub periodic_contribution: Money,
    pub annual_rate_percent: Percent,
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    pub years: u32,
    /// Only used to report real (today's money) balances
    #[serde(default)]
    pub inflation_rate_percent: Percent,
    #[serde(default)]
    pub contribution_timing: ContributionTiming,
}

/// Balance snapshot at the end of a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub year: u32,
    pub balance: Money,
    /// Starting balance plus every contribution made so far
    pub contributions_to_date: Money,
    pub earnings_to_date: Money,
    pub real_balance: Money,
}

/// Output of `compute_projection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub points: Vec<ProjectionPoint>,
    pub final_balance: Money,
    pub total_contributions: Money,
    pub total_earnings: Money,
    pub final_real_balance: Money,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Project a balance forward period by period, sampling one point per year.
pub fn compute_projection(
    input: &ProjectionInput,
) -> CalcResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let rate = periodic_rate(input.annual_rate_percent, input.periods_per_year);
    let inflation = input.inflation_rate_percent / dec!(100);

    let mut balance = input.starting_balance;
    let mut contributions = input.starting_balance;
    let mut points = Vec::with_capacity(input.years as usize + 1);

    points.push(ProjectionPoint {
        year: 0,
        balance,
        contributions_to_date: contributions,
        earnings_to_date: Decimal::ZERO,
        real_balance: balance,
    });

    let growth = Decimal::ONE + rate;
    let out_of_range = |year: u32| {
        CalcError::DomainViolation(format!(
            "projected balance exceeds the decimal range in year {year}"
        ))
    };

    for year in 1..=input.years {
        for _ in 0..input.periods_per_year {
            let next = match input.contribution_timing {
                ContributionTiming::End => balance
                    .checked_mul(growth)
                    .and_then(|b| b.checked_add(input.periodic_contribution)),
                ContributionTiming::Beginning => balance
                    .checked_add(input.periodic_contribution)
                    .and_then(|b| b.checked_mul(growth)),
            };
            balance = next.ok_or_else(|| out_of_range(year))?;
            contributions = contributions
                .checked_add(input.periodic_contribution)
                .ok_or_else(|| out_of_range(year))?;
        }

        points.push(ProjectionPoint {
            year,
            balance,
            contributions_to_date: contributions,
            earnings_to_date: balance - contributions,
            real_balance: balance
                .checked_mul(discount_factor(inflation, year)?)
                .ok_or_else(|| out_of_range(year))?,
        });
    }

    if balance < contributions {
        warnings.push("Projected balance is below total contributions (negative growth)".into());
    }

    // year 0 is always present
    let last = points[points.len() - 1].clone();

    log::debug!(
        "projection: {} years at periodic rate {} -> balance {}",
        input.years,
        rate,
        last.balance
    );

    let output = ProjectionOutput {
        final_balance: last.balance,
        total_contributions: last.contributions_to_date,
        total_earnings: last.earnings_to_date,
        final_real_balance: last.real_balance,
        points,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Periodic compounding with yearly sampling; inflation applied to reporting only",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &ProjectionInput) -> CalcResult<()> {
    if input.starting_balance < Decimal::ZERO {
        return Err(CalcError::invalid(
            "starting_balance",
            "Starting balance cannot be negative",
        ));
    }
    if input.periodic_contribution < Decimal::ZERO {
        return Err(CalcError::invalid(
            "periodic_contribution",
            "Contribution cannot be negative",
        ));
    }
    if input.periods_per_year == 0 {
        return Err(CalcError::invalid(
            "periods_per_year",
            "Compounding periods per year must be at least 1",
        ));
    }
    if input.annual_rate_percent <= dec!(-100) {
        return Err(CalcError::invalid(
            "annual_rate_percent",
            "Rate must be greater than -100%",
        ));
    }
    if input.inflation_rate_percent <= dec!(-100) {
        return Err(CalcError::invalid(
            "inflation_rate_percent",
            "Inflation must be greater than -100%",
        ));
    }
    Ok(())
}
