//! Month-by-month debt payoff simulation.
//!
//! Every active account receives its minimum payment; whatever is left of the
//! monthly budget goes to the single account the strategy ranks first.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use super::strategy::{Candidate, PayoffStrategy};
use crate::error::CalcError;
use crate::time_value::accrue;
use crate::types::{periodic_rate, with_metadata, ComputationOutput, Money, Percent};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// 50 years of monthly payments
const DEFAULT_MAX_MONTHS: u32 = 600;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_max_months() -> u32 {
    DEFAULT_MAX_MONTHS
}

/// A debt entered on the payoff calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtAccount {
    pub id: String,
    pub balance: Money,
    pub annual_rate_percent: Percent,
    pub minimum_payment: Money,
}

/// Input parameters for a payoff simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffInput {
    pub accounts: Vec<DebtAccount>,
    /// Total paid towards all debts each month
    pub monthly_budget: Money,
    pub strategy: PayoffStrategy,
    #[serde(default = "default_max_months")]
    pub max_months: u32,
}

/// One account's activity within a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMonth {
    pub id: String,
    pub interest: Money,
    pub payment: Money,
    pub balance: Money,
}

/// One month of the payoff schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffMonth {
    pub month: u32,
    pub accounts: Vec<AccountMonth>,
    /// Account that received the surplus after minimums
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub interest: Money,
    pub paid: Money,
    /// Budget left over once the target was capped at its balance
    pub unallocated: Money,
    pub remaining_debt: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidOffAccount {
    pub id: String,
    pub month: u32,
}

/// Output of `simulate_payoff`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffOutput {
    pub strategy: String,
    pub months: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    pub payoff_order: Vec<PaidOffAccount>,
    pub schedule: Vec<PayoffMonth>,
}

/// Headline numbers for one strategy in a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySummary {
    pub months: u32,
    pub total_interest: Money,
    pub total_paid: Money,
    pub payoff_order: Vec<PaidOffAccount>,
}

/// Output of `compare_strategies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub avalanche: StrategySummary,
    pub snowball: StrategySummary,
    /// Snowball interest minus avalanche interest
    pub interest_saved_by_avalanche: Money,
    /// Snowball months minus avalanche months (may be negative)
    pub months_saved_by_avalanche: i64,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate paying down every account under the chosen strategy.
pub fn simulate_payoff(input: &PayoffInput) -> CalcResult<ComputationOutput<PayoffOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = run_simulation(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Debt waterfall: minimums on every account, surplus to the top-ranked account",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Run the same debts under avalanche and snowball and report the difference.
pub fn compare_strategies(
    input: &PayoffInput,
) -> CalcResult<ComputationOutput<StrategyComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let avalanche = run_simulation(
        &PayoffInput {
            strategy: PayoffStrategy::Avalanche,
            ..input.clone()
        },
        &mut warnings,
    )?;
    let snowball = run_simulation(
        &PayoffInput {
            strategy: PayoffStrategy::Snowball,
            ..input.clone()
        },
        &mut warnings,
    )?;

    let output = StrategyComparison {
        interest_saved_by_avalanche: snowball.total_interest - avalanche.total_interest,
        months_saved_by_avalanche: snowball.months as i64 - avalanche.months as i64,
        avalanche: summarize(avalanche),
        snowball: summarize(snowball),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Debt waterfall comparison: avalanche vs snowball",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

fn run_simulation(input: &PayoffInput, warnings: &mut Vec<String>) -> CalcResult<PayoffOutput> {
    validate_input(input)?;

    let required_minimums = checked_sum(
        input
            .accounts
            .iter()
            .filter(|a| a.balance > Decimal::ZERO)
            .map(|a| a.minimum_payment),
    )
    .ok_or_else(|| CalcError::DomainViolation("minimum payments exceed the decimal range".into()))?;
    if input.monthly_budget < required_minimums {
        return Err(CalcError::UnderfundedBudget {
            budget: input.monthly_budget,
            required_minimums,
        });
    }

    let rates: Vec<Percent> = input
        .accounts
        .iter()
        .map(|a| periodic_rate(a.annual_rate_percent, 12))
        .collect();
    let mut balances: Vec<Money> = input.accounts.iter().map(|a| a.balance).collect();

    let mut schedule: Vec<PayoffMonth> = Vec::new();
    let mut payoff_order: Vec<PaidOffAccount> = Vec::new();
    let mut total_interest = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;

    if balances.iter().all(|b| b.is_zero()) {
        warnings.push("All balances are already zero".into());
    }

    let mut month = 0;
    while balances.iter().any(|b| *b > Decimal::ZERO) {
        if month == input.max_months {
            let remaining = checked_sum(balances.iter().copied()).unwrap_or(Decimal::MAX);
            return Err(runaway(&input.strategy, month, remaining));
        }
        month += 1;

        let was_active: Vec<bool> = balances.iter().map(|b| *b > Decimal::ZERO).collect();
        let mut budget = input.monthly_budget;
        let mut activity: Vec<AccountMonth> = input
            .accounts
            .iter()
            .map(|a| AccountMonth {
                id: a.id.clone(),
                interest: Decimal::ZERO,
                payment: Decimal::ZERO,
                balance: Decimal::ZERO,
            })
            .collect();

        // Interest and minimum payments
        for (i, account) in input.accounts.iter().enumerate() {
            if !was_active[i] {
                continue;
            }
            let Some((interest, accrued)) = accrue(balances[i], rates[i])
                .and_then(|interest| Some((interest, balances[i].checked_add(interest)?)))
            else {
                return Err(runaway(&input.strategy, month, Decimal::MAX));
            };
            balances[i] = accrued;
            let minimum = account.minimum_payment.min(balances[i]);
            balances[i] -= minimum;
            budget -= minimum;

            activity[i].interest = interest;
            activity[i].payment = minimum;
        }

        // Surplus to the top-ranked account still carrying a balance
        let candidates: Vec<Candidate<'_>> = input
            .accounts
            .iter()
            .enumerate()
            .filter(|(i, _)| balances[*i] > Decimal::ZERO)
            .map(|(i, a)| Candidate {
                index: i,
                id: a.id.as_str(),
                balance: balances[i],
                annual_rate_percent: a.annual_rate_percent,
            })
            .collect();

        let target = input.strategy.target(&candidates);
        if let Some(t) = target {
            let extra = budget.min(balances[t.index]);
            balances[t.index] -= extra;
            activity[t.index].payment += extra;
            budget -= extra;
        }

        for (i, a) in activity.iter_mut().enumerate() {
            a.balance = balances[i];
            if was_active[i] && balances[i].is_zero() {
                payoff_order.push(PaidOffAccount {
                    id: a.id.clone(),
                    month,
                });
            }
        }

        let totals = checked_sum(activity.iter().map(|a| a.interest)).and_then(|interest| {
            let paid = checked_sum(activity.iter().map(|a| a.payment))?;
            let remaining = checked_sum(balances.iter().copied())?;
            Some((
                interest,
                paid,
                remaining,
                total_interest.checked_add(interest)?,
                total_paid.checked_add(paid)?,
            ))
        });
        let Some((interest, paid, remaining_debt, interest_so_far, paid_so_far)) = totals else {
            return Err(runaway(&input.strategy, month, Decimal::MAX));
        };
        total_interest = interest_so_far;
        total_paid = paid_so_far;

        schedule.push(PayoffMonth {
            month,
            accounts: activity,
            target: target.map(|t| t.id.to_string()),
            interest,
            paid,
            unallocated: budget,
            remaining_debt,
        });
    }

    log::debug!(
        "debt payoff ({}) cleared in {} months, interest {}",
        input.strategy.name(),
        month,
        total_interest
    );

    Ok(PayoffOutput {
        strategy: input.strategy.name().to_string(),
        months: month,
        total_interest,
        total_paid,
        payoff_order,
        schedule,
    })
}

/// Debt still outstanding when the run gives up; `Decimal::MAX` once balances
/// have left the decimal range.
fn runaway(strategy: &PayoffStrategy, months: u32, remaining: Money) -> CalcError {
    log::warn!(
        "debt payoff ({}) still owes {} after {} months",
        strategy.name(),
        remaining,
        months
    );
    CalcError::ConvergenceFailure {
        function: "simulate_payoff".into(),
        iterations: months,
        last_estimate: remaining,
        residual: remaining,
    }
}

fn checked_sum(values: impl IntoIterator<Item = Money>) -> Option<Money> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

fn validate_input(input: &PayoffInput) -> CalcResult<()> {
    if input.accounts.is_empty() {
        return Err(CalcError::invalid("accounts", "At least one account is required"));
    }
    let mut seen = HashSet::new();
    for account in &input.accounts {
        if !seen.insert(account.id.as_str()) {
            return Err(CalcError::invalid(
                "accounts",
                format!("Duplicate account id '{}'", account.id),
            ));
        }
        if account.balance < Decimal::ZERO {
            return Err(CalcError::invalid(
                "balance",
                format!("Balance of '{}' cannot be negative", account.id),
            ));
        }
        if account.annual_rate_percent < Decimal::ZERO {
            return Err(CalcError::invalid(
                "annual_rate_percent",
                format!("Rate of '{}' cannot be negative", account.id),
            ));
        }
        if account.minimum_payment < Decimal::ZERO {
            return Err(CalcError::invalid(
                "minimum_payment",
                format!("Minimum payment of '{}' cannot be negative", account.id),
            ));
        }
    }
    if input.monthly_budget <= Decimal::ZERO {
        return Err(CalcError::invalid("monthly_budget", "Monthly budget must be positive"));
    }
    if input.max_months == 0 {
        return Err(CalcError::invalid("max_months", "Month cap must be at least 1"));
    }
    if let PayoffStrategy::CustomOrder(order) = &input.strategy {
        if let Some(unknown) = order.iter().find(|id| !seen.contains(id.as_str())) {
            return Err(CalcError::invalid(
                "strategy",
                format!("Custom order names unknown account '{unknown}'"),
            ));
        }
    }
    Ok(())
}

fn summarize(output: PayoffOutput) -> StrategySummary {
    StrategySummary {
        months: output.months,
        total_interest: output.total_interest,
        total_paid: output.total_paid,
        payoff_order: output.payoff_order,
    }
}
