//! Tagged dispatch over the calculator engines.
//!
//! Front ends deserialize a `Calculation` from JSON such as
//! `{"calculator": "amortization", "principal": "200000", ...}` and call
//! [`Calculation::run`] instead of switching on strings themselves.

use serde::{Deserialize, Serialize};

use crate::CalcResult;

#[cfg(feature = "bonds")]
use crate::bonds::{price_from_yield, yield_from_price, BondSpec, YieldInput};
#[cfg(feature = "combinatorics")]
use crate::combinatorics::{count_arrangements, CountingInput};
#[cfg(feature = "debt")]
use crate::debt::{compare_strategies, simulate_payoff, PayoffInput};
#[cfg(feature = "loans")]
use crate::loans::{compute_schedule, LoanTerms};
#[cfg(feature = "savings")]
use crate::savings::{compute_projection, ProjectionInput};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "calculator", rename_all = "snake_case")]
pub enum Calculation {
    #[cfg(feature = "loans")]
    Amortization(LoanTerms),
    #[cfg(feature = "savings")]
    Projection(ProjectionInput),
    #[cfg(feature = "bonds")]
    BondPrice(BondSpec),
    #[cfg(feature = "bonds")]
    BondYield(YieldInput),
    #[cfg(feature = "debt")]
    DebtPayoff(PayoffInput),
    #[cfg(feature = "debt")]
    StrategyComparison(PayoffInput),
    #[cfg(feature = "combinatorics")]
    Counting(CountingInput),
}

impl Calculation {
    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "loans")]
            Calculation::Amortization(_) => "amortization",
            #[cfg(feature = "savings")]
            Calculation::Projection(_) => "projection",
            #[cfg(feature = "bonds")]
            Calculation::BondPrice(_) => "bond_price",
            #[cfg(feature = "bonds")]
            Calculation::BondYield(_) => "bond_yield",
            #[cfg(feature = "debt")]
            Calculation::DebtPayoff(_) => "debt_payoff",
            #[cfg(feature = "debt")]
            Calculation::StrategyComparison(_) => "strategy_comparison",
            #[cfg(feature = "combinatorics")]
            Calculation::Counting(_) => "counting",
        }
    }

    /// Run the selected engine and return its output envelope as JSON.
    pub fn run(&self) -> CalcResult<serde_json::Value> {
        log::debug!("dispatching {} calculation", self.name());
        let value = match self {
            #[cfg(feature = "loans")]
            Calculation::Amortization(terms) => serde_json::to_value(compute_schedule(terms)?)?,
            #[cfg(feature = "savings")]
            Calculation::Projection(input) => serde_json::to_value(compute_projection(input)?)?,
            #[cfg(feature = "bonds")]
            Calculation::BondPrice(bond) => serde_json::to_value(price_from_yield(bond)?)?,
            #[cfg(feature = "bonds")]
            Calculation::BondYield(input) => serde_json::to_value(yield_from_price(input)?)?,
            #[cfg(feature = "debt")]
            Calculation::DebtPayoff(input) => serde_json::to_value(simulate_payoff(input)?)?,
            #[cfg(feature = "debt")]
            Calculation::StrategyComparison(input) => {
                serde_json::to_value(compare_strategies(input)?)?
            }
            #[cfg(feature = "combinatorics")]
            Calculation::Counting(input) => serde_json::to_value(count_arrangements(input)?)?,
        };
        Ok(value)
    }
}

/// Parse a tagged request and run it.
pub fn run_json(request: &str) -> CalcResult<serde_json::Value> {
    let calculation: Calculation = serde_json::from_str(request)?;
    calculation.run()
}

#[cfg(all(test, feature = "loans", feature = "debt"))]
mod tests {
    use super::*;
    use crate::CalcError;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_dispatch_amortization() {
        let out = run_json(
            r#"{"calculator": "amortization", "principal": "12000",
                "annual_rate_percent": "0", "term_periods": 12}"#,
        )
        .unwrap();
        let payment: Decimal = out["result"]["periodic_payment"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(payment, dec!(1000));
        assert_eq!(out["result"]["schedule"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn test_dispatch_keeps_error_variant() {
        let err = run_json(
            r#"{"calculator": "debt_payoff", "monthly_budget": "10", "strategy": "avalanche",
                "accounts": [{"id": "card", "balance": "1000",
                              "annual_rate_percent": "20", "minimum_payment": "50"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CalcError::UnderfundedBudget { .. }));
    }

    #[test]
    fn test_unknown_calculator() {
        assert!(matches!(
            run_json(r#"{"calculator": "mortgage_points"}"#),
            Err(CalcError::SerializationError(_))
        ));
    }

    #[test]
    fn test_name_matches_tag() {
        let calc: Calculation = serde_json::from_str(
            r#"{"calculator": "strategy_comparison", "monthly_budget": "500", "strategy": "snowball",
                "accounts": []}"#,
        )
        .unwrap();
        assert_eq!(calc.name(), "strategy_comparison");
        let json = serde_json::to_value(&calc).unwrap();
        assert_eq!(json["calculator"], "strategy_comparison");
    }
}
