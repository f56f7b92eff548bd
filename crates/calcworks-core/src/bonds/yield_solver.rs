//! Yield to maturity from a target price via Newton-Raphson.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::pricing::{bond_cash_flows, validate_bond, BondCashFlow, BondSpec};
use crate::error::CalcError;
use crate::time_value::compound_factor;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_MAX_ITERATIONS: u32 = 100;
const DEFAULT_TOLERANCE: Decimal = dec!(0.0001);
const MIN_PERIODIC_YIELD: Decimal = dec!(-0.99);
const MAX_PERIODIC_YIELD: Decimal = dec!(10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_tolerance() -> Decimal {
    DEFAULT_TOLERANCE
}

fn default_payments_per_year() -> u32 {
    2
}

/// Iteration cap and price tolerance for the root finder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Stop once |price at guess - target price| falls below this
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Result of a root-finding run. Callers decide whether an unconverged
/// estimate is usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolverOutcome {
    Converged {
        value: Rate,
        iterations: u32,
    },
    NotConverged {
        last_estimate: Rate,
        iterations: u32,
        residual: Decimal,
    },
}

impl SolverOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, SolverOutcome::Converged { .. })
    }

    /// The converged value, or the best estimate reached.
    pub fn estimate(&self) -> Rate {
        match self {
            SolverOutcome::Converged { value, .. } => *value,
            SolverOutcome::NotConverged { last_estimate, .. } => *last_estimate,
        }
    }

    pub fn iterations(&self) -> u32 {
        match self {
            SolverOutcome::Converged { iterations, .. }
            | SolverOutcome::NotConverged { iterations, .. } => *iterations,
        }
    }

    /// Strict view: an unconverged run becomes a `ConvergenceFailure`.
    pub fn into_result(self, function: &str) -> CalcResult<Rate> {
        match self {
            SolverOutcome::Converged { value, .. } => Ok(value),
            SolverOutcome::NotConverged {
                last_estimate,
                iterations,
                residual,
            } => Err(CalcError::ConvergenceFailure {
                function: function.into(),
                iterations,
                last_estimate,
                residual,
            }),
        }
    }
}

/// Input for solving the yield implied by a price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldInput {
    /// Cash flows by period index; only `period` and `amount` are read
    pub cash_flows: Vec<BondCashFlow>,
    pub target_price: Money,
    pub face_value: Money,
    #[serde(default = "default_payments_per_year")]
    pub payments_per_year: u32,
    /// Starting guess as an annual percentage; defaults to the coupon rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_guess_percent: Option<Percent>,
    #[serde(default)]
    pub solver: SolverConfig,
    /// Return the last guess with a warning instead of failing
    #[serde(default)]
    pub accept_estimate: bool,
}

impl YieldInput {
    /// Build a yield problem from bond terms and an observed market price.
    pub fn from_bond(bond: &BondSpec, target_price: Money) -> CalcResult<Self> {
        validate_bond(bond)?;
        Ok(Self {
            cash_flows: bond_cash_flows(bond),
            target_price,
            face_value: bond.face_value,
            payments_per_year: bond.payments_per_year,
            initial_guess_percent: Some(bond.coupon_rate_percent),
            solver: SolverConfig::default(),
            accept_estimate: false,
        })
    }
}

/// Output of `yield_from_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldOutput {
    /// Annualised nominal yield (periodic yield x payments per year), percent
    pub yield_percent: Percent,
    pub periodic_yield: Rate,
    /// (1 + periodic)^freq - 1, percent
    pub effective_annual_yield_percent: Percent,
    pub outcome: SolverOutcome,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve the yield that discounts `cash_flows` to `target_price`.
pub fn yield_from_price(input: &YieldInput) -> CalcResult<ComputationOutput<YieldOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let freq = Decimal::from(input.payments_per_year);
    let guess = match input.initial_guess_percent {
        Some(pct) => pct / dec!(100) / freq,
        None => implied_coupon_rate(&input.cash_flows, input.face_value),
    };

    let flows: Vec<(u32, Money)> = input
        .cash_flows
        .iter()
        .map(|cf| (cf.period, cf.amount))
        .collect();

    let outcome = solve_periodic_yield(&flows, input.target_price, guess, &input.solver);

    if let SolverOutcome::NotConverged {
        last_estimate,
        iterations,
        residual,
    } = &outcome
    {
        if !input.accept_estimate {
            return Err(CalcError::ConvergenceFailure {
                function: "yield_from_price".into(),
                iterations: *iterations,
                last_estimate: *last_estimate * freq * dec!(100),
                residual: *residual,
            });
        }
        warnings.push(format!(
            "Yield solver did not converge after {iterations} iterations; returning best estimate (price residual {residual})"
        ));
    }

    let periodic_yield = outcome.estimate();
    let output = YieldOutput {
        yield_percent: periodic_yield * freq * dec!(100),
        periodic_yield,
        effective_annual_yield_percent: (compound_factor(periodic_yield, input.payments_per_year)?
            - Decimal::ONE)
            * dec!(100),
        outcome,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "method": "Newton-Raphson",
        "max_iterations": input.solver.max_iterations,
        "tolerance": input.solver.tolerance.to_string(),
        "initial_guess_periodic": guess.to_string(),
        "target_price": input.target_price.to_string(),
    });

    Ok(with_metadata(
        "Yield to maturity via Newton-Raphson on periodic yield",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Newton-Raphson on the periodic yield `g` for Σ cf / (1+g)^t = target.
pub fn solve_periodic_yield(
    flows: &[(u32, Money)],
    target: Money,
    guess: Rate,
    config: &SolverConfig,
) -> SolverOutcome {
    let mut g = guess.clamp(MIN_PERIODIC_YIELD, MAX_PERIODIC_YIELD);

    for iteration in 1..=config.max_iterations {
        let Some((price, slope)) = price_and_slope(flows, g) else {
            log::warn!("yield solver: discounted price out of range at guess {g}");
            return SolverOutcome::NotConverged {
                last_estimate: g,
                iterations: iteration,
                residual: Decimal::MAX,
            };
        };

        let residual = price - target;
        log::trace!("yield solver iteration {iteration}: guess {g}, residual {residual}");

        if residual.abs() < config.tolerance {
            log::debug!("yield solver converged in {iteration} iterations at {g}");
            return SolverOutcome::Converged {
                value: g,
                iterations: iteration,
            };
        }

        if slope.is_zero() {
            log::warn!("yield solver: zero derivative at guess {g}");
            return SolverOutcome::NotConverged {
                last_estimate: g,
                iterations: iteration,
                residual,
            };
        }

        let next = residual.checked_div(slope).and_then(|step| g.checked_sub(step));
        g = match next {
            Some(next) => next.clamp(MIN_PERIODIC_YIELD, MAX_PERIODIC_YIELD),
            // step too large to represent: jump to the bound it points at
            None if residual.is_sign_negative() == slope.is_sign_negative() => MIN_PERIODIC_YIELD,
            None => MAX_PERIODIC_YIELD,
        };
    }

    let residual = price_and_slope(flows, g)
        .map(|(price, _)| price - target)
        .unwrap_or(Decimal::MAX);
    log::warn!(
        "yield solver hit {} iterations without converging (residual {residual})",
        config.max_iterations
    );

    SolverOutcome::NotConverged {
        last_estimate: g,
        iterations: config.max_iterations,
        residual,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_input(input: &YieldInput) -> CalcResult<()> {
    if input.cash_flows.is_empty() {
        return Err(CalcError::invalid("cash_flows", "At least one cash flow is required"));
    }
    if input.cash_flows.iter().any(|cf| cf.period == 0) {
        return Err(CalcError::invalid("cash_flows", "Cash flow periods start at 1"));
    }
    if input.target_price <= Decimal::ZERO {
        return Err(CalcError::invalid("target_price", "Target price must be positive"));
    }
    if input.face_value <= Decimal::ZERO {
        return Err(CalcError::invalid("face_value", "Face value must be positive"));
    }
    if input.payments_per_year == 0 {
        return Err(CalcError::invalid(
            "payments_per_year",
            "Payments per year must be at least 1",
        ));
    }
    if input.solver.max_iterations == 0 {
        return Err(CalcError::invalid(
            "solver.max_iterations",
            "At least one iteration is required",
        ));
    }
    if input.solver.tolerance <= Decimal::ZERO {
        return Err(CalcError::invalid("solver.tolerance", "Tolerance must be positive"));
    }
    Ok(())
}

/// Periodic coupon rate implied by the cash flows: the first coupon over face,
/// or for a single flow whatever exceeds face value.
fn implied_coupon_rate(cash_flows: &[BondCashFlow], face_value: Money) -> Rate {
    let coupon = match cash_flows {
        [only] => only.amount - face_value,
        [first, ..] => first.amount,
        [] => Decimal::ZERO,
    };
    (coupon / face_value).max(Decimal::ZERO)
}

/// Price at `g` and its derivative dP/dg.
///
/// `None` when a discount factor underflows to zero or a discounted value
/// leaves the decimal range (deeply negative `g`).
fn price_and_slope(flows: &[(u32, Money)], g: Rate) -> Option<(Money, Decimal)> {
    let one_plus_g = Decimal::ONE + g;
    let mut price = Decimal::ZERO;
    let mut slope = Decimal::ZERO;

    for &(t, cf) in flows {
        let Some(discount) = checked_compound(one_plus_g, t) else {
            // (1+g)^t > 7.9e28, so this flow adds less than cf * 1.3e-29
            log::trace!("yield solver: dropping period {t} flow, discount overflows at {g}");
            continue;
        };
        if discount.is_zero() {
            return None;
        }
        price = price.checked_add(cf.checked_div(discount)?)?;
        if let Some(d) = discount.checked_mul(one_plus_g) {
            let weighted = Decimal::from(t).checked_mul(cf)?.checked_div(d)?;
            slope = slope.checked_sub(weighted)?;
        }
    }

    Some((price, slope))
}

fn checked_compound(base: Decimal, periods: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..periods {
        result = result.checked_mul(base)?;
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonds::pricing::price_from_yield;

    fn ten_year_semi(coupon: Decimal, market: Decimal) -> BondSpec {
        BondSpec {
            face_value: dec!(1000),
            coupon_rate_percent: coupon,
            market_rate_percent: market,
            years_to_maturity: 10,
            payments_per_year: 2,
        }
    }

    #[test]
    fn test_par_bond_round_trip() {
        let bond = ten_year_semi(dec!(5), dec!(5));
        let price = price_from_yield(&bond).unwrap().result.price;
        let input = YieldInput::from_bond(&bond, price).unwrap();
        let out = yield_from_price(&input).unwrap().result;

        assert!(out.outcome.is_converged());
        assert!(
            (out.yield_percent - dec!(5)).abs() < dec!(0.01),
            "expected ~5%, got {}",
            out.yield_percent
        );
    }

    #[test]
    fn test_discount_bond_round_trip() {
        let bond = ten_year_semi(dec!(4), dec!(7.25));
        let price = price_from_yield(&bond).unwrap().result.price;
        let input = YieldInput::from_bond(&bond, price).unwrap();
        let out = yield_from_price(&input).unwrap().result;
        assert!((out.yield_percent - dec!(7.25)).abs() < dec!(0.01));
    }

    #[test]
    fn test_premium_bond_yield_below_coupon() {
        let bond = ten_year_semi(dec!(8), dec!(8));
        let input = YieldInput::from_bond(&bond, dec!(1100)).unwrap();
        let out = yield_from_price(&input).unwrap().result;
        assert!(out.yield_percent < dec!(8));
        assert!(out.effective_annual_yield_percent > out.yield_percent);
    }

    #[test]
    fn test_default_guess_from_cash_flows() {
        let bond = ten_year_semi(dec!(6), dec!(6));
        let input = YieldInput {
            initial_guess_percent: None,
            ..YieldInput::from_bond(&bond, dec!(950)).unwrap()
        };
        let out = yield_from_price(&input).unwrap();
        assert_eq!(out.assumptions["initial_guess_periodic"], "0.03");
        assert!(out.result.yield_percent > dec!(6));
    }

    #[test]
    fn test_iteration_cap_is_an_error_by_default() {
        let bond = ten_year_semi(dec!(5), dec!(5));
        let mut input = YieldInput::from_bond(&bond, dec!(700)).unwrap();
        input.solver.max_iterations = 1;

        match yield_from_price(&input) {
            Err(CalcError::ConvergenceFailure { iterations, .. }) => assert_eq!(iterations, 1),
            other => panic!("expected ConvergenceFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_iteration_cap_with_accept_estimate() {
        let bond = ten_year_semi(dec!(5), dec!(5));
        let mut input = YieldInput::from_bond(&bond, dec!(700)).unwrap();
        input.solver.max_iterations = 1;
        input.accept_estimate = true;

        let out = yield_from_price(&input).unwrap();
        assert!(!out.result.outcome.is_converged());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.result.yield_percent > dec!(5));
    }

    #[test]
    fn test_far_off_target_price_does_not_panic() {
        // 50x face on a 30y bond drives the first Newton step to the lower clamp,
        // where (1 - 0.99)^t underflows
        let bond = BondSpec {
            years_to_maturity: 30,
            ..ten_year_semi(dec!(5), dec!(5))
        };
        let strict = YieldInput::from_bond(&bond, dec!(50000)).unwrap();
        match yield_from_price(&strict) {
            Ok(out) => assert!(out.result.yield_percent < Decimal::ZERO),
            Err(CalcError::ConvergenceFailure { function, .. }) => {
                assert_eq!(function, "yield_from_price")
            }
            Err(other) => panic!("expected ConvergenceFailure, got {other:?}"),
        }

        let lenient = YieldInput {
            accept_estimate: true,
            ..strict
        };
        let out = yield_from_price(&lenient).unwrap();
        if out.result.outcome.is_converged() {
            assert!(out.result.yield_percent < Decimal::ZERO);
        } else {
            assert_eq!(out.warnings.len(), 1);
        }
    }

    #[test]
    fn test_high_yield_drops_negligible_flows() {
        // at 1000% per period, (1+g)^t overflows long before period 360
        let flows: Vec<(u32, Money)> = (1..=360).map(|t| (t, dec!(10))).collect();
        let (price, slope) = price_and_slope(&flows, dec!(10)).unwrap();
        // geometric series 10 / 11 + 10 / 121 + ... = 1
        assert!((price - Decimal::ONE).abs() < dec!(0.0000001), "price {price}");
        assert!(slope < Decimal::ZERO);
    }

    #[test]
    fn test_outcome_into_result() {
        let ok = SolverOutcome::Converged {
            value: dec!(0.025),
            iterations: 3,
        };
        assert_eq!(ok.into_result("test").unwrap(), dec!(0.025));

        let failed = SolverOutcome::NotConverged {
            last_estimate: dec!(0.1),
            iterations: 100,
            residual: dec!(3),
        };
        assert_eq!(failed.estimate(), dec!(0.1));
        assert_eq!(failed.iterations(), 100);
        assert!(failed.into_result("test").is_err());
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let outcome = SolverOutcome::Converged {
            value: dec!(0.025),
            iterations: 4,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "converged");
        assert_eq!(json["iterations"], 4);
    }

    #[test]
    fn test_empty_cash_flows_error() {
        let input = YieldInput {
            cash_flows: vec![],
            target_price: dec!(1000),
            face_value: dec!(1000),
            payments_per_year: 2,
            initial_guess_percent: None,
            solver: SolverConfig::default(),
            accept_estimate: false,
        };
        assert!(matches!(
            yield_from_price(&input),
            Err(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_solver_config_defaults_from_json() {
        let cfg: SolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.max_iterations, 100);
        assert_eq!(cfg.tolerance, dec!(0.0001));
    }
}
