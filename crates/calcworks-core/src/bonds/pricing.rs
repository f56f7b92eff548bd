//! Bond pricing from a market yield.
//!
//! Prices a level-coupon bond as the sum of its discounted cash flows and
//! derives Macaulay / modified duration, convexity and current yield.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::time_value::discounted_sum;
use crate::types::{periodic_rate, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_payments_per_year() -> u32 {
    2
}

/// Bond terms as entered on a bond calculator form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondSpec {
    /// Par / face value (typically 1000)
    pub face_value: Money,
    /// Annual coupon rate as a percentage (5 = 5%)
    pub coupon_rate_percent: Percent,
    /// Market yield used for discounting, as a percentage
    pub market_rate_percent: Percent,
    pub years_to_maturity: u32,
    /// Coupons per year: 1 = annual, 2 = semi-annual, 4 = quarterly, 12 = monthly
    #[serde(default = "default_payments_per_year")]
    pub payments_per_year: u32,
}

/// A single bond cash flow. The last one carries the face value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondCashFlow {
    pub period: u32,
    #[serde(default)]
    pub time_in_years: Decimal,
    pub amount: Money,
    #[serde(default)]
    pub present_value: Money,
}

/// Where the price sits relative to face value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceClassification {
    Premium,
    Par,
    Discount,
}

/// Output of `price_from_yield`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondValuation {
    pub price: Money,
    pub coupon_payment: Money,
    pub rate_per_period: Rate,
    pub number_of_payments: u32,
    pub cash_flows: Vec<BondCashFlow>,
    /// Years
    pub macaulay_duration: Decimal,
    /// Years
    pub modified_duration: Decimal,
    /// Years squared
    pub convexity: Decimal,
    pub current_yield_percent: Percent,
    pub classification: PriceClassification,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price a bond at its market rate and compute duration, convexity and current yield.
pub fn price_from_yield(bond: &BondSpec) -> CalcResult<ComputationOutput<BondValuation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_bond(bond)?;

    let freq = Decimal::from(bond.payments_per_year);
    let coupon_payment = coupon_payment(bond);
    let rate = periodic_rate(bond.market_rate_percent, bond.payments_per_year);
    let mut cash_flows = bond_cash_flows(bond);
    let n = cash_flows.len() as u32;

    // --- Price ---
    let amounts: Vec<Money> = cash_flows.iter().map(|cf| cf.amount).collect();
    let price = discounted_sum(rate, &amounts)?;

    if price <= Decimal::ZERO {
        return Err(CalcError::DivisionByZero {
            context: "bond price used for duration and current yield".into(),
        });
    }

    // --- Present values, duration and convexity ---
    let one_plus_r = Decimal::ONE + rate;
    let one_period = Decimal::ONE / one_plus_r;
    let mut discount = Decimal::ONE;
    let mut weighted_time = Decimal::ZERO;
    let mut convexity_sum = Decimal::ZERO;

    for cf in cash_flows.iter_mut() {
        let t = Decimal::from(cf.period);
        let step = discount.checked_mul(one_period).and_then(|d| {
            discount = d;
            let pv = cf.amount.checked_mul(d)?;
            let time_weighted = weighted_time.checked_add(cf.time_in_years.checked_mul(pv)?)?;
            let curvature = (t * (t + Decimal::ONE))
                .checked_mul(pv)?
                .checked_mul(one_period)?
                .checked_mul(one_period)?;
            Some((pv, time_weighted, convexity_sum.checked_add(curvature)?))
        });
        let Some((pv, time_weighted, convexity)) = step else {
            return Err(CalcError::DomainViolation(format!(
                "bond present values at {rate} per period exceed the decimal range at period {}",
                cf.period
            )));
        };
        cf.present_value = pv;
        weighted_time = time_weighted;
        convexity_sum = convexity;
    }

    let macaulay_duration = weighted_time / price;
    let modified_duration = macaulay_duration / one_plus_r;
    let convexity = convexity_sum / (price * freq * freq);

    let current_yield_percent = coupon_payment * freq / price * dec!(100);

    let classification = classify(price, bond.face_value);
    if bond.coupon_rate_percent.is_zero() {
        warnings.push("Zero-coupon bond: current yield is zero".into());
    }

    log::debug!(
        "bond price {} ({} payments at {} per period), macaulay {}",
        price,
        n,
        rate,
        macaulay_duration
    );

    let output = BondValuation {
        price,
        coupon_payment,
        rate_per_period: rate,
        number_of_payments: n,
        cash_flows,
        macaulay_duration,
        modified_duration,
        convexity,
        current_yield_percent,
        classification,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Bond price as PV of coupons and face value; Macaulay/modified duration",
        bond,
        warnings,
        elapsed,
        output,
    ))
}

/// Build the undiscounted cash flow schedule for a bond.
pub fn bond_cash_flows(bond: &BondSpec) -> Vec<BondCashFlow> {
    let n = bond.years_to_maturity * bond.payments_per_year;
    let freq = Decimal::from(bond.payments_per_year);
    let coupon = coupon_payment(bond);

    (1..=n)
        .map(|period| BondCashFlow {
            period,
            time_in_years: Decimal::from(period) / freq,
            amount: if period == n {
                coupon + bond.face_value
            } else {
                coupon
            },
            present_value: Decimal::ZERO,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn validate_bond(bond: &BondSpec) -> CalcResult<()> {
    if bond.face_value <= Decimal::ZERO {
        return Err(CalcError::invalid("face_value", "Face value must be positive"));
    }
    if bond.coupon_rate_percent < Decimal::ZERO {
        return Err(CalcError::invalid(
            "coupon_rate_percent",
            "Coupon rate cannot be negative",
        ));
    }
    if !matches!(bond.payments_per_year, 1 | 2 | 4 | 12) {
        return Err(CalcError::invalid(
            "payments_per_year",
            "Payment frequency must be 1, 2, 4, or 12",
        ));
    }
    if bond.years_to_maturity == 0 {
        return Err(CalcError::invalid(
            "years_to_maturity",
            "Years to maturity must be at least 1",
        ));
    }
    if periodic_rate(bond.market_rate_percent, bond.payments_per_year) <= dec!(-1) {
        return Err(CalcError::invalid(
            "market_rate_percent",
            "Market rate per period must be greater than -100%",
        ));
    }
    Ok(())
}

fn coupon_payment(bond: &BondSpec) -> Money {
    bond.face_value * bond.coupon_rate_percent / dec!(100) / Decimal::from(bond.payments_per_year)
}

fn classify(price: Money, face_value: Money) -> PriceClassification {
    let diff = price - face_value;
    if diff.abs() < dec!(0.005) {
        PriceClassification::Par
    } else if diff > Decimal::ZERO {
        PriceClassification::Premium
    } else {
        PriceClassification::Discount
    }
}
