use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::CalcError;
use crate::types::{Money, Rate};
use crate::CalcResult;

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
///
/// Growth past the 96-bit mantissa is a `DomainViolation` rather than a panic.
pub fn compound_factor(rate: Rate, periods: u32) -> CalcResult<Decimal> {
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for period in 0..periods {
        result = result.checked_mul(factor).ok_or_else(|| {
            CalcError::DomainViolation(format!(
                "(1 + {rate})^{periods} exceeds the decimal range at period {}",
                period + 1
            ))
        })?;
    }
    Ok(result)
}

/// Compute 1 / (1 + r)^n by compounding the one-period discount.
///
/// For positive rates this shrinks towards zero instead of overflowing, so
/// long, high-rate horizons stay representable.
pub fn discount_factor(rate: Rate, periods: u32) -> CalcResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(CalcError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }
    let one_period = Decimal::ONE / (Decimal::ONE + rate);
    let mut result = Decimal::ONE;
    for period in 0..periods {
        result = result.checked_mul(one_period).ok_or_else(|| {
            CalcError::DomainViolation(format!(
                "discount factor at {rate} exceeds the decimal range at period {}",
                period + 1
            ))
        })?;
    }
    Ok(result)
}

/// Interest accrued on a balance over one period at a periodic rate.
/// `None` when the product leaves the decimal range.
pub fn accrue(balance: Money, rate: Rate) -> Option<Money> {
    balance.checked_mul(rate)
}

/// Present value of a single amount received `periods` periods from now.
pub fn present_value(amount: Money, rate: Rate, periods: u32) -> CalcResult<Money> {
    let factor = discount_factor(rate, periods)?;
    amount.checked_mul(factor).ok_or_else(|| {
        CalcError::DomainViolation(format!(
            "present value of {amount} over {periods} periods exceeds the decimal range"
        ))
    })
}

/// Sum of cash flows discounted at `rate`, where `cash_flows[i]` falls at
/// the end of period `i + 1`. Flows far out at high rates fade to zero;
/// deeply negative rates that blow a value past the decimal range are a
/// `DomainViolation`.
pub fn discounted_sum(rate: Rate, cash_flows: &[Money]) -> CalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(CalcError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let one_period = Decimal::ONE / (Decimal::ONE + rate);
    let mut discount = Decimal::ONE;
    let mut result = Decimal::ZERO;

    let out_of_range = |period: usize| {
        CalcError::DomainViolation(format!(
            "discounted value at {rate} per period exceeds the decimal range at period {period}"
        ))
    };

    for (i, cf) in cash_flows.iter().enumerate() {
        discount = discount
            .checked_mul(one_period)
            .ok_or_else(|| out_of_range(i + 1))?;
        let pv = cf.checked_mul(discount).ok_or_else(|| out_of_range(i + 1))?;
        result = result.checked_add(pv).ok_or_else(|| out_of_range(i + 1))?;
    }

    Ok(result)
}

/// Level payment that amortizes `principal` over `periods` end-of-period
/// payments: P * r / (1 - (1+r)^-n), equivalent to P * r * (1+r)^n / ((1+r)^n - 1).
pub fn annuity_payment(principal: Money, rate: Rate, periods: u32) -> CalcResult<Money> {
    if periods == 0 {
        return Err(CalcError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let denominator = Decimal::ONE - discount_factor(rate, periods)?;

    if denominator.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "annuity payment factor".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|interest| interest.checked_div(denominator))
        .ok_or_else(|| {
            CalcError::DomainViolation(format!(
                "annuity payment on {principal} at {rate} exceeds the decimal range"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_factor_zero_periods() {
        assert_eq!(compound_factor(dec!(0.05), 0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_compound_factor_overflow_is_domain_violation() {
        // 2^100 is past the 96-bit mantissa
        assert!(matches!(
            compound_factor(Decimal::ONE, 100),
            Err(CalcError::DomainViolation(_))
        ));
    }

    #[test]
    fn test_discount_factor_matches_compound_factor() {
        let v = discount_factor(dec!(0.05), 10).unwrap();
        let f = compound_factor(dec!(0.05), 10).unwrap();
        assert!((v * f - Decimal::ONE).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_discount_factor_high_rate_long_horizon() {
        // 25% per period for 360 periods: (1.25)^360 overflows, its inverse is ~0
        let v = discount_factor(dec!(0.25), 360).unwrap();
        assert!(v < dec!(0.0000000001));
    }

    #[test]
    fn test_discounted_sum_deep_negative_rate_errors() {
        // -75% per period: 1 / 0.25^60 leaves the decimal range
        let flows = vec![dec!(25); 60];
        assert!(matches!(
            discounted_sum(dec!(-0.75), &flows),
            Err(CalcError::DomainViolation(_))
        ));
    }

    #[test]
    fn test_present_value_basic() {
        // 1000 in 10 years at 5%: 1000 / 1.05^10 ≈ 613.91
        let pv = present_value(dec!(1000), dec!(0.05), 10).unwrap();
        assert!((pv - dec!(613.91)).abs() < dec!(0.01));
    }

    #[test]
    fn test_discounted_sum_zero_rate() {
        let cfs = vec![dec!(50), dec!(50), dec!(1050)];
        assert_eq!(discounted_sum(Decimal::ZERO, &cfs).unwrap(), dec!(1150));
    }

    #[test]
    fn test_discounted_sum_rejects_minus_100_pct() {
        assert!(discounted_sum(dec!(-1), &[dec!(100)]).is_err());
    }

    #[test]
    fn test_annuity_payment_mortgage() {
        // 200k at 0.5% monthly for 360 months ≈ 1199.10
        let pmt = annuity_payment(dec!(200000), dec!(0.005), 360).unwrap();
        assert!((pmt - dec!(1199.10)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        let pmt = annuity_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_annuity_payment_zero_periods() {
        assert!(annuity_payment(dec!(1000), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_annuity_payment_high_rate_approaches_interest_only() {
        let pmt = annuity_payment(dec!(1000), dec!(0.25), 360).unwrap();
        assert!((pmt - dec!(250)).abs() < dec!(0.000001), "got {pmt}");
    }
}
