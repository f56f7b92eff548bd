//! Amortizing loan schedules.
//!
//! Level-payment (ordinary annuity) loans with optional extra principal per
//! period and an optional balloon due with the final payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::time_value::{accrue, annuity_payment, present_value};
use crate::types::{periodic_rate, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_periods_per_year() -> u32 {
    12
}

/// Loan terms as collected from a loan or mortgage calculator form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed
    pub principal: Money,
    /// Nominal annual rate as a percentage (6 = 6%)
    pub annual_rate_percent: Percent,
    /// Number of scheduled payments
    pub term_periods: u32,
    /// Payments per year: 12 = monthly, 26 = bi-weekly, 52 = weekly
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    /// Additional principal paid with every scheduled payment
    #[serde(default)]
    pub extra_payment: Money,
    /// Lump sum due with the final payment
    #[serde(default)]
    pub balloon_payment: Money,
}

/// One period of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentScheduleEntry {
    pub period: u32,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    /// Non-zero only on the final period of a balloon loan
    pub balloon_portion: Money,
    pub remaining_balance: Money,
}

/// Output of `compute_schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    /// Scheduled level payment, excluding extra principal and balloon
    pub periodic_payment: Money,
    pub periodic_rate: Rate,
    pub schedule: Vec<PaymentScheduleEntry>,
    pub total_interest: Money,
    pub total_paid: Money,
    /// Periods actually needed to retire the loan (< term with extra payments)
    pub payoff_periods: u32,
    /// Periods saved versus the same loan without extra payments
    pub periods_saved: u32,
    /// Interest saved versus the same loan without extra payments
    pub interest_saved: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the periodic payment and the full amortization schedule.
pub fn compute_schedule(
    terms: &LoanTerms,
) -> CalcResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_terms(terms)?;

    let rate = periodic_rate(terms.annual_rate_percent, terms.periods_per_year);
    let payment = level_payment(terms, rate)?;

    let schedule = build_schedule(terms, rate, payment, terms.extra_payment)?;
    let total_interest = checked_total(schedule.iter().map(|e| e.interest_portion))?;
    let total_paid = checked_total(schedule.iter().map(|e| e.payment_amount))?;
    let payoff_periods = schedule.len() as u32;

    let (periods_saved, interest_saved) = if terms.extra_payment > Decimal::ZERO {
        let baseline = build_schedule(terms, rate, payment, Decimal::ZERO)?;
        (
            baseline.len() as u32 - payoff_periods,
            checked_total(baseline.iter().map(|e| e.interest_portion))? - total_interest,
        )
    } else {
        (0, Decimal::ZERO)
    };

    if terms.balloon_payment > Decimal::ZERO && payoff_periods < terms.term_periods {
        warnings.push(format!(
            "Extra payments retire the loan in period {payoff_periods}; no balloon falls due"
        ));
    }

    log::debug!(
        "amortization: payment {} at periodic rate {} over {} periods (paid off in {})",
        payment,
        rate,
        terms.term_periods,
        payoff_periods
    );

    let output = AmortizationOutput {
        periodic_payment: payment,
        periodic_rate: rate,
        schedule,
        total_interest,
        total_paid,
        payoff_periods,
        periods_saved,
        interest_saved,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Level-payment amortization (ordinary annuity, payment at period end)",
        terms,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_terms(terms: &LoanTerms) -> CalcResult<()> {
    if terms.principal <= Decimal::ZERO {
        return Err(CalcError::invalid("principal", "Principal must be positive"));
    }
    if terms.term_periods == 0 {
        return Err(CalcError::invalid("term_periods", "Term must be at least one period"));
    }
    if terms.periods_per_year == 0 {
        return Err(CalcError::invalid(
            "periods_per_year",
            "Payments per year must be at least 1",
        ));
    }
    if terms.annual_rate_percent < Decimal::ZERO {
        return Err(CalcError::invalid(
            "annual_rate_percent",
            "Interest rate cannot be negative",
        ));
    }
    if terms.extra_payment < Decimal::ZERO {
        return Err(CalcError::invalid("extra_payment", "Extra payment cannot be negative"));
    }
    if terms.balloon_payment < Decimal::ZERO {
        return Err(CalcError::invalid(
            "balloon_payment",
            "Balloon payment cannot be negative",
        ));
    }
    if terms.balloon_payment > terms.principal {
        return Err(CalcError::invalid(
            "balloon_payment",
            "Balloon payment cannot exceed the principal",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Annuity payment on the part of the principal not deferred to the balloon.
fn level_payment(terms: &LoanTerms, rate: Rate) -> CalcResult<Money> {
    let deferred = if terms.balloon_payment > Decimal::ZERO {
        present_value(terms.balloon_payment, rate, terms.term_periods)?
    } else {
        Decimal::ZERO
    };
    annuity_payment(terms.principal - deferred, rate, terms.term_periods)
}

fn build_schedule(
    terms: &LoanTerms,
    rate: Rate,
    payment: Money,
    extra: Money,
) -> CalcResult<Vec<PaymentScheduleEntry>> {
    let n = terms.term_periods;
    let scheduled = payment.checked_add(extra).ok_or_else(out_of_range)?;
    let mut schedule = Vec::with_capacity(n as usize);
    let mut balance = terms.principal;

    for period in 1..=n {
        let interest = accrue(balance, rate).ok_or_else(out_of_range)?;
        let mut principal_portion = (scheduled - interest)
            .max(Decimal::ZERO)
            .min(balance);
        let mut remaining = balance - principal_portion;
        let mut balloon_portion = Decimal::ZERO;

        // Final period settles whatever is left: the balloon, or rounding dust.
        if period == n {
            if terms.balloon_payment > Decimal::ZERO {
                balloon_portion = remaining;
            } else {
                principal_portion += remaining;
            }
            remaining = Decimal::ZERO;
        }

        schedule.push(PaymentScheduleEntry {
            period,
            payment_amount: principal_portion + interest + balloon_portion,
            principal_portion,
            interest_portion: interest,
            balloon_portion,
            remaining_balance: remaining,
        });

        balance = remaining;
        if balance.is_zero() {
            break;
        }
    }

    Ok(schedule)
}

fn checked_total(mut values: impl Iterator<Item = Money>) -> CalcResult<Money> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v).ok_or_else(out_of_range))
}

fn out_of_range() -> CalcError {
    CalcError::DomainViolation("loan amounts exceed the decimal range".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn mortgage() -> LoanTerms {
        LoanTerms {
            principal: dec!(200000),
            annual_rate_percent: dec!(6),
            term_periods: 360,
            periods_per_year: 12,
            extra_payment: Decimal::ZERO,
            balloon_payment: Decimal::ZERO,
        }
    }

    #[test]
    fn test_thirty_year_mortgage_known_answer() {
        let out = compute_schedule(&mortgage()).unwrap().result;

        assert!(
            (out.periodic_payment - dec!(1199.10)).abs() < dec!(0.01),
            "payment should be ~1199.10, got {}",
            out.periodic_payment
        );
        assert!(
            (out.total_interest - dec!(231676)).abs() < dec!(1),
            "total interest should be ~231676, got {}",
            out.total_interest
        );
        assert_eq!(out.schedule.len(), 360);
        assert_eq!(out.payoff_periods, 360);
    }

    #[test]
    fn test_schedule_retires_principal() {
        for (principal, rate, term) in [
            (dec!(200000), dec!(6), 360),
            (dec!(15000), dec!(9.5), 60),
            (dec!(3500), dec!(24.99), 18),
            (dec!(1), dec!(0.1), 1),
        ] {
            let terms = LoanTerms {
                principal,
                annual_rate_percent: rate,
                term_periods: term,
                ..mortgage()
            };
            let out = compute_schedule(&terms).unwrap().result;
            let last = out.schedule.last().unwrap();
            assert_eq!(last.remaining_balance, Decimal::ZERO);

            let principal_paid: Decimal = out.schedule.iter().map(|e| e.principal_portion).sum();
            assert!(
                (principal_paid - principal).abs() < dec!(0.000001),
                "principal paid {principal_paid} != {principal}"
            );
        }
    }

    #[test]
    fn test_balance_non_increasing_and_portions_add_up() {
        let out = compute_schedule(&mortgage()).unwrap().result;
        let mut previous = dec!(200000);
        for entry in &out.schedule {
            assert!(entry.remaining_balance <= previous);
            assert_eq!(
                entry.principal_portion + entry.interest_portion,
                entry.payment_amount
            );
            previous = entry.remaining_balance;
        }
    }

    #[test]
    fn test_zero_rate_splits_principal_evenly() {
        let terms = LoanTerms {
            principal: dec!(12000),
            annual_rate_percent: Decimal::ZERO,
            term_periods: 48,
            ..mortgage()
        };
        let out = compute_schedule(&terms).unwrap().result;

        assert_eq!(out.periodic_payment, dec!(12000) / dec!(48));
        assert!(out.schedule.iter().all(|e| e.interest_portion.is_zero()));
        assert_eq!(out.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_extra_payment_shortens_loan() {
        let terms = LoanTerms {
            extra_payment: dec!(200),
            ..mortgage()
        };
        let out = compute_schedule(&terms).unwrap().result;

        assert!(out.payoff_periods < 360);
        assert_eq!(out.periods_saved, 360 - out.payoff_periods);
        assert!(out.interest_saved > Decimal::ZERO);
        assert_eq!(out.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
        // the payoff period only pays what is still owed
        let last = out.schedule.last().unwrap();
        assert!(last.payment_amount <= out.periodic_payment + dec!(200));
    }

    #[test]
    fn test_no_savings_without_extra_payment() {
        let out = compute_schedule(&mortgage()).unwrap().result;
        assert_eq!(out.periods_saved, 0);
        assert_eq!(out.interest_saved, Decimal::ZERO);
    }

    #[test]
    fn test_balloon_loan_final_period() {
        let terms = LoanTerms {
            principal: dec!(100000),
            annual_rate_percent: dec!(5),
            term_periods: 60,
            balloon_payment: dec!(40000),
            ..mortgage()
        };
        let out = compute_schedule(&terms).unwrap().result;
        let plain = compute_schedule(&LoanTerms {
            balloon_payment: Decimal::ZERO,
            ..terms.clone()
        })
        .unwrap()
        .result;

        assert!(out.periodic_payment < plain.periodic_payment);
        assert_eq!(out.schedule.len(), 60);

        let last = out.schedule.last().unwrap();
        assert!((last.balloon_portion - dec!(40000)).abs() < dec!(0.0001));
        assert_eq!(
            last.principal_portion + last.interest_portion + last.balloon_portion,
            last.payment_amount
        );
        assert_eq!(last.remaining_balance, Decimal::ZERO);

        let principal_paid: Decimal = out.schedule.iter().map(|e| e.principal_portion).sum();
        assert!((principal_paid + last.balloon_portion - dec!(100000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_zero_rate_balloon() {
        let terms = LoanTerms {
            principal: dec!(10000),
            annual_rate_percent: Decimal::ZERO,
            term_periods: 10,
            balloon_payment: dec!(5000),
            ..mortgage()
        };
        let out = compute_schedule(&terms).unwrap().result;
        assert_eq!(out.periodic_payment, dec!(500));
        assert_eq!(out.schedule.last().unwrap().balloon_portion, dec!(5000));
        assert_eq!(out.schedule.last().unwrap().payment_amount, dec!(5500));
    }

    #[test]
    fn test_invalid_principal_error() {
        let terms = LoanTerms {
            principal: Decimal::ZERO,
            ..mortgage()
        };
        match compute_schedule(&terms) {
            Err(CalcError::InvalidInput { field, .. }) => assert_eq!(field, "principal"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_term_error() {
        let terms = LoanTerms {
            term_periods: 0,
            annual_rate_percent: Decimal::ZERO,
            ..mortgage()
        };
        assert!(matches!(
            compute_schedule(&terms),
            Err(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_balloon_above_principal_error() {
        let terms = LoanTerms {
            balloon_payment: dec!(250000),
            ..mortgage()
        };
        assert!(compute_schedule(&terms).is_err());
    }

    #[test]
    fn test_high_rate_long_term_stays_in_range() {
        // 25% a month for 360 months: (1.25)^360 is past the decimal range
        let terms = LoanTerms {
            principal: dec!(1000),
            annual_rate_percent: dec!(300),
            ..mortgage()
        };
        let out = compute_schedule(&terms).unwrap().result;
        assert!((out.periodic_payment - dec!(250)).abs() < dec!(0.000001));
        assert_eq!(out.schedule.len(), 360);
        assert_eq!(out.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_totals_past_decimal_range_are_domain_violation() {
        let terms = LoanTerms {
            principal: dec!(70000000000000000000000000000),
            annual_rate_percent: dec!(24),
            ..mortgage()
        };
        assert!(matches!(
            compute_schedule(&terms),
            Err(CalcError::DomainViolation(_))
        ));
    }

    #[test]
    fn test_metadata_populated() {
        let out = compute_schedule(&mortgage()).unwrap();
        assert!(!out.methodology.is_empty());
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert_eq!(out.assumptions["term_periods"], 360);
    }
}
