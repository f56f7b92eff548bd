//! Counting helpers for the probability calculator.
//!
//! Counts are exact `u128` values; anything larger is reported as a
//! `DomainViolation` instead of wrapping.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::types::{with_metadata, ComputationOutput};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Order does not matter
    Combinations,
    /// Order matters
    Permutations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountingInput {
    pub selection: Selection,
    /// Size of the pool
    pub n: u64,
    /// Items drawn
    pub r: u64,
    #[serde(default)]
    pub repetition: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountingOutput {
    /// Exact count as a decimal string; may exceed 64 bits
    pub count: String,
    pub formula: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn count_arrangements(input: &CountingInput) -> CalcResult<ComputationOutput<CountingOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let (count, formula) = match (input.selection, input.repetition) {
        (Selection::Combinations, false) => (combinations(input.n, input.r)?, "n! / (r! (n-r)!)"),
        (Selection::Combinations, true) => (
            combinations_with_repetition(input.n, input.r)?,
            "(n+r-1)! / (r! (n-1)!)",
        ),
        (Selection::Permutations, false) => (permutations(input.n, input.r)?, "n! / (n-r)!"),
        (Selection::Permutations, true) => (permutations_with_repetition(input.n, input.r)?, "n^r"),
    };

    let output = CountingOutput {
        count: count.to_string(),
        formula: formula.to_string(),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Exact integer counting",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// C(n, r): unordered selections without repetition.
pub fn combinations(n: u64, r: u64) -> CalcResult<u128> {
    check_draw(n, r)?;
    // C(n, r) == C(n, n-r); iterate over the shorter side
    let k = r.min(n - r);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc == C(n, i); divide before multiplying so the only value held is
        // C(n, i + 1). Once gcd is removed, (i + 1) divides (n - i).
        let divisor = u128::from(i + 1);
        let common = gcd(acc, divisor);
        let factor = u128::from(n - i) / (divisor / common);
        acc = (acc / common)
            .checked_mul(factor)
            .ok_or_else(|| overflow("combinations", n, r))?;
    }
    Ok(acc)
}

/// Unordered selections where an item may be drawn more than once.
pub fn combinations_with_repetition(n: u64, r: u64) -> CalcResult<u128> {
    if n == 0 {
        return if r == 0 {
            Ok(1)
        } else {
            Err(CalcError::DomainViolation(
                "Cannot draw from an empty pool".into(),
            ))
        };
    }
    let top = n
        .checked_add(r - r.min(1))
        .ok_or_else(|| overflow("combinations_with_repetition", n, r))?;
    combinations(top, r)
}

/// P(n, r): ordered selections without repetition.
pub fn permutations(n: u64, r: u64) -> CalcResult<u128> {
    check_draw(n, r)?;
    ((n - r)..n).try_fold(1u128, |acc, f| {
        acc.checked_mul(u128::from(f) + 1)
            .ok_or_else(|| overflow("permutations", n, r))
    })
}

/// n^r: ordered selections where an item may be drawn more than once.
pub fn permutations_with_repetition(n: u64, r: u64) -> CalcResult<u128> {
    let exp = u32::try_from(r).map_err(|_| overflow("permutations_with_repetition", n, r))?;
    u128::from(n)
        .checked_pow(exp)
        .ok_or_else(|| overflow("permutations_with_repetition", n, r))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_draw(n: u64, r: u64) -> CalcResult<()> {
    if r > n {
        return Err(CalcError::DomainViolation(format!(
            "Cannot draw {r} items from a pool of {n} without repetition"
        )));
    }
    Ok(())
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn overflow(function: &str, n: u64, r: u64) -> CalcError {
    CalcError::DomainViolation(format!("{function}({n}, {r}) exceeds the 128-bit range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations() {
        assert_eq!(combinations(5, 2).unwrap(), 10);
        assert_eq!(combinations(52, 5).unwrap(), 2_598_960);
        assert_eq!(combinations(10, 0).unwrap(), 1);
        assert_eq!(combinations(10, 10).unwrap(), 1);
        assert_eq!(combinations(0, 0).unwrap(), 1);
    }

    #[test]
    fn test_combinations_large_symmetric() {
        assert_eq!(combinations(1000, 998).unwrap(), 499_500);
    }

    #[test]
    fn test_combinations_near_u128_limit() {
        // acc * (n - i) would pass 2^128 here before the division
        assert_eq!(
            combinations(130, 65).unwrap(),
            95_067_625_827_960_698_145_584_333_020_095_113_100
        );
        assert!(matches!(
            combinations(140, 70),
            Err(CalcError::DomainViolation(_))
        ));
    }

    #[test]
    fn test_r_greater_than_n() {
        assert!(matches!(
            combinations(3, 5),
            Err(CalcError::DomainViolation(_))
        ));
        assert!(matches!(
            permutations(3, 5),
            Err(CalcError::DomainViolation(_))
        ));
    }

    #[test]
    fn test_combinations_with_repetition() {
        // 3 scoops from 5 flavours
        assert_eq!(combinations_with_repetition(5, 3).unwrap(), 35);
        assert_eq!(combinations_with_repetition(5, 0).unwrap(), 1);
        assert_eq!(combinations_with_repetition(0, 0).unwrap(), 1);
        assert!(combinations_with_repetition(0, 2).is_err());
    }

    #[test]
    fn test_permutations() {
        assert_eq!(permutations(5, 2).unwrap(), 20);
        assert_eq!(permutations(10, 10).unwrap(), 3_628_800);
        assert_eq!(permutations(7, 0).unwrap(), 1);
    }

    #[test]
    fn test_permutations_with_repetition() {
        assert_eq!(permutations_with_repetition(10, 4).unwrap(), 10_000);
        assert_eq!(permutations_with_repetition(0, 0).unwrap(), 1);
    }

    #[test]
    fn test_overflow_is_domain_violation() {
        assert!(matches!(
            permutations(200, 100),
            Err(CalcError::DomainViolation(_))
        ));
        assert!(matches!(
            permutations_with_repetition(10, 60),
            Err(CalcError::DomainViolation(_))
        ));
    }

    #[test]
    fn test_count_arrangements_envelope() {
        let input = CountingInput {
            selection: Selection::Combinations,
            n: 49,
            r: 6,
            repetition: false,
        };
        let out = count_arrangements(&input).unwrap();
        assert_eq!(out.result.count, "13983816");
        assert_eq!(out.assumptions["n"], 49);
    }
}
