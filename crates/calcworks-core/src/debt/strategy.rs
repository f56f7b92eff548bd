use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{Money, Percent};

/// Order in which surplus budget is thrown at outstanding debts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoffStrategy {
    /// Highest interest rate first
    Avalanche,
    /// Lowest balance first
    Snowball,
    /// Caller-supplied account ids, first id first
    CustomOrder(Vec<String>),
}

impl PayoffStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            PayoffStrategy::Avalanche => "avalanche",
            PayoffStrategy::Snowball => "snowball",
            PayoffStrategy::CustomOrder(_) => "custom_order",
        }
    }

    /// Sort candidates into priority order, highest priority first.
    ///
    /// The sort is stable, so input order breaks any remaining ties.
    pub fn rank(&self, candidates: &mut [Candidate<'_>]) {
        candidates.sort_by(|a, b| self.compare(a, b));
    }

    /// Highest-priority candidate, if any.
    pub fn target<'a>(&self, candidates: &[Candidate<'a>]) -> Option<Candidate<'a>> {
        let mut ranked = candidates.to_vec();
        self.rank(&mut ranked);
        ranked.first().copied()
    }

    fn compare(&self, a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
        match self {
            PayoffStrategy::Avalanche => b
                .annual_rate_percent
                .cmp(&a.annual_rate_percent)
                .then(a.balance.cmp(&b.balance)),
            PayoffStrategy::Snowball => a
                .balance
                .cmp(&b.balance)
                .then(b.annual_rate_percent.cmp(&a.annual_rate_percent)),
            PayoffStrategy::CustomOrder(order) => {
                let position = |id: &str| order.iter().position(|o| o == id).unwrap_or(usize::MAX);
                position(a.id).cmp(&position(b.id))
            }
        }
    }
}

/// An active account as seen by the strategy comparator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    /// Position in the caller's account list
    pub index: usize,
    pub id: &'a str,
    pub balance: Money,
    pub annual_rate_percent: Percent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candidates() -> Vec<Candidate<'static>> {
        vec![
            Candidate {
                index: 0,
                id: "card",
                balance: dec!(5000),
                annual_rate_percent: dec!(22),
            },
            Candidate {
                index: 1,
                id: "car",
                balance: dec!(9000),
                annual_rate_percent: dec!(6),
            },
            Candidate {
                index: 2,
                id: "store",
                balance: dec!(800),
                annual_rate_percent: dec!(22),
            },
        ]
    }

    fn ids(c: &[Candidate<'_>]) -> Vec<String> {
        c.iter().map(|c| c.id.to_string()).collect()
    }

    #[test]
    fn test_avalanche_rate_desc_then_balance() {
        let mut c = candidates();
        PayoffStrategy::Avalanche.rank(&mut c);
        assert_eq!(ids(&c), ["store", "card", "car"]);
    }

    #[test]
    fn test_snowball_balance_asc() {
        let mut c = candidates();
        PayoffStrategy::Snowball.rank(&mut c);
        assert_eq!(ids(&c), ["store", "card", "car"]);

        let mut c = candidates();
        c[2].balance = dec!(9500);
        PayoffStrategy::Snowball.rank(&mut c);
        assert_eq!(ids(&c), ["card", "car", "store"]);
    }

    #[test]
    fn test_snowball_tie_prefers_higher_rate() {
        let mut c = candidates();
        c[1].balance = dec!(5000);
        c[1].annual_rate_percent = dec!(25);
        c[2].balance = dec!(9999);
        PayoffStrategy::Snowball.rank(&mut c);
        assert_eq!(ids(&c), ["car", "card", "store"]);
    }

    #[test]
    fn test_custom_order_unlisted_last() {
        let strategy = PayoffStrategy::CustomOrder(vec!["car".into()]);
        let mut c = candidates();
        strategy.rank(&mut c);
        assert_eq!(ids(&c), ["car", "card", "store"]);
    }

    #[test]
    fn test_target_empty() {
        assert!(PayoffStrategy::Avalanche.target(&[]).is_none());
    }

    #[test]
    fn test_serde_names() {
        let s: PayoffStrategy = serde_json::from_str("\"snowball\"").unwrap();
        assert_eq!(s, PayoffStrategy::Snowball);
        let s: PayoffStrategy = serde_json::from_str(r#"{"custom_order":["a","b"]}"#).unwrap();
        assert_eq!(s, PayoffStrategy::CustomOrder(vec!["a".into(), "b".into()]));
    }
}
