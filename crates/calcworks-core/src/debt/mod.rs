pub mod strategy;
pub mod waterfall;

pub use strategy::PayoffStrategy;
pub use waterfall::{
    compare_strategies, simulate_payoff, AccountMonth, DebtAccount, PaidOffAccount, PayoffInput,
    PayoffMonth, PayoffOutput, StrategyComparison, StrategySummary,
};
