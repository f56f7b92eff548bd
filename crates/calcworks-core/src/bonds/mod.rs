pub mod pricing;
pub mod yield_solver;

pub use pricing::{bond_cash_flows, price_from_yield, BondCashFlow, BondSpec, BondValuation};
pub use yield_solver::{yield_from_price, SolverConfig, SolverOutcome, YieldInput, YieldOutput};
