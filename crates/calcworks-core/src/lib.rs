pub mod calculation;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "savings")]
pub mod savings;

#[cfg(feature = "bonds")]
pub mod bonds;

#[cfg(feature = "debt")]
pub mod debt;

#[cfg(feature = "combinatorics")]
pub mod combinatorics;

pub use calculation::{run_json, Calculation};
pub use error::CalcError;
pub use types::*;

/// Standard result type for all calculator operations
pub type CalcResult<T> = Result<T, CalcError>;
