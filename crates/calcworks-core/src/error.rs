use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (last estimate: {last_estimate}, residual: {residual})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_estimate: Decimal,
        residual: Decimal,
    },

    #[error("Underfunded budget: monthly budget {budget} is below the sum of minimum payments {required_minimums}")]
    UnderfundedBudget {
        budget: Decimal,
        required_minimums: Decimal,
    },

    #[error("Domain violation: {0}")]
    DomainViolation(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CalcError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError(e.to_string())
    }
}
