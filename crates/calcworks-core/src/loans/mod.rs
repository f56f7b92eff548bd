pub mod amortization;

pub use amortization::{compute_schedule, AmortizationOutput, LoanTerms, PaymentScheduleEntry};
