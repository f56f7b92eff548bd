pub mod bonds;
pub mod combinatorics;
pub mod debt;
pub mod dispatch;
pub mod loans;
pub mod savings;
