pub mod accrual;

pub use accrual::{days_between, fractional_months, whole_months_between, AccrualEngine};
