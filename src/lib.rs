pub mod decimal;
pub mod errors;
pub mod interest;
pub mod loan;
pub mod payments;
pub mod projection;
pub mod report;
pub mod stats;
pub mod types;

// re-export key types
pub use decimal::{Money, Rate};
pub use errors::{EngineError, Result};
pub use interest::AccrualEngine;
pub use loan::{Loan, LoanBuilder, Payment};
pub use payments::{
    annuity_payment, apply_payment, days_late, is_payment_late, next_due_date, payment_due_date,
    previous_due_date, scheduled_payment,
};
pub use projection::{
    estimate_total_cost, project, ScheduleProjection, MAX_PROJECTION_MONTHS,
    OPEN_TERM_HORIZON_MONTHS,
};
pub use report::LoanSummaryView;
pub use stats::{loan_statistics, replay_history, ReplayState};
pub use types::{
    AccrualMethod, AccrualTiming, CostProjection, LoanId, LoanKind, LoanStatistics,
    PayoffOutcome, PaymentApplication, PaymentId, SchedulePoint,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
