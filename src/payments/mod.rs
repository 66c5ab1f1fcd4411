pub mod apply;
pub mod schedule;

pub use apply::apply_payment;
pub use schedule::{
    annuity_payment, days_late, is_payment_late, next_due_date, payment_due_date,
    previous_due_date, scheduled_payment,
};
