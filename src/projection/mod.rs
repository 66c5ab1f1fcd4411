pub mod cost;
pub mod schedule;

pub use cost::estimate_total_cost;
pub use schedule::{
    project, ScheduleProjection, MAX_PROJECTION_MONTHS, OPEN_TERM_HORIZON_MONTHS,
};
