use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::loan::{Loan, Payment};
use crate::projection::{estimate_total_cost, project};
use crate::stats::loan_statistics;
use crate::types::{CostProjection, LoanId, LoanStatistics, SchedulePoint};

/// presentation-layer snapshot of a loan's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSummaryView {
    pub loan_id: LoanId,
    pub as_of: NaiveDate,
    pub statistics: LoanStatistics,
    pub projected_cost: CostProjection,
    pub schedule: Vec<SchedulePoint>,
}

impl LoanSummaryView {
    /// assemble the statistics, cost projection and payoff trajectory for
    /// one loan
    pub fn build(loan: &Loan, payments: &[Payment], time: &SafeTimeProvider) -> Result<Self> {
        Ok(Self {
            loan_id: loan.id,
            as_of: time.now().date_naive(),
            statistics: loan_statistics(loan, payments, time)?,
            projected_cost: estimate_total_cost(loan, payments, time)?,
            schedule: project(loan, payments, None)?,
        })
    }

    /// get json representation
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("JSON error: {}", e))
    }
}
