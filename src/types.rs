use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// interest accrual convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccrualMethod {
    /// rate / 365.25 per day, charged per whole day elapsed
    Daily,
    /// rate / 12 per month, charged per whole calendar month crossed
    Monthly,
}

/// loan kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanKind {
    Personal,
    Auto,
    Mortgage,
    Student,
    CreditCard,
    Business,
    HomeEquity,
}

/// when interest starts accruing relative to the interest start date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccrualTiming {
    /// accrues from the interest start date onward
    Immediate,
    /// no accrual inside the post-start grace window (subsidized student loans)
    DeferredDuringGrace,
}

impl LoanKind {
    /// the full kind-by-kind accrual rule set; every kind is listed so a new
    /// variant cannot compile without a decision here
    pub fn accrual_timing(&self, is_subsidized: bool) -> AccrualTiming {
        match (self, is_subsidized) {
            (LoanKind::Student, true) => AccrualTiming::DeferredDuringGrace,
            (LoanKind::Student, false)
            | (LoanKind::Personal, _)
            | (LoanKind::Auto, _)
            | (LoanKind::Mortgage, _)
            | (LoanKind::CreditCard, _)
            | (LoanKind::Business, _)
            | (LoanKind::HomeEquity, _) => AccrualTiming::Immediate,
        }
    }
}

/// result of applying one payment to a balance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PaymentApplication {
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub new_balance: Money,
}

/// aggregate totals for a loan at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LoanStatistics {
    pub total_paid: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    /// outstanding balance including interest accrued since the last payment
    pub remaining_balance: Money,
}

/// one month of the projected payoff trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulePoint {
    /// 0-based month index
    pub month: u32,
    /// balance on the actual track (real payments where present)
    pub balance: Money,
    /// balance on the minimum-only reference track
    pub minimum_payment_balance: Money,
    /// actual-track balance at the start of the month
    pub starting_balance: Money,
    /// cumulative amount paid on the actual track
    pub total_payments: Money,
    pub scheduled_payment: Money,
    /// payment applied to the actual track this month
    pub payment_used: Money,
    /// cumulative interest accrued on the actual track
    pub total_interest: Money,
    pub calendar_month: u32,
    pub calendar_year: i32,
}

/// how a projected payoff simulation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoffOutcome {
    /// the schedule retires the balance
    AmortizesInFull { months: u32 },
    /// minimum payment cannot cover accruing interest; figures come from a
    /// synthetic fixed-term schedule instead of an unbounded simulation
    NeverPaysOff { synthetic_term_months: u32 },
    /// simulation hit the hard horizon without reaching payoff
    CappedAtHorizon { months: u32 },
}

/// projected lifetime cost of a loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostProjection {
    pub total_interest: Money,
    pub total_cost: Money,
    pub payoff: PayoffOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accrual_timing_table() {
        assert_eq!(
            LoanKind::Student.accrual_timing(true),
            AccrualTiming::DeferredDuringGrace
        );
        assert_eq!(LoanKind::Student.accrual_timing(false), AccrualTiming::Immediate);

        // the subsidized flag is student-only; it must not defer anything else
        for kind in [
            LoanKind::Personal,
            LoanKind::Auto,
            LoanKind::Mortgage,
            LoanKind::CreditCard,
            LoanKind::Business,
            LoanKind::HomeEquity,
        ] {
            assert_eq!(kind.accrual_timing(true), AccrualTiming::Immediate);
            assert_eq!(kind.accrual_timing(false), AccrualTiming::Immediate);
        }
    }
}
