use chrono::{Datelike, NaiveDate};

use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::interest::AccrualEngine;
use crate::loan::{Loan, Payment};
use crate::payments::schedule::{payment_due_date, scheduled_payment};
use crate::types::SchedulePoint;

/// horizon for loans with no fixed term
pub const OPEN_TERM_HORIZON_MONTHS: u32 = 120;

/// absolute ceiling on any projection, 50 years
pub const MAX_PROJECTION_MONTHS: u32 = 600;

/// lazy month-by-month payoff trajectory
///
/// Walks due-date-anchored calendar months and carries two balances in
/// parallel: the actual track applies real payments booked in each month
/// (falling back to the scheduled payment), while the minimum-only track
/// always applies the scheduled payment as a what-if reference. The
/// iterator is finite by construction: it ends after the month in which
/// the actual balance reaches zero, or at the horizon.
pub struct ScheduleProjection<'a> {
    loan: &'a Loan,
    engine: AccrualEngine,
    scheduled: Money,
    horizon: u32,
    /// (date, amount) of this loan's payments, ascending by date
    payments: Vec<(NaiveDate, Money)>,
    next_payment: usize,
    month: u32,
    actual_balance: Money,
    minimum_balance: Money,
    total_payments: Money,
    total_interest: Money,
    finished: bool,
}

impl<'a> ScheduleProjection<'a> {
    pub fn new(
        loan: &'a Loan,
        payments: &[Payment],
        effective_payment: Option<Money>,
    ) -> Result<Self> {
        let scheduled = effective_payment.unwrap_or_else(|| scheduled_payment(loan));
        if scheduled.is_negative() {
            return Err(EngineError::NegativeAmount { amount: scheduled });
        }

        let mut booked: Vec<(NaiveDate, Money)> = payments
            .iter()
            .filter(|p| p.loan_id == loan.id)
            .map(|p| (p.payment_date, p.amount))
            .collect();
        booked.sort_by_key(|(date, _)| *date);

        let horizon = if loan.term_months > 0 {
            loan.term_months
        } else {
            OPEN_TERM_HORIZON_MONTHS
        }
        .min(MAX_PROJECTION_MONTHS);

        Ok(Self {
            loan,
            engine: loan.accrual_engine(),
            scheduled,
            horizon,
            payments: booked,
            next_payment: 0,
            month: 0,
            actual_balance: loan.principal,
            minimum_balance: loan.principal,
            total_payments: Money::ZERO,
            total_interest: Money::ZERO,
            finished: false,
        })
    }

    /// interest for one month bin on the given balance, honoring the
    /// interest start date and the loan-kind accrual gate
    fn bin_interest(&self, balance: Money, start: NaiveDate, end: NaiveDate) -> Result<Money> {
        if balance.is_zero() || !self.loan.interest_accrues_on(end) {
            return Ok(Money::ZERO);
        }
        let span_start = start.max(self.loan.interest_start_date);
        if span_start >= end {
            return Ok(Money::ZERO);
        }
        self.engine
            .interest_over_span(balance, self.loan.interest_rate, span_start, end)
    }
}

impl Iterator for ScheduleProjection<'_> {
    type Item = Result<SchedulePoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.month >= self.horizon {
            return None;
        }

        let k = self.month;
        let bin_end = payment_due_date(self.loan, k);
        // month 0 seeds from everything on or before the first due date
        let bin_start = if k == 0 {
            self.loan.interest_start_date
        } else {
            payment_due_date(self.loan, k - 1)
        };

        let mut booked = Money::ZERO;
        let mut has_real_payments = false;
        while self.next_payment < self.payments.len()
            && self.payments[self.next_payment].0 <= bin_end
        {
            booked += self.payments[self.next_payment].1;
            has_real_payments = true;
            self.next_payment += 1;
        }

        let starting_balance = self.actual_balance;

        let interest_actual = match self.bin_interest(self.actual_balance, bin_start, bin_end) {
            Ok(interest) => interest,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };
        let interest_minimum = match self.bin_interest(self.minimum_balance, bin_start, bin_end) {
            Ok(interest) => interest,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };

        // interest-first application; a payment below the accrued interest
        // leaves the balance growing
        let planned = if has_real_payments { booked } else { self.scheduled };
        let owed = self.actual_balance + interest_actual;
        let payment_used = planned.min(owed);
        let new_actual = owed - payment_used;

        let minimum_owed = self.minimum_balance + interest_minimum;
        let new_minimum = minimum_owed - self.scheduled.min(minimum_owed);

        self.total_interest += interest_actual;
        self.total_payments += payment_used;
        self.actual_balance = new_actual;
        self.minimum_balance = new_minimum;
        self.month += 1;

        if new_actual.is_zero() {
            self.finished = true;
        }

        Some(Ok(SchedulePoint {
            month: k,
            balance: new_actual,
            minimum_payment_balance: new_minimum,
            starting_balance,
            total_payments: self.total_payments,
            scheduled_payment: self.scheduled,
            payment_used,
            total_interest: self.total_interest,
            calendar_month: bin_end.month(),
            calendar_year: bin_end.year(),
        }))
    }
}

/// full projected trajectory for a loan
pub fn project(
    loan: &Loan,
    payments: &[Payment],
    effective_payment: Option<Money>,
) -> Result<Vec<SchedulePoint>> {
    ScheduleProjection::new(loan, payments, effective_payment)?.collect()
}
