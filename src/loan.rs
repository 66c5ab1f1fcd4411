use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::interest::AccrualEngine;
use crate::payments::apply::apply_payment;
use crate::payments::schedule::{add_months_clamped, scheduled_payment};
use crate::stats::replay_history;
use crate::types::{AccrualMethod, AccrualTiming, LoanId, LoanKind, PaymentId};

/// a loan's terms; immutable once built, replaced wholesale on edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub principal: Money,
    /// annual rate
    pub interest_rate: Rate,
    /// 0 means open-ended
    pub term_months: u32,
    pub disbursement_date: NaiveDate,
    pub interest_start_date: NaiveDate,
    pub first_payment_due_date: NaiveDate,
    /// day of month payments fall due, 1-31, clamped to short months
    pub payment_due_day: u8,
    pub minimum_payment: Option<Money>,
    pub accrual_method: AccrualMethod,
    pub kind: LoanKind,
    /// student loans only
    pub is_subsidized: bool,
    /// student loans only
    pub grace_period_months: u32,
}

impl Loan {
    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    /// the accrual engine for this loan's convention
    pub fn accrual_engine(&self) -> AccrualEngine {
        AccrualEngine::new(self.accrual_method)
    }

    /// first day after the subsidized grace window
    pub fn grace_end_date(&self) -> NaiveDate {
        add_months_clamped(
            self.interest_start_date,
            self.grace_period_months,
            self.interest_start_date.day(),
        )
    }

    /// whether interest accrues on the given date, per the kind rule table
    pub fn interest_accrues_on(&self, date: NaiveDate) -> bool {
        if date < self.interest_start_date {
            return false;
        }
        match self.kind.accrual_timing(self.is_subsidized) {
            AccrualTiming::Immediate => true,
            AccrualTiming::DeferredDuringGrace => date >= self.grace_end_date(),
        }
    }

    /// the loan's periodic payment (stated minimum or annuity)
    pub fn scheduled_payment(&self) -> Money {
        scheduled_payment(self)
    }
}

/// builder for loans; `build` validates the date ordering and ranges
pub struct LoanBuilder {
    id: Option<LoanId>,
    principal: Option<Money>,
    interest_rate: Option<Rate>,
    term_months: u32,
    disbursement_date: Option<NaiveDate>,
    interest_start_date: Option<NaiveDate>,
    first_payment_due_date: Option<NaiveDate>,
    payment_due_day: Option<u8>,
    minimum_payment: Option<Money>,
    accrual_method: AccrualMethod,
    kind: Option<LoanKind>,
    is_subsidized: bool,
    grace_period_months: u32,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            principal: None,
            interest_rate: None,
            term_months: 0,
            disbursement_date: None,
            interest_start_date: None,
            first_payment_due_date: None,
            payment_due_day: None,
            minimum_payment: None,
            accrual_method: AccrualMethod::Monthly,
            kind: None,
            is_subsidized: false,
            grace_period_months: 6,
        }
    }

    pub fn id(mut self, id: LoanId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn interest_rate(mut self, rate: Rate) -> Self {
        self.interest_rate = Some(rate);
        self
    }

    pub fn term_months(mut self, months: u32) -> Self {
        self.term_months = months;
        self
    }

    pub fn disbursement_date(mut self, date: NaiveDate) -> Self {
        self.disbursement_date = Some(date);
        self
    }

    pub fn interest_start_date(mut self, date: NaiveDate) -> Self {
        self.interest_start_date = Some(date);
        self
    }

    pub fn first_payment_due_date(mut self, date: NaiveDate) -> Self {
        self.first_payment_due_date = Some(date);
        self
    }

    pub fn payment_due_day(mut self, day: u8) -> Self {
        self.payment_due_day = Some(day);
        self
    }

    pub fn minimum_payment(mut self, amount: Money) -> Self {
        self.minimum_payment = Some(amount);
        self
    }

    pub fn accrual_method(mut self, method: AccrualMethod) -> Self {
        self.accrual_method = method;
        self
    }

    pub fn kind(mut self, kind: LoanKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_subsidized(mut self, subsidized: bool) -> Self {
        self.is_subsidized = subsidized;
        self
    }

    pub fn grace_period_months(mut self, months: u32) -> Self {
        self.grace_period_months = months;
        self
    }

    pub fn build(self) -> Result<Loan> {
        let principal = self.principal.ok_or(EngineError::InvalidConfiguration {
            message: "principal required".to_string(),
        })?;
        let interest_rate = self.interest_rate.ok_or(EngineError::InvalidConfiguration {
            message: "interest rate required".to_string(),
        })?;
        let kind = self.kind.ok_or(EngineError::InvalidConfiguration {
            message: "loan kind required".to_string(),
        })?;
        let disbursement_date = self.disbursement_date.ok_or(EngineError::InvalidConfiguration {
            message: "disbursement date required".to_string(),
        })?;

        if principal.is_negative() {
            return Err(EngineError::NegativeAmount { amount: principal });
        }
        if interest_rate.is_negative() {
            return Err(EngineError::NegativeRate { rate: interest_rate });
        }
        if let Some(minimum) = self.minimum_payment {
            if !minimum.is_positive() {
                return Err(EngineError::InvalidPaymentAmount { amount: minimum });
            }
        }

        let interest_start_date = self.interest_start_date.unwrap_or(disbursement_date);
        if interest_start_date < disbursement_date {
            return Err(EngineError::InvalidDateRange {
                start: disbursement_date,
                end: interest_start_date,
            });
        }

        let payment_due_day = self
            .payment_due_day
            .or_else(|| self.first_payment_due_date.map(|d| d.day() as u8))
            .unwrap_or(disbursement_date.day() as u8);
        if !(1..=31).contains(&payment_due_day) {
            return Err(EngineError::InvalidDueDay { day: payment_due_day });
        }

        let first_payment_due_date = self.first_payment_due_date.unwrap_or_else(|| {
            add_months_clamped(disbursement_date, 1, payment_due_day as u32)
        });
        if first_payment_due_date < interest_start_date {
            return Err(EngineError::InvalidDateRange {
                start: interest_start_date,
                end: first_payment_due_date,
            });
        }

        Ok(Loan {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            principal,
            interest_rate,
            term_months: self.term_months,
            disbursement_date,
            interest_start_date,
            first_payment_due_date,
            payment_due_day,
            minimum_payment: self.minimum_payment,
            accrual_method: self.accrual_method,
            kind,
            is_subsidized: self.is_subsidized,
            grace_period_months: self.grace_period_months,
        })
    }
}

impl Default for LoanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// a recorded payment against a loan; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub principal_amount: Money,
    pub interest_amount: Money,
    /// balance snapshot right after this payment
    pub remaining_balance: Money,
    pub is_extra_payment: bool,
    pub notes: Option<String>,
}

impl Payment {
    /// record a new payment against a loan
    ///
    /// Replays the prior history to the current balance, splits the new
    /// amount into interest and principal, and snapshots the resulting
    /// balance. `prior_payments` may be unordered; payments for other
    /// loans are ignored.
    pub fn record(
        loan: &Loan,
        prior_payments: &[Payment],
        amount: Money,
        payment_date: NaiveDate,
        notes: Option<String>,
    ) -> Result<Payment> {
        let state = replay_history(loan, prior_payments)?;
        let application = apply_payment(
            state.balance,
            amount,
            payment_date,
            loan,
            state.last_payment_date,
        )?;

        let scheduled = loan.scheduled_payment();
        let is_extra_payment = scheduled.is_positive() && amount > scheduled;

        Ok(Payment {
            id: Uuid::new_v4(),
            loan_id: loan.id,
            amount,
            payment_date,
            principal_amount: application.principal_paid,
            interest_amount: application.interest_paid,
            remaining_balance: application.new_balance,
            is_extra_payment,
            notes,
        })
    }
}
