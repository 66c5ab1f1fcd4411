use chrono::NaiveDate;

use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::loan::Loan;
use crate::payments::schedule::{is_payment_late, previous_due_date};
use crate::types::PaymentApplication;

/// apply one payment to a balance as of `payment_date`
///
/// `last_payment_date` is the date of the previous payment in the fold, or
/// None for the first one. Interest accrues over the stretch from
/// `max(last_payment_date, interest_start_date)` to the payment date,
/// gated by the loan-kind rules; a late payment is charged extra interest
/// for the span past its preceding due date. The payment then covers
/// interest first and principal with the rest.
pub fn apply_payment(
    balance: Money,
    amount: Money,
    payment_date: NaiveDate,
    loan: &Loan,
    last_payment_date: Option<NaiveDate>,
) -> Result<PaymentApplication> {
    if balance.is_negative() {
        return Err(EngineError::NegativeAmount { amount: balance });
    }
    if !amount.is_positive() {
        return Err(EngineError::InvalidPaymentAmount { amount });
    }
    if let Some(cursor) = last_payment_date {
        if payment_date < cursor {
            return Err(EngineError::OutOfOrderPayment { payment_date, cursor });
        }
    }

    if !loan.interest_accrues_on(payment_date) {
        // everything goes to principal, capped so the balance stays at zero
        let principal_paid = amount.min(balance);
        return Ok(PaymentApplication {
            interest_paid: Money::ZERO,
            principal_paid,
            new_balance: balance - principal_paid,
        });
    }

    let effective_start = match last_payment_date {
        Some(last) => last.max(loan.interest_start_date),
        None => loan.interest_start_date,
    };

    let engine = loan.accrual_engine();
    let mut interest_owed =
        engine.interest_owed(balance, loan.interest_rate, effective_start, payment_date)?;

    if is_payment_late(loan, payment_date) {
        if let Some(due) = previous_due_date(loan, payment_date) {
            let late_span_start = due.max(effective_start);
            interest_owed +=
                engine.interest_owed(balance, loan.interest_rate, late_span_start, payment_date)?;
        }
    }

    let interest_paid = amount.min(interest_owed);
    let principal_paid = (amount - interest_paid).clamp_non_negative();
    let new_balance = (balance - principal_paid).clamp_non_negative();

    Ok(PaymentApplication {
        interest_paid,
        principal_paid,
        new_balance,
    })
}
