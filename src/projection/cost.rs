use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::errors::Result;
use crate::interest::AccrualEngine;
use crate::loan::{Loan, Payment};
use crate::payments::schedule::{annuity_payment, scheduled_payment};
use crate::stats::{accrued_since_last_payment, replay_history};
use crate::types::{AccrualMethod, CostProjection, PayoffOutcome};

/// balances at or below a cent count as paid off
const PAYOFF_EPSILON: Money = Money::CENT;

/// ceiling on the forward payoff simulation, 50 years
const MAX_SIMULATION_MONTHS: u32 = 600;

/// term assumed when minimum payments can never retire the balance
const SYNTHETIC_TERM_MONTHS: u32 = 360;

/// projected lifetime interest and total cost of a loan
///
/// Fixed-term loans use the annuity closed form. Open-term loans replay
/// their history to the current balance and simulate minimum payments
/// forward; a minimum payment below the interest accruing each month is
/// flagged as never paying off and costed against a synthetic 360-month
/// schedule instead of simulating an unbounded balance.
pub fn estimate_total_cost(
    loan: &Loan,
    payments: &[Payment],
    time: &SafeTimeProvider,
) -> Result<CostProjection> {
    let scheduled = scheduled_payment(loan);

    if loan.term_months > 0 {
        let paid_over_term = scheduled * Decimal::from(loan.term_months);
        let total_interest = (paid_over_term - loan.principal).clamp_non_negative();
        return Ok(CostProjection {
            total_interest,
            total_cost: loan.principal + total_interest,
            payoff: PayoffOutcome::AmortizesInFull { months: loan.term_months },
        });
    }

    let state = replay_history(loan, payments)?;
    let today = time.now().date_naive();
    let balance = state.balance + accrued_since_last_payment(loan, &state, today)?;
    let mut total_interest = state.interest_paid;

    if balance <= PAYOFF_EPSILON {
        return Ok(CostProjection {
            total_interest,
            total_cost: loan.principal + total_interest,
            payoff: PayoffOutcome::AmortizesInFull { months: 0 },
        });
    }

    // the simulation steps in months regardless of the loan's day count
    let monthly = AccrualEngine::new(AccrualMethod::Monthly);
    let interest_on_balance = monthly.periodic_interest(balance, loan.interest_rate)?;

    let payoff;
    if scheduled < interest_on_balance {
        // divergent: cost the balance as if it amortized over the
        // synthetic term rather than simulating unbounded growth
        let synthetic = annuity_payment(balance, loan.interest_rate, SYNTHETIC_TERM_MONTHS);
        let future_interest =
            (synthetic * Decimal::from(SYNTHETIC_TERM_MONTHS) - balance).clamp_non_negative();
        total_interest += future_interest;
        payoff = PayoffOutcome::NeverPaysOff {
            synthetic_term_months: SYNTHETIC_TERM_MONTHS,
        };
    } else {
        let mut remaining = balance;
        let mut months = 0;
        while remaining > PAYOFF_EPSILON && months < MAX_SIMULATION_MONTHS {
            let interest = monthly.periodic_interest(remaining, loan.interest_rate)?;
            total_interest += interest;
            remaining = (remaining + interest - scheduled).clamp_non_negative();
            months += 1;
        }
        payoff = if remaining <= PAYOFF_EPSILON {
            PayoffOutcome::AmortizesInFull { months }
        } else {
            PayoffOutcome::CappedAtHorizon { months }
        };
    }

    Ok(CostProjection {
        total_interest,
        total_cost: loan.principal + total_interest,
        payoff,
    })
}
