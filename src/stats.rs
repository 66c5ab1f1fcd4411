use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;

use crate::decimal::Money;
use crate::errors::Result;
use crate::loan::{Loan, Payment};
use crate::payments::apply::apply_payment;
use crate::types::LoanStatistics;

/// running state of a payment-history fold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayState {
    pub balance: Money,
    pub last_payment_date: Option<NaiveDate>,
    pub total_paid: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
}

impl ReplayState {
    fn opening(loan: &Loan) -> Self {
        Self {
            balance: loan.principal,
            last_payment_date: None,
            total_paid: Money::ZERO,
            principal_paid: Money::ZERO,
            interest_paid: Money::ZERO,
        }
    }
}

/// fold a loan's payment history to its current balance and totals
///
/// This is the one replay every consumer shares: the statistics aggregator,
/// the cost estimator, and `Payment::record` all fold through here so the
/// balance can never be derived three different ways. Payments may arrive
/// unordered (they are sorted by date first); payments belonging to other
/// loans are skipped.
pub fn replay_history(loan: &Loan, payments: &[Payment]) -> Result<ReplayState> {
    let mut history: Vec<&Payment> =
        payments.iter().filter(|p| p.loan_id == loan.id).collect();
    history.sort_by_key(|p| p.payment_date);

    let mut state = ReplayState::opening(loan);
    for payment in history {
        let application = apply_payment(
            state.balance,
            payment.amount,
            payment.payment_date,
            loan,
            state.last_payment_date,
        )?;

        state.balance = application.new_balance;
        state.last_payment_date = Some(payment.payment_date);
        state.total_paid += payment.amount;
        state.principal_paid += application.principal_paid;
        state.interest_paid += application.interest_paid;
    }

    Ok(state)
}

/// interest accrued between the last payment (or the interest start) and
/// `today`; zero while the accrual gate is closed
pub(crate) fn accrued_since_last_payment(
    loan: &Loan,
    state: &ReplayState,
    today: NaiveDate,
) -> Result<Money> {
    if !loan.interest_accrues_on(today) {
        return Ok(Money::ZERO);
    }

    let start = state
        .last_payment_date
        .map(|d| d.max(loan.interest_start_date))
        .unwrap_or(loan.interest_start_date);
    if today <= start {
        return Ok(Money::ZERO);
    }

    loan.accrual_engine()
        .interest_owed(state.balance, loan.interest_rate, start, today)
}

/// current aggregate totals for a loan
///
/// `remaining_balance` includes interest accrued since the last payment up
/// to now; that unbilled interest is displayed but not counted as paid.
pub fn loan_statistics(
    loan: &Loan,
    payments: &[Payment],
    time: &SafeTimeProvider,
) -> Result<LoanStatistics> {
    let state = replay_history(loan, payments)?;
    let today = time.now().date_naive();
    let accrued = accrued_since_last_payment(loan, &state, today)?;

    Ok(LoanStatistics {
        total_paid: state.total_paid,
        principal_paid: state.principal_paid,
        interest_paid: state.interest_paid,
        remaining_balance: state.balance + accrued,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::payments::schedule::{annuity_payment, payment_due_date};
    use crate::types::{AccrualMethod, LoanKind};
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock_at(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap(),
        ))
    }

    fn daily_loan() -> Loan {
        Loan::builder()
            .principal(Money::from_major(5_000))
            .interest_rate(Rate::from_percentage(dec!(5)))
            .minimum_payment(Money::from_major(100))
            .kind(LoanKind::Personal)
            .accrual_method(AccrualMethod::Daily)
            .disbursement_date(date(2024, 1, 1))
            .first_payment_due_date(date(2024, 3, 1))
            .payment_due_day(1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_history() {
        let loan = daily_loan();
        let time = clock_at(2024, 1, 1);

        let stats = loan_statistics(&loan, &[], &time).unwrap();
        assert_eq!(stats.total_paid, Money::ZERO);
        assert_eq!(stats.principal_paid, Money::ZERO);
        assert_eq!(stats.interest_paid, Money::ZERO);
        assert_eq!(stats.remaining_balance, Money::from_major(5_000));
    }

    #[test]
    fn test_empty_history_accrues_to_now() {
        let loan = daily_loan();
        let time = clock_at(2024, 1, 31);

        let stats = loan_statistics(&loan, &[], &time).unwrap();
        let accrued = Money::from_decimal(dec!(5000) * dec!(0.05) / dec!(365.25) * dec!(30));
        assert_eq!(stats.remaining_balance, Money::from_major(5_000) + accrued);
        assert_eq!(stats.interest_paid, Money::ZERO);
    }

    #[test]
    fn test_fold_accumulates_and_sorts() {
        let loan = daily_loan();

        let first =
            Payment::record(&loan, &[], Money::from_major(100), date(2024, 1, 31), None).unwrap();
        let second = Payment::record(
            &loan,
            std::slice::from_ref(&first),
            Money::from_major(100),
            date(2024, 3, 1),
            None,
        )
        .unwrap();

        // hand the history over in reverse; the fold must sort it
        let history = vec![second.clone(), first.clone()];
        let time = clock_at(2024, 3, 1);
        let stats = loan_statistics(&loan, &history, &time).unwrap();

        assert_eq!(stats.total_paid, Money::from_major(200));
        assert_eq!(stats.interest_paid, first.interest_amount + second.interest_amount);
        assert_eq!(stats.principal_paid, first.principal_amount + second.principal_amount);
        assert_eq!(stats.remaining_balance, second.remaining_balance);
        assert_eq!(stats.interest_paid + stats.principal_paid, stats.total_paid);
    }

    #[test]
    fn test_foreign_payments_ignored() {
        let loan = daily_loan();
        let other_loan = daily_loan();

        let foreign = Payment::record(
            &other_loan,
            &[],
            Money::from_major(1_000),
            date(2024, 1, 15),
            None,
        )
        .unwrap();

        let time = clock_at(2024, 1, 1);
        let stats = loan_statistics(&loan, std::slice::from_ref(&foreign), &time).unwrap();
        assert_eq!(stats.total_paid, Money::ZERO);
        assert_eq!(stats.remaining_balance, Money::from_major(5_000));
    }

    #[test]
    fn test_unbilled_accrual_not_counted_as_paid() {
        let loan = daily_loan();
        let payment =
            Payment::record(&loan, &[], Money::from_major(100), date(2024, 1, 31), None).unwrap();

        // 20 days after the payment
        let time = clock_at(2024, 2, 20);
        let stats =
            loan_statistics(&loan, std::slice::from_ref(&payment), &time).unwrap();

        let accrued = Money::from_decimal(
            payment.remaining_balance.as_decimal() * dec!(0.05) / dec!(365.25) * dec!(20),
        );
        assert_eq!(stats.remaining_balance, payment.remaining_balance + accrued);
        assert_eq!(stats.interest_paid, payment.interest_amount);
    }

    #[test]
    fn test_subsidized_grace_shows_no_unbilled_interest() {
        let loan = Loan::builder()
            .principal(Money::from_major(20_000))
            .interest_rate(Rate::from_percentage(dec!(4.5)))
            .minimum_payment(Money::from_major(250))
            .kind(LoanKind::Student)
            .is_subsidized(true)
            .grace_period_months(6)
            .accrual_method(AccrualMethod::Monthly)
            .disbursement_date(date(2024, 1, 1))
            .first_payment_due_date(date(2024, 8, 1))
            .payment_due_day(1)
            .build()
            .unwrap();

        let time = clock_at(2024, 4, 1); // inside the grace window
        let stats = loan_statistics(&loan, &[], &time).unwrap();
        assert_eq!(stats.remaining_balance, Money::from_major(20_000));
    }

    #[test]
    fn test_sixty_scheduled_payments_retire_the_loan() {
        let loan = Loan::builder()
            .principal(Money::from_major(24_000))
            .interest_rate(Rate::from_percentage(dec!(6)))
            .term_months(60)
            .kind(LoanKind::Auto)
            .accrual_method(AccrualMethod::Monthly)
            .disbursement_date(date(2024, 1, 1))
            .first_payment_due_date(date(2024, 2, 1))
            .payment_due_day(1)
            .build()
            .unwrap();

        let emi = annuity_payment(loan.principal, loan.interest_rate, 60);
        assert_eq!(emi.round_dp(2), Money::from_str_exact("463.99").unwrap());

        let mut history: Vec<Payment> = Vec::new();
        for k in 0..60 {
            let due = payment_due_date(&loan, k);
            let payment = Payment::record(&loan, &history, emi, due, None).unwrap();
            history.push(payment);
        }

        let last_due = payment_due_date(&loan, 59);
        let time = clock_at(2029, 1, 1);
        assert_eq!(last_due, date(2029, 1, 1));

        let stats = loan_statistics(&loan, &history, &time).unwrap();

        // balance retired to within rounding noise
        assert!(stats.remaining_balance < Money::CENT);

        // cumulative interest matches the closed form 60 * emi - principal
        assert!(stats.interest_paid > Money::from_major(3_838));
        assert!(stats.interest_paid < Money::from_major(3_841));
        assert_eq!(stats.total_paid, emi * dec!(60));
    }
}
