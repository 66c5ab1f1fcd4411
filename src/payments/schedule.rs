use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::interest::whole_months_between;
use crate::loan::Loan;

/// the periodic payment a loan resolves to
///
/// A stated minimum payment governs open-term loans; fixed-term loans fall
/// back to the annuity payment on the starting principal. A loan with
/// neither has no deterministic scheduled amount and resolves to zero.
pub fn scheduled_payment(loan: &Loan) -> Money {
    match loan.minimum_payment {
        Some(minimum) if minimum.is_positive() => minimum,
        _ if loan.term_months > 0 => {
            annuity_payment(loan.principal, loan.interest_rate, loan.term_months)
        }
        _ => Money::ZERO,
    }
}

/// standard annuity payment: P * r * (1+r)^n / ((1+r)^n - 1)
pub fn annuity_payment(principal: Money, annual_rate: Rate, months: u32) -> Money {
    if months == 0 {
        return Money::ZERO;
    }

    let r = annual_rate.monthly();
    if r.is_zero() {
        return principal / Decimal::from(months);
    }

    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..months {
        compound *= base;
    }

    let numerator = principal.as_decimal() * r * compound;
    let denominator = compound - Decimal::ONE;

    Money::from_decimal(numerator / denominator)
}

/// the k-th payment due date, stepping whole months from the first due date
/// pinned to the loan's due day (clamped to short months)
pub fn payment_due_date(loan: &Loan, k: u32) -> NaiveDate {
    if k == 0 {
        return loan.first_payment_due_date;
    }
    add_months_clamped(loan.first_payment_due_date, k, loan.payment_due_day as u32)
}

/// the latest due date on or before `as_of`; None before the first due date
pub fn previous_due_date(loan: &Loan, as_of: NaiveDate) -> Option<NaiveDate> {
    if as_of < loan.first_payment_due_date {
        return None;
    }

    // month-count guess lands at or just past as_of, then walk back
    let guess = whole_months_between(loan.first_payment_due_date, as_of)
        .unwrap_or(0)
        .max(0) as u32;
    let mut k = guess + 1;
    while k > 0 && payment_due_date(loan, k) > as_of {
        k -= 1;
    }

    Some(payment_due_date(loan, k))
}

/// the earliest due date strictly after `as_of`
pub fn next_due_date(loan: &Loan, as_of: NaiveDate) -> NaiveDate {
    match previous_due_date(loan, as_of) {
        None => loan.first_payment_due_date,
        Some(previous) => {
            let mut k = 1;
            while payment_due_date(loan, k) <= previous {
                k += 1;
            }
            payment_due_date(loan, k)
        }
    }
}

/// a payment is late once it falls after the due date preceding it
pub fn is_payment_late(loan: &Loan, payment_date: NaiveDate) -> bool {
    match previous_due_date(loan, payment_date) {
        Some(due) => payment_date > due,
        None => false,
    }
}

/// days past the preceding due date, floored at zero
pub fn days_late(loan: &Loan, payment_date: NaiveDate) -> i64 {
    previous_due_date(loan, payment_date)
        .map(|due| (payment_date - due).num_days().max(0))
        .unwrap_or(0)
}

/// add whole months, pinning the day-of-month and clamping to month length
pub(crate) fn add_months_clamped(date: NaiveDate, months: u32, pin_day: u32) -> NaiveDate {
    let total = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
    let year = total.div_euclid(12) as i32;
    let month = total.rem_euclid(12) as u32 + 1;
    let day = pin_day.max(1).min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).expect("day clamped to month length")
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccrualMethod, LoanKind};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixed_term_loan(term_months: u32) -> Loan {
        Loan::builder()
            .principal(Money::from_major(24_000))
            .interest_rate(Rate::from_percentage(dec!(6)))
            .term_months(term_months)
            .kind(LoanKind::Auto)
            .accrual_method(AccrualMethod::Monthly)
            .disbursement_date(date(2024, 1, 1))
            .first_payment_due_date(date(2024, 2, 1))
            .payment_due_day(1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_annuity_payment_standard_case() {
        let payment = annuity_payment(Money::from_major(24_000), Rate::from_percentage(dec!(6)), 60);
        assert_eq!(payment.round_dp(2), Money::from_str_exact("463.99").unwrap());
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        let payment = annuity_payment(Money::from_major(12_000), Rate::ZERO, 24);
        assert_eq!(payment, Money::from_major(500));
    }

    #[test]
    fn test_annuity_payment_zero_term() {
        assert_eq!(
            annuity_payment(Money::from_major(12_000), Rate::from_percentage(dec!(6)), 0),
            Money::ZERO
        );
    }

    #[test]
    fn test_scheduled_payment_prefers_stated_minimum() {
        let loan = Loan::builder()
            .principal(Money::from_major(8_000))
            .interest_rate(Rate::from_percentage(dec!(19.99)))
            .minimum_payment(Money::from_major(200))
            .kind(LoanKind::CreditCard)
            .accrual_method(AccrualMethod::Daily)
            .disbursement_date(date(2024, 1, 1))
            .first_payment_due_date(date(2024, 2, 1))
            .payment_due_day(1)
            .build()
            .unwrap();

        assert_eq!(scheduled_payment(&loan), Money::from_major(200));
    }

    #[test]
    fn test_scheduled_payment_falls_back_to_annuity() {
        let loan = fixed_term_loan(60);
        assert_eq!(
            scheduled_payment(&loan).round_dp(2),
            Money::from_str_exact("463.99").unwrap()
        );
    }

    #[test]
    fn test_scheduled_payment_unresolvable_is_zero() {
        let loan = Loan::builder()
            .principal(Money::from_major(1_000))
            .interest_rate(Rate::from_percentage(dec!(5)))
            .kind(LoanKind::Personal)
            .accrual_method(AccrualMethod::Monthly)
            .disbursement_date(date(2024, 1, 1))
            .first_payment_due_date(date(2024, 2, 1))
            .payment_due_day(1)
            .build()
            .unwrap();

        assert_eq!(scheduled_payment(&loan), Money::ZERO);
    }

    #[test]
    fn test_due_date_stepping_pins_to_short_months() {
        let loan = Loan::builder()
            .principal(Money::from_major(10_000))
            .interest_rate(Rate::from_percentage(dec!(5)))
            .term_months(12)
            .kind(LoanKind::Personal)
            .accrual_method(AccrualMethod::Monthly)
            .disbursement_date(date(2024, 1, 1))
            .first_payment_due_date(date(2024, 1, 31))
            .payment_due_day(31)
            .build()
            .unwrap();

        assert_eq!(payment_due_date(&loan, 0), date(2024, 1, 31));
        assert_eq!(payment_due_date(&loan, 1), date(2024, 2, 29)); // leap year
        assert_eq!(payment_due_date(&loan, 3), date(2024, 4, 30));
        assert_eq!(payment_due_date(&loan, 12), date(2025, 1, 31));
        assert_eq!(payment_due_date(&loan, 13), date(2025, 2, 28));
    }

    #[test]
    fn test_previous_and_next_due_dates() {
        let loan = fixed_term_loan(60);

        // before the first due date there is no preceding one
        assert_eq!(previous_due_date(&loan, date(2024, 1, 15)), None);
        assert_eq!(next_due_date(&loan, date(2024, 1, 15)), date(2024, 2, 1));

        // exactly on a due date
        assert_eq!(previous_due_date(&loan, date(2024, 3, 1)), Some(date(2024, 3, 1)));
        assert_eq!(next_due_date(&loan, date(2024, 3, 1)), date(2024, 4, 1));

        // mid-cycle
        assert_eq!(previous_due_date(&loan, date(2024, 3, 20)), Some(date(2024, 3, 1)));
        assert_eq!(next_due_date(&loan, date(2024, 3, 20)), date(2024, 4, 1));
    }

    #[test]
    fn test_lateness() {
        let loan = fixed_term_loan(60);

        assert!(!is_payment_late(&loan, date(2024, 1, 20)));
        assert!(!is_payment_late(&loan, date(2024, 2, 1)));
        assert!(is_payment_late(&loan, date(2024, 2, 10)));

        assert_eq!(days_late(&loan, date(2024, 1, 20)), 0);
        assert_eq!(days_late(&loan, date(2024, 2, 1)), 0);
        assert_eq!(days_late(&loan, date(2024, 2, 10)), 9);
    }
}
