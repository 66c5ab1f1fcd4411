use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::types::AccrualMethod;

/// average month length in days, for span-based monthly accrual
const DAYS_PER_MONTH: Decimal = dec!(30.44);

/// whole days between two dates
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Result<i64> {
    if end < start {
        return Err(EngineError::InvalidDateRange { start, end });
    }
    Ok((end - start).num_days())
}

/// calendar months crossed between two dates, ignoring day-of-month
pub fn whole_months_between(start: NaiveDate, end: NaiveDate) -> Result<i64> {
    if end < start {
        return Err(EngineError::InvalidDateRange { start, end });
    }
    let months =
        (end.year() as i64 - start.year() as i64) * 12 + (end.month() as i64 - start.month() as i64);
    Ok(months.max(0))
}

/// fractional months spanned, on the average-month convention
pub fn fractional_months(start: NaiveDate, end: NaiveDate) -> Result<Decimal> {
    let days = days_between(start, end)?;
    Ok(Decimal::from(days) / DAYS_PER_MONTH)
}

/// engine for computing interest owed on a balance over a date range
#[derive(Debug, Clone, Copy)]
pub struct AccrualEngine {
    pub method: AccrualMethod,
}

impl AccrualEngine {
    pub fn new(method: AccrualMethod) -> Self {
        Self { method }
    }

    /// interest owed on `balance` over `[start, end]`
    ///
    /// Daily accrual charges `rate / 365.25` per whole day elapsed. Monthly
    /// accrual charges `rate / 12` per calendar month crossed, so a span from
    /// Jan 28 to Feb 2 counts as one month.
    pub fn interest_owed(
        &self,
        balance: Money,
        annual_rate: Rate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Money> {
        self.validate(balance, annual_rate, start, end)?;
        if balance.is_zero() || annual_rate.is_zero() {
            return Ok(Money::ZERO);
        }

        let periods = match self.method {
            AccrualMethod::Daily => Decimal::from(days_between(start, end)?),
            AccrualMethod::Monthly => Decimal::from(whole_months_between(start, end)?),
        };

        self.charge(balance, annual_rate, periods)
    }

    /// span variant used by the date-range helpers: monthly accrual is
    /// prorated as `days / 30.44` so uneven bins are charged for their
    /// actual length
    pub fn interest_over_span(
        &self,
        balance: Money,
        annual_rate: Rate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Money> {
        self.validate(balance, annual_rate, start, end)?;
        if balance.is_zero() || annual_rate.is_zero() {
            return Ok(Money::ZERO);
        }

        let periods = match self.method {
            AccrualMethod::Daily => Decimal::from(days_between(start, end)?),
            AccrualMethod::Monthly => fractional_months(start, end)?,
        };

        self.charge(balance, annual_rate, periods)
    }

    /// interest for one whole period at this engine's convention
    pub fn periodic_interest(&self, balance: Money, annual_rate: Rate) -> Result<Money> {
        if balance.is_negative() {
            return Err(EngineError::NegativeAmount { amount: balance });
        }
        if annual_rate.is_negative() {
            return Err(EngineError::NegativeRate { rate: annual_rate });
        }
        self.charge(balance, annual_rate, Decimal::ONE)
    }

    fn validate(
        &self,
        balance: Money,
        annual_rate: Rate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<()> {
        if balance.is_negative() {
            return Err(EngineError::NegativeAmount { amount: balance });
        }
        if annual_rate.is_negative() {
            return Err(EngineError::NegativeRate { rate: annual_rate });
        }
        if end < start {
            return Err(EngineError::InvalidDateRange { start, end });
        }
        Ok(())
    }

    fn charge(&self, balance: Money, annual_rate: Rate, periods: Decimal) -> Result<Money> {
        let rate_per_period = match self.method {
            AccrualMethod::Daily => annual_rate.daily(),
            AccrualMethod::Monthly => annual_rate.monthly(),
        };

        let interest = balance
            .as_decimal()
            .checked_mul(rate_per_period)
            .and_then(|i| i.checked_mul(periods))
            .ok_or_else(|| EngineError::overflow("interest accrual"))?;

        Ok(Money::from_decimal(interest))
    }
}
