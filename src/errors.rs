use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("negative amount: {amount}")]
    NegativeAmount {
        amount: Money,
    },

    #[error("negative interest rate: {rate}")]
    NegativeRate {
        rate: Rate,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("payment dated {payment_date} precedes the fold cursor {cursor}")]
    OutOfOrderPayment {
        payment_date: NaiveDate,
        cursor: NaiveDate,
    },

    #[error("invalid payment due day: {day} (must be 1-31)")]
    InvalidDueDay {
        day: u8,
    },

    #[error("invalid loan configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("calculation error: {message}")]
    Calculation {
        message: String,
    },
}

impl EngineError {
    /// overflow in a decimal derivation; loud, never defaulted to zero
    pub(crate) fn overflow(context: &str) -> Self {
        EngineError::Calculation {
            message: format!("decimal overflow in {context}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
