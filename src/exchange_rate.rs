use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single quotation: `rate` roubles per `nominal` units of `currency_code`
/// on `date`. `(date, currency_code)` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExchangeRate {
    pub date: NaiveDate,
    pub currency_code: String,
    pub name: String,
    pub rate: Decimal,
    pub nominal: i32,
}

/// Why a feed entry did not become an [`ExchangeRate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("entry is not well-formed: {0}")]
    Malformed(String),
    #[error("missing <{0}>")]
    MissingField(&'static str),
    #[error("currency code {0:?} is not three letters")]
    InvalidCode(String),
    #[error("currency name is empty")]
    EmptyName,
    #[error("nominal {0:?} is not a positive integer")]
    InvalidNominal(String),
    #[error("value {0:?} is not a positive decimal")]
    InvalidRate(String),
}

impl ExchangeRate {
    /// Normalizes raw feed text into a record, or says why it can't.
    pub fn parse(
        date: NaiveDate,
        code: &str,
        name: &str,
        nominal: &str,
        value: &str,
    ) -> Result<Self, Rejection> {
        let currency_code = code.trim().to_uppercase();
        if currency_code.len() != 3 || !currency_code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(Rejection::InvalidCode(code.to_string()));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(Rejection::EmptyName);
        }

        let nominal = match nominal.trim().parse::<i32>() {
            Ok(n) if n > 0 => n,
            _ => return Err(Rejection::InvalidNominal(nominal.to_string())),
        };

        let rate = match normalize_decimal_string(value.trim()).parse::<Decimal>() {
            Ok(r) if r > Decimal::ZERO => r,
            _ => return Err(Rejection::InvalidRate(value.to_string())),
        };

        Ok(Self {
            date,
            currency_code,
            name: name.to_string(),
            rate,
            nominal,
        })
    }
}

fn normalize_decimal_string(s: &str) -> String {
    s.replace(',', ".")
}
