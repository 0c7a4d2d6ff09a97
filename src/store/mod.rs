pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::exchange_rate::ExchangeRate;

pub use memory::MemoryRateStore;
pub use postgres::PgRateStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Persistence for exchange rates keyed by `(date, currency_code)`.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// All rates stored for `date`, ordered by currency code.
    async fn lookup(&self, date: NaiveDate) -> Result<Vec<ExchangeRate>, StoreError>;

    /// Inserts each rate or replaces the stored one with the same key.
    /// A rate the storage refuses is dropped on its own; the returned count
    /// is the number of rates actually written.
    async fn upsert(&self, rates: &[ExchangeRate]) -> Result<u64, StoreError>;
}
