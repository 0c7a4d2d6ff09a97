use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{RateStore, StoreError};
use crate::exchange_rate::ExchangeRate;

// Same limits as the currency_rates table.
const NAME_MAX_CHARS: usize = 100;
const RATE_MAX_SCALE: u32 = 6;

/// In-process store with the same key and column rules as the Postgres
/// table. A whole batch is applied under one lock.
#[derive(Default)]
pub struct MemoryRateStore {
    rows: Mutex<BTreeMap<(NaiveDate, String), ExchangeRate>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

fn fits_table(rate: &ExchangeRate) -> bool {
    rate.name.chars().count() <= NAME_MAX_CHARS
        && rate.nominal > 0
        && rate.rate > Decimal::ZERO
        && rate.rate.trunc() < Decimal::from(1_000_000_000_000_i64)
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn lookup(&self, date: NaiveDate) -> Result<Vec<ExchangeRate>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .range((date, String::new())..)
            .take_while(|((d, _), _)| *d == date)
            .map(|(_, rate)| rate.clone())
            .collect())
    }

    async fn upsert(&self, rates: &[ExchangeRate]) -> Result<u64, StoreError> {
        if rates.is_empty() {
            return Ok(0);
        }

        let mut rows = self.rows.lock().await;
        let mut affected = 0;
        for rate in rates {
            let mut stored = rate.clone();
            stored.rate = stored.rate.round_dp(RATE_MAX_SCALE);
            if !fits_table(&stored) {
                warn!(
                    "Rejected rate {} for {}: out of range",
                    rate.currency_code, rate.date
                );
                continue;
            }
            rows.insert((rate.date, rate.currency_code.clone()), stored);
            affected += 1;
        }
        debug!("Upserted {affected} of {} rates", rates.len());
        Ok(affected)
    }
}
