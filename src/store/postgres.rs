use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{RateStore, StoreError};
use crate::exchange_rate::ExchangeRate;

const SELECT_BY_DATE: &str = "
    SELECT date, currency_code, name, rate, nominal
    FROM currency_rates
    WHERE date = $1
    ORDER BY currency_code";

const UPSERT: &str = "
    INSERT INTO currency_rates (date, currency_code, name, rate, nominal)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (date, currency_code) DO UPDATE SET
        name = excluded.name,
        rate = excluded.rate,
        nominal = excluded.nominal";

/// Postgres-backed store. Uniqueness is enforced by the table's primary key
/// and conflicts are resolved inside the `INSERT`, so concurrent ingestions
/// of the same date cannot produce duplicates.
pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Connected to database");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn lookup(&self, date: NaiveDate) -> Result<Vec<ExchangeRate>, StoreError> {
        let rates = sqlx::query_as::<_, ExchangeRate>(SELECT_BY_DATE)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        debug!("Found {} stored rates for {date}", rates.len());
        Ok(rates)
    }

    async fn upsert(&self, rates: &[ExchangeRate]) -> Result<u64, StoreError> {
        if rates.is_empty() {
            return Ok(0);
        }

        // One savepoint per row: a row the database refuses is rolled back
        // alone and the rest of the batch still commits.
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;

        for rate in rates {
            sqlx::query("SAVEPOINT upsert_rate").execute(&mut *tx).await?;

            let result = sqlx::query(UPSERT)
                .bind(rate.date)
                .bind(&rate.currency_code)
                .bind(&rate.name)
                .bind(rate.rate)
                .bind(rate.nominal)
                .execute(&mut *tx)
                .await;

            match result {
                Ok(done) => {
                    sqlx::query("RELEASE SAVEPOINT upsert_rate")
                        .execute(&mut *tx)
                        .await?;
                    affected += done.rows_affected();
                }
                Err(sqlx::Error::Database(e)) => {
                    warn!(
                        "Rejected rate {} for {}: {e}",
                        rate.currency_code, rate.date
                    );
                    sqlx::query("ROLLBACK TO SAVEPOINT upsert_rate")
                        .execute(&mut *tx)
                        .await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;
        debug!("Upserted {affected} of {} rates", rates.len());
        Ok(affected)
    }
}
