use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};
use thiserror::Error;

use crate::exchange_rate::ExchangeRate;
use crate::feed::{FeedSource, FetchError};
use crate::store::{RateStore, StoreError};
use crate::val_curs::{self, MalformedFeed};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    MalformedFeed(#[from] MalformedFeed),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Read-through cache over the daily feed: serve a date from storage, and
/// only on a miss download, parse and persist it.
///
/// No retries happen here. Overlapping runs for the same date are safe
/// because [`RateStore::upsert`] is atomic per key.
pub struct Ingestor {
    feed: Arc<dyn FeedSource>,
    store: Arc<dyn RateStore>,
}

impl Ingestor {
    pub fn new(feed: Arc<dyn FeedSource>, store: Arc<dyn RateStore>) -> Self {
        Self { feed, store }
    }

    /// Rates for `date`. On a cache miss the result is keyed by the date the
    /// feed itself reports, which is earlier than `date` on non-trading days.
    pub async fn run(&self, date: NaiveDate) -> Result<Vec<ExchangeRate>, IngestError> {
        let cached = self.store.lookup(date).await?;
        if !cached.is_empty() {
            debug!("Returning {} stored rates for {date}", cached.len());
            return Ok(cached);
        }

        info!("No stored rates for {date}, fetching feed");
        let raw = self.feed.fetch(date).await?;
        let parsed = val_curs::parse(&raw, date)?;

        if parsed.skipped > 0 {
            warn!(
                "Feed for {date} had {} malformed entries",
                parsed.skipped
            );
        }
        if parsed.rates.is_empty() {
            info!("Feed for {date} has no rates");
            return Ok(Vec::new());
        }

        let affected = self.store.upsert(&parsed.rates).await?;
        info!(
            "Saved {affected} of {} rates dated {}",
            parsed.rates.len(),
            parsed.date
        );

        Ok(self.store.lookup(parsed.date).await?)
    }
}
