use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use log::error;
use serde::Deserialize;

use crate::ingest::{IngestError, Ingestor};

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    pub date: Option<NaiveDate>,
    pub currency: Option<String>,
}

/// The feed publishes on Moscow time (UTC+3, no DST).
const FEED_UTC_OFFSET_HOURS: i64 = 3;

fn feed_today(now: DateTime<Utc>) -> NaiveDate {
    (now + TimeDelta::hours(FEED_UTC_OFFSET_HOURS)).date_naive()
}

impl ResponseError for IngestError {
    fn status_code(&self) -> StatusCode {
        match self {
            IngestError::Fetch(_) => StatusCode::SERVICE_UNAVAILABLE,
            IngestError::MalformedFeed(_) => StatusCode::BAD_GATEWAY,
            IngestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

async fn exchange_rates(
    ingestor: web::Data<Ingestor>,
    query: web::Query<RatesQuery>,
) -> Result<HttpResponse, IngestError> {
    let date = query.date.unwrap_or_else(|| feed_today(Utc::now()));

    let mut rates = ingestor.run(date).await.inspect_err(|e| {
        error!("Can't get exchange rates for {date}: {e}");
    })?;

    if let Some(code) = &query.currency {
        let code = code.trim().to_uppercase();
        rates.retain(|rate| rate.currency_code == code);
    }

    Ok(HttpResponse::Ok().json(rates))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/exchange-rates", web::get().to(exchange_rates));
}
