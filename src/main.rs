use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use cbr_rates::config::Config;
use cbr_rates::feed::CbrClient;
use cbr_rates::store::PgRateStore;
use cbr_rates::{Ingestor, api};
use log::info;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let store = Arc::new(
        PgRateStore::connect(&config.database_url, config.max_connections)
            .await
            .context("Can't connect to the database")?,
    );
    store.migrate().await.context("Can't apply migrations")?;

    let feed = Arc::new(CbrClient::new(&config.cbr_base_url, config.fetch_timeout)?);
    let ingestor = web::Data::new(Ingestor::new(feed, store.clone()));

    info!("Listening on {}", config.bind_addr);
    let served = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(ingestor.clone())
            .configure(api::configure)
    })
    .bind(&config.bind_addr)
    .with_context(|| format!("Can't bind {}", config.bind_addr))?
    .run()
    .await;

    store.close().await;
    served?;

    Ok(())
}
