pub mod api;
pub mod config;
pub mod exchange_rate;
pub mod feed;
pub mod ingest;
pub mod store;
pub mod val_curs;

pub use exchange_rate::ExchangeRate;
pub use ingest::{IngestError, Ingestor};
