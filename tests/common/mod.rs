#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cbr_rates::Ingestor;
use cbr_rates::feed::CbrClient;
use cbr_rates::store::MemoryRateStore;
use chrono::NaiveDate;
use encoding_rs::WINDOWS_1251;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FEED_PATH: &str = "/scripts/XML_daily.asp";

/// Feed for Saturday 02.03.2024 with three good entries and one without a value.
pub const SATURDAY_FEED: &str = r#"<?xml version="1.0" encoding="windows-1251"?>
<ValCurs Date="02.03.2024" name="Foreign Currency Market">
<Valute ID="R01235"><NumCode>840</NumCode><CharCode>USD</CharCode><Nominal>1</Nominal><Name>Доллар США</Name><Value>91,3336</Value><VunitRate>91,3336</VunitRate></Valute>
<Valute ID="R01239"><NumCode>978</NumCode><CharCode>EUR</CharCode><Nominal>1</Nominal><Name>Евро</Name><Value>98,7015</Value><VunitRate>98,7015</VunitRate></Valute>
<Valute ID="R01820"><NumCode>392</NumCode><CharCode>JPY</CharCode><Nominal>100</Nominal><Name>Японских иен</Name><Value>60,8466</Value><VunitRate>0,608466</VunitRate></Valute>
<Valute ID="R01375"><NumCode>156</NumCode><CharCode>CNY</CharCode><Nominal>1</Nominal><Name>Китайский юань</Name></Valute>
</ValCurs>"#;

pub fn cp1251(xml: &str) -> Vec<u8> {
    WINDOWS_1251.encode(xml).0.into_owned()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn mount_feed(server: &MockServer, date_req: &str, body: Vec<u8>, times: u64) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("date_req", date_req))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml; charset=windows-1251")
                .set_body_bytes(body),
        )
        .expect(times)
        .mount(server)
        .await;
}

pub fn client(server: &MockServer) -> CbrClient {
    CbrClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

pub fn ingestor(server: &MockServer) -> (Ingestor, Arc<MemoryRateStore>) {
    let store = Arc::new(MemoryRateStore::new());
    let ingestor = Ingestor::new(Arc::new(client(server)), store.clone());
    (ingestor, store)
}
