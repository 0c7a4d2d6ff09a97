mod common;

use cbr_rates::IngestError;
use cbr_rates::feed::FetchError;
use cbr_rates::store::RateStore;
use common::{SATURDAY_FEED, cp1251, date, mount_feed};
use rust_decimal::Decimal;
use std::str::FromStr;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test_log::test(tokio::test)]
async fn miss_fetches_and_stores_then_hit_skips_network() {
    let server = MockServer::start().await;
    mount_feed(&server, "02/03/2024", cp1251(SATURDAY_FEED), 1).await;
    let (ingestor, store) = common::ingestor(&server);

    let first = ingestor.run(date(2024, 3, 2)).await.unwrap();
    let second = ingestor.run(date(2024, 3, 2)).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(store.len().await, 3);
    let usd = first.iter().find(|r| r.currency_code == "USD").unwrap();
    assert_eq!(usd.name, "Доллар США");
    assert_eq!(usd.rate, Decimal::from_str("91.3336").unwrap());
}

#[test_log::test(tokio::test)]
async fn non_trading_day_is_keyed_by_feed_date() {
    let server = MockServer::start().await;
    // Sunday request; the feed answers with Saturday's quotation.
    mount_feed(&server, "03/03/2024", cp1251(SATURDAY_FEED), 1).await;
    let (ingestor, store) = common::ingestor(&server);

    let rates = ingestor.run(date(2024, 3, 3)).await.unwrap();

    assert_eq!(rates.len(), 3);
    assert!(rates.iter().all(|r| r.date == date(2024, 3, 2)));
    assert!(store.lookup(date(2024, 3, 3)).await.unwrap().is_empty());
    assert_eq!(store.lookup(date(2024, 3, 2)).await.unwrap(), rates);
}

#[test_log::test(tokio::test)]
async fn empty_feed_is_an_empty_result() {
    let server = MockServer::start().await;
    let feed = r#"<?xml version="1.0" encoding="windows-1251"?><ValCurs Date="01.01.2030" name="Foreign Currency Market"></ValCurs>"#;
    mount_feed(&server, "01/01/2030", cp1251(feed), 1).await;
    let (ingestor, store) = common::ingestor(&server);

    let rates = ingestor.run(date(2030, 1, 1)).await.unwrap();

    assert!(rates.is_empty());
    assert!(store.is_empty().await);
}

#[test_log::test(tokio::test)]
async fn upstream_failure_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let (ingestor, store) = common::ingestor(&server);

    let err = ingestor.run(date(2024, 3, 2)).await.unwrap_err();

    assert!(
        matches!(err, IngestError::Fetch(FetchError::Upstream { .. })),
        "{err:?}"
    );
    assert!(store.is_empty().await);
}

#[test_log::test(tokio::test)]
async fn malformed_feed_leaves_store_untouched() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "02/03/2024",
        cp1251(r#"<ValCurs Date="02.03.2024"><Valute><CharCode>USD"#),
        1,
    )
    .await;
    let (ingestor, store) = common::ingestor(&server);

    let err = ingestor.run(date(2024, 3, 2)).await.unwrap_err();

    assert!(matches!(err, IngestError::MalformedFeed(_)), "{err:?}");
    assert!(store.is_empty().await);
}

#[test_log::test(tokio::test)]
async fn overlapping_runs_for_same_date_do_not_duplicate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(cp1251(SATURDAY_FEED)))
        .mount(&server)
        .await;
    let (ingestor, store) = common::ingestor(&server);

    let (a, b) = tokio::join!(
        ingestor.run(date(2024, 3, 2)),
        ingestor.run(date(2024, 3, 2))
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(store.len().await, 3);
}
