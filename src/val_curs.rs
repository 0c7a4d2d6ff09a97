//! Decoding of the central bank `XML_daily` document.
//!
//! The feed is served as Windows-1251 and looks like:
//!
//! ```xml
//! <ValCurs Date="02.03.2024" name="Foreign Currency Market">
//!     <Valute ID="R01235">
//!         <NumCode>840</NumCode>
//!         <CharCode>USD</CharCode>
//!         <Nominal>1</Nominal>
//!         <Name>Доллар США</Name>
//!         <Value>91,3336</Value>
//!         <VunitRate>91,3336</VunitRate>
//!     </Valute>
//! </ValCurs>
//! ```

use chrono::NaiveDate;
use encoding_rs::WINDOWS_1251;
use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::Event;
use quick_xml::events::attributes::AttrError;
use serde::Deserialize;
use thiserror::Error;

use crate::exchange_rate::{ExchangeRate, Rejection};

const ROOT: &str = "ValCurs";
const ENTRY: &[u8] = b"Valute";

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Valute {
    #[serde(rename = "CharCode")]
    pub char_code: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Nominal")]
    pub nominal: Option<String>,
    #[serde(rename = "Value")]
    pub value: Option<String>,
}

/// The document as a whole could not be read. Distinct from a readable
/// document that happens to hold no entries.
#[derive(Debug, Error)]
pub enum MalformedFeed {
    #[error("feed is not valid windows-1251 text")]
    Undecodable,
    #[error("feed contains no root element")]
    Empty,
    #[error("expected <{ROOT}> root element, found <{0}>")]
    UnexpectedRoot(String),
    #[error("feed ends before </{ROOT}>")]
    Truncated,
    #[error("feed is not well-formed xml: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("invalid attribute on <{ROOT}>: {0}")]
    Attribute(#[from] AttrError),
}

/// Result of parsing one feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    /// Date reported by the feed, or the fallback when it reports none.
    pub date: NaiveDate,
    /// Valid records in feed order, all dated `date`.
    pub rates: Vec<ExchangeRate>,
    /// Entries dropped because they failed validation.
    pub skipped: usize,
}

/// Parses raw feed bytes. Bad entries are skipped and counted; only a
/// document-level failure is an error.
///
/// The document is walked event by event and each `<Valute>` subtree is
/// deserialized on its own, so a structurally broken entry costs only
/// itself.
pub fn parse(raw: &[u8], fallback_date: NaiveDate) -> Result<ParsedFeed, MalformedFeed> {
    let text = WINDOWS_1251
        .decode_without_bom_handling_and_without_replacement(raw)
        .ok_or(MalformedFeed::Undecodable)?;

    let mut reader = Reader::from_str(&text);
    let (date_attr, has_entries) = read_root(&mut reader)?;
    let date = feed_date(date_attr.as_deref()).unwrap_or(fallback_date);

    let mut rates = Vec::new();
    let mut skipped = 0;
    let mut index = 0;
    while has_entries {
        let entry = match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == ENTRY => {
                let span = reader.read_to_end(e.name())?;
                Valute::from_xml(&text[span.start as usize..span.end as usize])
            }
            Event::Empty(e) if e.name().as_ref() == ENTRY => Ok(Valute::default()),
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
                continue;
            }
            Event::End(_) => break,
            Event::Eof => return Err(MalformedFeed::Truncated),
            _ => continue,
        };

        match entry.and_then(|valute| valute.to_exchange_rate(date)) {
            Ok(rate) => rates.push(rate),
            Err(rejection) => {
                warn!("Skipping feed entry #{index}: {rejection}");
                skipped += 1;
            }
        }
        index += 1;
    }

    debug!(
        "Parsed feed dated {date}: {} rates, {skipped} skipped",
        rates.len()
    );

    Ok(ParsedFeed {
        date,
        rates,
        skipped,
    })
}

impl Valute {
    /// Deserializes the inner markup of one `<Valute>` element.
    fn from_xml(inner: &str) -> Result<Self, Rejection> {
        quick_xml::de::from_str(&format!("<Valute>{inner}</Valute>"))
            .map_err(|e| Rejection::Malformed(e.to_string()))
    }

    fn to_exchange_rate(&self, date: NaiveDate) -> Result<ExchangeRate, Rejection> {
        ExchangeRate::parse(
            date,
            required(&self.char_code, "CharCode")?,
            required(&self.name, "Name")?,
            required(&self.nominal, "Nominal")?,
            required(&self.value, "Value")?,
        )
    }
}

fn required<'a>(field: &'a Option<String>, tag: &'static str) -> Result<&'a str, Rejection> {
    field.as_deref().ok_or(Rejection::MissingField(tag))
}

fn feed_date(attr: Option<&str>) -> Option<NaiveDate> {
    let attr = attr?.trim();
    match NaiveDate::parse_from_str(attr, "%d.%m.%Y") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Unparsable feed date {attr:?}: {e}");
            None
        }
    }
}

/// Reads up to the root element and returns its `Date` attribute and
/// whether it has content to walk.
fn read_root(reader: &mut Reader<&[u8]>) -> Result<(Option<String>, bool), MalformedFeed> {
    loop {
        let (root, has_entries) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::Eof => return Err(MalformedFeed::Empty),
            _ => continue,
        };

        if root.name().as_ref() != ROOT.as_bytes() {
            return Err(MalformedFeed::UnexpectedRoot(
                String::from_utf8_lossy(root.name().as_ref()).into_owned(),
            ));
        }

        let date = match root.try_get_attribute("Date")? {
            Some(attr) => Some(attr.decode_and_unescape_value(reader.decoder())?.into_owned()),
            None => None,
        };
        return Ok((date, has_entries));
    }
}
