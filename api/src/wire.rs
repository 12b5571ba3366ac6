//! Lenient field decoders for the league API.
//!
//! Codes come back as strings from most endpoints but as numbers from a few,
//! and dates arrive either as plain dates or as full ISO-8601 timestamps.
use chrono::{DateTime, NaiveDate};
use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCode {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<RawCode> for String {
    fn from(raw: RawCode) -> Self {
        match raw {
            RawCode::Text(s) => s,
            RawCode::Int(n) => n.to_string(),
            RawCode::Float(n) => n.to_string(),
        }
    }
}

pub fn code<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawCode::deserialize(d).map(String::from)
}

pub fn optional_code<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawCode>::deserialize(d)?.map(String::from))
}

pub fn optional_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(d)? else {
        return Ok(None);
    };
    parse_date(&raw).map(Some).map_err(de::Error::custom)
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|e| format!("invalid date {raw:?}: {e}"))
}
