//! PDF record and publish date.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical text layout of a publish date, e.g. `05/05/2024`.
pub const DATE_LAYOUT: &str = "%d/%m/%Y";

/// Calendar date a PDF was published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublishDate(NaiveDate);

impl PublishDate {
    /// Build a date, returning `None` when it does not exist in the calendar.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Parse a stored registry date. Empty or malformed text yields `None`,
    /// which orders before every real date.
    pub fn from_registry(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl fmt::Display for PublishDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_LAYOUT))
    }
}

impl FromStr for PublishDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DATE_LAYOUT).map(Self)
    }
}

/// A PDF link found on a monitored page during one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfRecord {
    /// The `href` value, verbatim
    pub url: String,

    /// Link text with size annotations removed
    pub name: String,

    /// Publish date, when the page carried a parseable one
    #[serde(default, with = "date_text")]
    pub publish_date: Option<PublishDate>,
}

impl PdfRecord {
    /// Date in registry form: `dd/mm/yyyy`, or empty when unknown.
    pub fn date_text(&self) -> String {
        self.publish_date
            .map(|d| d.to_string())
            .unwrap_or_default()
    }
}

/// Serializes an optional date the way the registry stores it.
mod date_text {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::PublishDate;

    pub fn serialize<S: Serializer>(date: &Option<PublishDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PublishDate>, D::Error> {
        let text = String::deserialize(d)?;
        Ok(PublishDate::from_registry(&text))
    }
}
