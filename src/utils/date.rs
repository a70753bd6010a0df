//! Spanish publication date parsing.
//!
//! Announcement pages label their documents with free text such as
//! `Fecha de publicación: 14 de junio de 2023` or `2 de noviembre del 2023`.
//! Only the first date phrase in the text is considered; anything after it is
//! ignored.

use chrono::{Datelike, Local};
use regex::Regex;
use thiserror::Error;

use crate::models::PublishDate;

/// `<day> de|del <month> [de|del <year>]`, spaces around the separators optional.
const DATE_PATTERN: &str =
    r"(?i)([0-9]{1,2})\s*del?\s*([a-záéíóúñ]+)(?:\s*del?\s*([0-9]{4}))?";

/// Month names, lowercase.
const MONTHS: [(&str, u32); 13] = [
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

/// Why a date phrase could not be turned into a date.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("no date phrase found in '{0}'")]
    NoMatch(String),

    #[error("unknown month '{0}'")]
    UnknownMonth(String),

    #[error("{day}/{month}/{year} is not a calendar date")]
    InvalidDate { day: u32, month: u32, year: i32 },
}

/// Look up a Spanish month name.
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.trim().to_lowercase();
    MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|(_, number)| *number)
}

/// Parser for Spanish date phrases.
#[derive(Debug, Clone)]
pub struct SpanishDateParser {
    pattern: Regex,
}

impl SpanishDateParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(DATE_PATTERN)?,
        })
    }

    /// Parse the first date phrase in `text`. A missing year means the
    /// current local year.
    pub fn parse(&self, text: &str) -> Result<PublishDate, DateParseError> {
        self.parse_in_year(text, Local::now().year())
    }

    /// Parse the first date phrase in `text`, using `default_year` when the
    /// phrase has no year.
    pub fn parse_in_year(
        &self,
        text: &str,
        default_year: i32,
    ) -> Result<PublishDate, DateParseError> {
        let caps = self
            .pattern
            .captures(text)
            .ok_or_else(|| DateParseError::NoMatch(text.trim().to_string()))?;

        // Both captures are ASCII digits of bounded length.
        let day: u32 = caps[1].trim().parse().unwrap_or_default();
        let month_name = caps[2].trim();
        let month =
            month_number(month_name).ok_or_else(|| DateParseError::UnknownMonth(month_name.into()))?;
        let year = match caps.get(3) {
            Some(y) => y.as_str().trim().parse().unwrap_or_default(),
            None => default_year,
        };

        PublishDate::from_ymd(year, month, day)
            .ok_or(DateParseError::InvalidDate { day, month, year })
    }
}
