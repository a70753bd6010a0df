//! Utility functions and helpers.

pub mod date;
pub mod html;
pub mod http;

pub use date::{DateParseError, SpanishDateParser};
