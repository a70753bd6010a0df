// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::services::DeliveryError;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regular expression failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Failure while scanning one target.
///
/// `Fetch`, `TemplateRead` and `RegistryParse` abort the target for the
/// current round. `RegistryWrite` and `Delivery` only affect the record they
/// name. `RegistryRead` is a warning: the scan continues with an empty
/// registry.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("could not fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not read template {}: {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read registry {}, starting empty: {source}", .path.display())]
    RegistryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse registry {}: {source}", .path.display())]
    RegistryParse {
        path: PathBuf,
        #[source]
        source: AppError,
    },

    #[error("could not write registry {} for '{pdf}': {source}", .path.display())]
    RegistryWrite {
        path: PathBuf,
        pdf: String,
        #[source]
        source: AppError,
    },

    #[error("could not deliver notification for '{pdf}': {source}")]
    Delivery {
        pdf: String,
        #[source]
        source: DeliveryError,
    },
}

/// Closed set of error kinds reported to the admin chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    TemplateRead,
    RegistryRead,
    RegistryParse,
    RegistryWrite,
    Delivery,
}

impl ErrorKind {
    /// Label used in admin reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Fetch => "FetchError",
            ErrorKind::TemplateRead => "TemplateReadError",
            ErrorKind::RegistryRead => "RegistryReadError",
            ErrorKind::RegistryParse => "RegistryParseError",
            ErrorKind::RegistryWrite => "RegistryWriteError",
            ErrorKind::Delivery => "DeliveryError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::Fetch { .. } => ErrorKind::Fetch,
            ScanError::TemplateRead { .. } => ErrorKind::TemplateRead,
            ScanError::RegistryRead { .. } => ErrorKind::RegistryRead,
            ScanError::RegistryParse { .. } => ErrorKind::RegistryParse,
            ScanError::RegistryWrite { .. } => ErrorKind::RegistryWrite,
            ScanError::Delivery { .. } => ErrorKind::Delivery,
        }
    }

    /// Name of the PDF being processed when the error happened, if any.
    pub fn pdf_name(&self) -> Option<&str> {
        match self {
            ScanError::RegistryWrite { pdf, .. } | ScanError::Delivery { pdf, .. } => Some(pdf),
            _ => None,
        }
    }

    /// Whether the error stops the whole target for this round.
    pub fn aborts_target(&self) -> bool {
        matches!(
            self,
            ScanError::Fetch { .. } | ScanError::TemplateRead { .. } | ScanError::RegistryParse { .. }
        )
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ScanError::RegistryRead { .. })
    }
}
