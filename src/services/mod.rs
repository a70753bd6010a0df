//! Service layer for the watcher.
//!
//! This module contains:
//! - PDF link extraction (`PdfExtractor`, `spawn_extraction`)
//! - Chat delivery (`Notifier`, `TelegramNotifier`, `LogNotifier`)

mod notifier;
mod pdfs;

pub use notifier::{DeliveryError, LogNotifier, Notifier, TelegramNotifier};
pub use pdfs::{PdfExtractor, PdfStream, spawn_extraction};
