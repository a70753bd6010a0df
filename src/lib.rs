//! pdfwatch - PDF announcement watcher
//!
//! Polls selective-process pages, finds newly published or updated PDFs and
//! notifies the subscribed chats.
//!
//! # Modules
//!
//! - `models`: Configuration, PDF records and message templates
//! - `services`: PDF extraction and chat delivery
//! - `storage`: Per-process registries of notified PDFs
//! - `pipeline`: Change detection, scans and the polling loop
//! - `error`: Unified error types
//! - `utils`: Date parsing, HTML escaping and HTTP helpers

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
