//! Pipeline entry points for the watcher.
//!
//! - `Scanner::scan`: check one (chat, process) target
//! - `run_round`: scan every target concurrently
//! - `run_until`: repeat rounds on a fixed interval
//! - `spawn_reporter`: forward scan failures to the admin chat

pub mod diff;
pub mod report;
pub mod round;
pub mod scan;

pub use diff::{Change, ChangeDetector};
pub use report::{
    DEFAULT_REPORT_FORMAT, REPORT_CHANNEL_CAPACITY, ReportReceiver, ReportSender, ScanReport,
    report_channel, spawn_reporter,
};
pub use round::{RoundSummary, run_round, run_until};
pub use scan::{ScanSummary, Scanner};
