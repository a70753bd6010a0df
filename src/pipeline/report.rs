//! Error reports for the admin chat.
//!
//! Every scan task sends its failures into one bounded channel. A single
//! reporter task drains it and forwards each report to the admin chat.
//! When the channel is full, scan tasks wait.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{ErrorKind, ScanError};
use crate::models::AdminChat;
use crate::services::Notifier;
use crate::utils::html::escape;

/// Slots in the report channel.
pub const REPORT_CHANNEL_CAPACITY: usize = 50;

/// Default admin report layout.
pub const DEFAULT_REPORT_FORMAT: &str = concat!(
    "Error: <strong>{kind}</strong>\n",
    "  - chat name: <i>{chat}</i>\n",
    "  - proc name: <i>{process}</i>\n",
    "  - pdf name:  <i>{pdf}</i>\n",
    "  - message:   <pre language=\"console\">{message}</pre>\n",
);

pub type ReportSender = mpsc::Sender<ScanReport>;
pub type ReportReceiver = mpsc::Receiver<ScanReport>;

/// A scan failure with the target it happened on.
#[derive(Debug)]
pub struct ScanReport {
    pub chat: String,
    pub process: String,
    pub error: ScanError,
}

impl ScanReport {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Format the report for the admin chat.
    ///
    /// Supported placeholders: `{kind}`, `{chat}`, `{process}`, `{pdf}`,
    /// `{message}`.
    pub fn render(&self, format: &str) -> String {
        format
            .replace("{kind}", self.kind().as_str())
            .replace("{chat}", &escape(&self.chat))
            .replace("{process}", &escape(&self.process))
            .replace("{pdf}", &escape(self.error.pdf_name().unwrap_or("")))
            .replace("{message}", &escape(&self.error.to_string()))
    }
}

/// Create the shared report channel.
pub fn report_channel() -> (ReportSender, ReportReceiver) {
    mpsc::channel(REPORT_CHANNEL_CAPACITY)
}

/// Drain `reports` until every sender is gone, forwarding each one to the
/// admin chat when configured. Returns how many reports were received.
pub fn spawn_reporter(
    mut reports: ReportReceiver,
    notifier: Arc<dyn Notifier>,
    admin: Option<AdminChat>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut received = 0;
        while let Some(report) = reports.recv().await {
            received += 1;
            let Some(admin) = &admin else {
                continue;
            };

            let format = admin
                .report_format
                .as_deref()
                .unwrap_or(DEFAULT_REPORT_FORMAT);
            let message = report.render(format);
            if let Err(e) = notifier.send(&admin.chat_id, &message).await {
                log::error!(
                    "Could not send error report to admin chat '{}': {}",
                    admin.name,
                    e
                );
            }
        }
        received
    })
}
