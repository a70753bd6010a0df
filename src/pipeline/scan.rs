// src/pipeline/scan.rs

//! Scan of a single target.
//!
//! One scan fetches the process page, loads its template and registry, then
//! walks the extracted PDFs in page order. Each new or updated PDF is written
//! to the registry before its notification is sent, so a delivery failure
//! never causes the same PDF to be announced twice.

use std::sync::Arc;

use reqwest::Client;

use crate::error::{Result, ScanError};
use crate::models::{Config, MessageFields, NotificationTemplate, Target};
use crate::pipeline::diff::{Change, ChangeDetector};
use crate::pipeline::report::{ReportSender, ScanReport};
use crate::services::{Notifier, PdfExtractor, spawn_extraction};
use crate::storage::{Registry, RegistryStore};
use crate::utils::http;

/// Outcome counters of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// `chat/process`
    pub target: String,
    pub extracted: usize,
    pub new: usize,
    pub updated: usize,
    pub notified: usize,
    pub errors: usize,
    /// The target stopped before walking the page
    pub aborted: bool,
}

impl ScanSummary {
    fn new(target: String) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn changed(&self) -> usize {
        self.new + self.updated
    }
}

/// Scans targets with shared collaborators.
pub struct Scanner {
    client: Client,
    extractor: Arc<PdfExtractor>,
    store: Arc<dyn RegistryStore>,
    notifier: Arc<dyn Notifier>,
    detector: ChangeDetector,
    base_url: String,
}

impl Scanner {
    pub fn new(
        config: &Config,
        client: Client,
        store: Arc<dyn RegistryStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            extractor: Arc::new(PdfExtractor::new()?),
            store,
            notifier,
            detector: ChangeDetector::from_policy(config.update_policy),
            base_url: config.base_url.clone(),
        })
    }

    /// Scan one target. Failures are sent to `reports`; the summary tells
    /// how far the scan got.
    pub async fn scan(&self, target: &Target, reports: &ReportSender) -> ScanSummary {
        let label = target.label();
        let mut summary = ScanSummary::new(label.clone());
        let process = &target.process;
        log::info!("[{}] Checking {}", label, process.url);

        let body = match http::fetch_body(&self.client, &process.url).await {
            Ok(body) => body,
            Err(source) => {
                let error = ScanError::Fetch {
                    url: process.url.clone(),
                    source,
                };
                self.report(target, error, reports, &mut summary).await;
                return summary;
            }
        };

        let template = match NotificationTemplate::load(&process.template_path).await {
            Ok(template) => template,
            Err(source) => {
                let error = ScanError::TemplateRead {
                    path: process.template_path.clone(),
                    source,
                };
                self.report(target, error, reports, &mut summary).await;
                return summary;
            }
        };

        let mut registry = match self.load_registry(target, reports, &mut summary).await {
            Some(registry) => registry,
            None => return summary,
        };

        let mut stream = spawn_extraction(Arc::clone(&self.extractor), body);
        while let Some(record) = stream.next().await {
            summary.extracted += 1;

            match self.detector.detect(&registry, &record) {
                Change::New => {
                    summary.new += 1;
                    log::info!("[{}] New PDF '{}'", label, record.name);
                }
                Change::Updated { previous } => {
                    summary.updated += 1;
                    log::info!(
                        "[{}] Updated PDF '{}' ({} -> {})",
                        label,
                        record.name,
                        previous.map(|d| d.to_string()).unwrap_or_default(),
                        record.date_text()
                    );
                }
                Change::Unchanged => continue,
            }

            let previous = registry.upsert(&record);
            if let Err(source) = self.store.save(&process.registry_path, &registry).await {
                // Only notified PDFs may reach the file with a later save.
                registry.restore(&record.name, previous);
                let error = ScanError::RegistryWrite {
                    path: process.registry_path.clone(),
                    pdf: record.name.clone(),
                    source,
                };
                self.report(target, error, reports, &mut summary).await;
                continue;
            }

            let date = record.date_text();
            let message = template.render(&MessageFields {
                process: &process.name,
                base_url: &self.base_url,
                pdf_url: &record.url,
                pdf_name: &record.name,
                pdf_date: &date,
            });

            match self.notifier.send(&target.chat_id, &message).await {
                Ok(()) => summary.notified += 1,
                Err(source) => {
                    let error = ScanError::Delivery {
                        pdf: record.name.clone(),
                        source,
                    };
                    self.report(target, error, reports, &mut summary).await;
                }
            }
        }
        stream.finish().await;

        log::info!(
            "[{}] Done: {} PDFs, {} new, {} updated, {} notified",
            label,
            summary.extracted,
            summary.new,
            summary.updated,
            summary.notified
        );
        summary
    }

    /// Load the target registry. `None` means the scan must stop.
    async fn load_registry(
        &self,
        target: &Target,
        reports: &ReportSender,
        summary: &mut ScanSummary,
    ) -> Option<Registry> {
        let path = &target.process.registry_path;
        match self.store.load(path).await {
            Ok(loaded) => {
                if let Some(source) = loaded.read_error {
                    let error = ScanError::RegistryRead {
                        path: path.clone(),
                        source,
                    };
                    self.report(target, error, reports, summary).await;
                }
                Some(loaded.registry)
            }
            Err(source) => {
                let error = ScanError::RegistryParse {
                    path: path.clone(),
                    source,
                };
                self.report(target, error, reports, summary).await;
                None
            }
        }
    }

    async fn report(
        &self,
        target: &Target,
        error: ScanError,
        reports: &ReportSender,
        summary: &mut ScanSummary,
    ) {
        if error.is_warning() {
            log::warn!("[{}] {}", summary.target, error);
        } else {
            summary.errors += 1;
            log::error!("[{}] {}", summary.target, error);
        }
        if error.aborts_target() {
            summary.aborted = true;
        }

        let report = ScanReport {
            chat: target.chat_name.clone(),
            process: target.process.name.clone(),
            error,
        };
        if reports.send(report).await.is_err() {
            log::debug!("[{}] Report channel closed", summary.target);
        }
    }
}
