//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pdfwatch::models::{Config, SelectiveProcess, Target};
use pdfwatch::pipeline::{ReportReceiver, ScanReport, Scanner};
use pdfwatch::services::{DeliveryError, Notifier};
use pdfwatch::storage::{LocalStorage, RegistryStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Positional template producing `process|base|url|name|date`.
pub const PIPE_TEMPLATE: &str = "%s|%s|%s|%s|%s";

/// Notifier that keeps every message in memory. Messages containing
/// `fail_on` are refused.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail_on: Option<String>,
}

impl RecordingNotifier {
    pub fn failing_on(needle: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_on: Some(needle.to_string()),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DeliveryError> {
        if let Some(needle) = &self.fail_on {
            if message.contains(needle.as_str()) {
                return Err(DeliveryError::Rejected {
                    status: 403,
                    description: "Forbidden: bot was blocked by the user".into(),
                });
            }
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));
        Ok(())
    }
}

pub fn config(policy: &str) -> Config {
    toml::from_str(&format!(
        "update_policy = \"{policy}\"\n[[chats]]\nname = \"A1\"\nchat_id = \"-100\"\n"
    ))
    .unwrap()
}

/// Target whose page is served at `{server}/{slug}` and whose files live
/// in `dir`. The template is written with `template`.
pub fn target(server: &MockServer, dir: &Path, slug: &str, template: &str) -> Target {
    let template_path = dir.join(format!("{slug}.txt"));
    std::fs::write(&template_path, template).unwrap();

    Target {
        chat_name: "A1".into(),
        chat_id: "-100".into(),
        process: SelectiveProcess {
            name: slug.into(),
            url: format!("{}/{}", server.uri(), slug),
            template_path,
            registry_path: dir.join("registry").join(format!("{slug}.json")),
        },
    }
}

pub fn scanner(config: &Config, notifier: Arc<dyn Notifier>) -> Scanner {
    scanner_with(config, Arc::new(LocalStorage::new()), notifier)
}

pub fn scanner_with(
    config: &Config,
    store: Arc<dyn RegistryStore>,
    notifier: Arc<dyn Notifier>,
) -> Scanner {
    Scanner::new(config, reqwest::Client::new(), store, notifier).unwrap()
}

/// Announcement page with one block per `(href, name, date text)`.
pub fn page(entries: &[(&str, &str, &str)]) -> String {
    let blocks: String = entries
        .iter()
        .map(|(href, name, date)| {
            format!(
                "<div class=\"disclaimer\"><span><a href=\"{href}\">{name}</a></span>\
                 <p>Fecha de publicación: {date}</p></div>"
            )
        })
        .collect();
    format!("<html><body><h1>Proceso selectivo</h1>{blocks}</body></html>")
}

/// Replace whatever is served with `body` at `/{slug}`.
pub async fn serve(server: &MockServer, slug: &str, body: String) {
    server.reset().await;
    mount_page(server, slug, body).await;
}

pub async fn mount_page(server: &MockServer, slug: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/{slug}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub fn drain(receiver: &mut ReportReceiver) -> Vec<ScanReport> {
    let mut reports = Vec::new();
    while let Ok(report) = receiver.try_recv() {
        reports.push(report);
    }
    reports
}
