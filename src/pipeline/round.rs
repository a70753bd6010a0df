// src/pipeline/round.rs

//! Scan rounds and the polling loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::models::Target;
use crate::pipeline::report::ReportSender;
use crate::pipeline::scan::{ScanSummary, Scanner};

/// Statistics of one round.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub scans: Vec<ScanSummary>,
}

impl RoundSummary {
    pub fn notified(&self) -> usize {
        self.scans.iter().map(|s| s.notified).sum()
    }

    pub fn errors(&self) -> usize {
        self.scans.iter().map(|s| s.errors).sum()
    }

    pub fn aborted(&self) -> usize {
        self.scans.iter().filter(|s| s.aborted).count()
    }
}

/// Scan every target concurrently and wait for all of them.
pub async fn run_round(
    scanner: Arc<Scanner>,
    targets: Vec<Target>,
    reports: ReportSender,
) -> RoundSummary {
    let start_time = Utc::now();

    let handles: Vec<_> = targets
        .into_iter()
        .map(|target| {
            let scanner = Arc::clone(&scanner);
            let reports = reports.clone();
            tokio::spawn(async move { scanner.scan(&target, &reports).await })
        })
        .collect();

    let mut scans = Vec::with_capacity(handles.len());
    for result in join_all(handles).await {
        match result {
            Ok(summary) => scans.push(summary),
            Err(e) => log::error!("Scan task failed: {}", e),
        }
    }

    let summary = RoundSummary {
        start_time,
        end_time: Utc::now(),
        scans,
    };
    log::info!(
        "Round finished in {}ms: {} targets, {} notified, {} errors, {} aborted",
        (summary.end_time - summary.start_time).num_milliseconds(),
        summary.scans.len(),
        summary.notified(),
        summary.errors(),
        summary.aborted()
    );
    summary
}

/// Start a round every `interval` until `shutdown` resolves. The first round
/// starts immediately.
///
/// A round is not awaited before the next one is scheduled, so a slow round
/// can overlap the following one; that is logged as a warning. On shutdown
/// the latest round is awaited. Returns how many rounds were started.
pub async fn run_until<F>(
    scanner: Arc<Scanner>,
    targets: Vec<Target>,
    interval: Duration,
    reports: ReportSender,
    shutdown: F,
) -> u64
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    let mut latest: Option<JoinHandle<RoundSummary>> = None;
    let mut rounds = 0;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Shutdown requested, stopping after the current round");
                break;
            }
            _ = ticker.tick() => {}
        }

        rounds += 1;
        if latest.as_ref().is_some_and(|handle| !handle.is_finished()) {
            log::warn!("Round #{} starts while the previous one is still running", rounds);
        }
        log::info!("Starting round #{}", rounds);

        latest = Some(tokio::spawn(run_round(
            Arc::clone(&scanner),
            targets.clone(),
            reports.clone(),
        )));
    }

    if let Some(handle) = latest {
        if let Err(e) = handle.await {
            log::error!("Round task failed: {}", e);
        }
    }
    rounds
}
