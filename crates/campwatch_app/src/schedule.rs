use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use campwatch_core::{Digest, GroupOutcome, SearchCriteria};
use campwatch_engine::{
    notify, scan, BatchOptions, HttpPageSourceFactory, NotificationSink, PageSourceFactory,
};
use campwatch_logging::{cw_debug, cw_info, cw_warn};
use tokio::time::MissedTickBehavior;

use crate::config::AppConfig;

/// Everything one batch needs; built once and reused by every trigger.
pub(crate) struct BatchJob {
    criteria: SearchCriteria,
    factory: Arc<dyn PageSourceFactory>,
    options: BatchOptions,
    sinks: Vec<Box<dyn NotificationSink>>,
    notify_enabled: bool,
    notify_if_empty: bool,
}

impl BatchJob {
    /// `every` is the schedule interval, `None` for a single run.
    pub(crate) fn from_config(config: &AppConfig, every: Option<Duration>) -> Result<Self> {
        let factory =
            HttpPageSourceFactory::new(config.fetch_settings(), config.source_settings()?)?;
        Ok(Self {
            criteria: config.criteria()?,
            factory: Arc::new(factory),
            options: config.batch_options(every),
            sinks: config.sinks(),
            notify_enabled: config.notify.enabled,
            notify_if_empty: config.notify.if_empty,
        })
    }

    pub(crate) async fn run(&self) -> Digest {
        let digest = scan(&self.criteria, Arc::clone(&self.factory), &self.options).await;
        for report in digest.reports() {
            match &report.outcome {
                GroupOutcome::Completed { pages, sites } => {
                    cw_debug!("'{}': {} pages, {} sites", report.group, pages, sites)
                }
                GroupOutcome::Failed { reason } => {
                    cw_warn!("'{}' failed: {}", report.group, reason)
                }
                GroupOutcome::Abandoned => cw_warn!("'{}' was not finished in time", report.group),
            }
        }

        if self.notify_enabled {
            let summary = notify(&self.sinks, &digest, self.notify_if_empty).await;
            cw_debug!(
                "Notification: {} delivered, {} failed, skipped={}",
                summary.delivered,
                summary.failed,
                summary.skipped
            );
        } else {
            cw_info!("Notifications disabled; digest not sent");
        }
        digest
    }
}

/// Runs `job` immediately and then once per `every` until `shutdown`
/// resolves. Returns the number of batches started.
pub(crate) async fn run_on_schedule(
    job: &BatchJob,
    every: Duration,
    shutdown: impl Future<Output = ()>,
) -> usize {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut batches = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                cw_info!("Shutting down after {} batches", batches);
                return batches;
            }
            _ = ticker.tick() => {
                batches += 1;
                cw_info!("Starting batch #{}", batches);
                let digest = job.run().await;
                cw_info!(
                    "Batch #{} done: {} sites with qualifying stays",
                    batches,
                    digest.sites().count()
                );
            }
        }
    }
}
