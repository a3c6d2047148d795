use std::path::PathBuf;

use async_trait::async_trait;
use campwatch_core::{render_html, render_text, Digest};
use campwatch_logging::{cw_error, cw_info};

use crate::{write_atomically, DeliveryError};

/// Receives the finalized digest of a batch run.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifySummary {
    pub delivered: usize,
    pub failed: usize,
    /// Empty digest and `notify_if_empty` not set.
    pub skipped: bool,
}

/// Hands `digest` to every sink. Failures are logged and counted; they
/// never invalidate the digest.
pub async fn notify(
    sinks: &[Box<dyn NotificationSink>],
    digest: &Digest,
    notify_if_empty: bool,
) -> NotifySummary {
    let mut summary = NotifySummary::default();
    if digest.nothing_found() && !notify_if_empty {
        cw_info!("Nothing to send. No available sites found.");
        summary.skipped = true;
        return summary;
    }

    for sink in sinks {
        match sink.deliver(digest).await {
            Ok(()) => summary.delivered += 1,
            Err(err) => {
                cw_error!("Notification via {} failed: {}", sink.name(), err);
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Writes the text rendering of the digest to the log.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        for line in render_text(digest) {
            cw_info!("{}", line);
        }
        Ok(())
    }
}

/// Replaces an HTML file with the rendered digest.
#[derive(Debug)]
pub struct HtmlFileSink {
    path: PathBuf,
}

impl HtmlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl NotificationSink for HtmlFileSink {
    fn name(&self) -> &str {
        "html file"
    }

    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        let written = write_atomically(&self.path, &render_html(digest))?;
        cw_info!("Digest written to {:?}", written);
        Ok(())
    }
}

/// Replaces a JSON file with the serialized digest.
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl NotificationSink for JsonFileSink {
    fn name(&self) -> &str {
        "json file"
    }

    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        let json = serde_json::to_string_pretty(digest)?;
        let written = write_atomically(&self.path, &json)?;
        cw_info!("Digest written to {:?}", written);
        Ok(())
    }
}
