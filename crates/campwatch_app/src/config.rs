//! RON configuration of the watcher.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use campwatch_core::{parse_weekday, SearchCriteria};
use campwatch_engine::{
    BatchOptions, FetchSettings, HtmlFileSink, HttpSourceSettings, JsonFileSink, LogSink,
    NotificationSink, ScanSettings,
};
use chrono::NaiveDate;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AppConfig {
    pub search: SearchSection,
    pub source: SourceSection,
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub notify: NotifySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SearchSection {
    pub groups: Vec<String>,
    pub weekdays: Vec<String>,
    pub start: NaiveDate,
    pub stop: NaiveDate,
    #[serde(default = "default_min_length")]
    pub min_length: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SourceSection {
    pub start_url: String,
    #[serde(default = "default_group_param")]
    pub group_param: String,
    #[serde(default = "default_page_ready_timeout_secs")]
    pub page_ready_timeout_secs: u64,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScanSection {
    pub max_concurrent_groups: usize,
    pub max_pages: usize,
    pub batch_deadline_secs: u64,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            max_concurrent_groups: 4,
            max_pages: 64,
            batch_deadline_secs: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScheduleSection {
    pub interval_secs: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            interval_secs: 3 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct NotifySection {
    pub enabled: bool,
    pub if_empty: bool,
    pub html_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            enabled: true,
            if_empty: false,
            html_path: None,
            json_path: None,
        }
    }
}

fn default_min_length() -> u32 {
    1
}

fn default_group_param() -> String {
    "loop".to_string()
}

fn default_page_ready_timeout_secs() -> u64 {
    60
}

fn default_max_bytes() -> u64 {
    FetchSettings::default().max_bytes
}

pub(crate) fn load(path: &Path) -> Result<AppConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid config file {}", path.display()))
}

pub(crate) fn parse(text: &str) -> Result<AppConfig> {
    let config: AppConfig = ron::from_str(text)?;
    if config.schedule.interval_secs == 0 {
        bail!("schedule.interval_secs must be positive");
    }
    if config.source.page_ready_timeout_secs == 0 {
        bail!("source.page_ready_timeout_secs must be positive");
    }
    Ok(config)
}

impl AppConfig {
    pub(crate) fn criteria(&self) -> Result<SearchCriteria> {
        let weekdays = self
            .search
            .weekdays
            .iter()
            .map(|raw| parse_weekday(raw))
            .collect::<Result<Vec<_>, _>>()
            .context("invalid search.weekdays")?;
        SearchCriteria::new(
            &self.search.groups,
            weekdays,
            self.search.start,
            self.search.stop,
            self.search.min_length,
        )
        .context("invalid search criteria")
    }

    pub(crate) fn source_settings(&self) -> Result<HttpSourceSettings> {
        let start_url = Url::parse(&self.source.start_url)
            .with_context(|| format!("invalid source.start_url {:?}", self.source.start_url))?;
        Ok(HttpSourceSettings {
            start_url,
            group_param: self.source.group_param.clone(),
        })
    }

    pub(crate) fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            max_bytes: self.source.max_bytes,
            ..FetchSettings::default()
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }

    /// A scheduled batch never outlives its interval; `every` is `None` for a
    /// single run.
    pub(crate) fn batch_options(&self, every: Option<Duration>) -> BatchOptions {
        let configured = Duration::from_secs(self.scan.batch_deadline_secs);
        let deadline = match every {
            Some(every) => configured.min(every),
            None => configured,
        };
        BatchOptions {
            scan: ScanSettings {
                page_ready_timeout: Duration::from_secs(self.source.page_ready_timeout_secs),
                max_pages: self.scan.max_pages,
                ..ScanSettings::default()
            },
            max_concurrent_groups: self.scan.max_concurrent_groups,
            deadline: (!deadline.is_zero()).then_some(deadline),
        }
    }

    pub(crate) fn sinks(&self) -> Vec<Box<dyn NotificationSink>> {
        let mut sinks: Vec<Box<dyn NotificationSink>> = vec![Box::new(LogSink)];
        if let Some(path) = &self.notify.html_path {
            sinks.push(Box::new(HtmlFileSink::new(path)));
        }
        if let Some(path) = &self.notify.json_path {
            sinks.push(Box::new(JsonFileSink::new(path)));
        }
        sinks
    }
}
