use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campwatch_core::{GroupOutcome, Page, Row, SearchCriteria};
use campwatch_engine::{
    scan, scan_group, BatchOptions, PageSource, PageSourceFactory, ScanError, ScanSettings,
    SourceError,
};
use chrono::{NaiveDate, Weekday};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, day).unwrap()
}

fn criteria(groups: &[&str], stop: NaiveDate, min_length: u32) -> SearchCriteria {
    SearchCriteria::new(groups.iter().copied(), ALL_DAYS, d(3, 1), stop, min_length).unwrap()
}

/// Window `first..=last` of March 2024 with each site available on its days.
fn march(first: u32, last: u32, sites: &[(&str, &[u32])]) -> Page {
    let day_labels: Vec<String> = (first..=last).map(|day| day.to_string()).collect();
    let rows = sites
        .iter()
        .map(|(site, days)| {
            let columns: Vec<usize> = days.iter().map(|day| (day - first) as usize).collect();
            Row::new(*site).with_available(day_labels.len(), &columns)
        })
        .collect();
    Page {
        header_label: "MAR 2024".into(),
        day_labels,
        rows,
    }
}

#[derive(Clone, Default)]
struct Script {
    pages: Vec<Page>,
    /// Row batches revealed one by one on the first window.
    reveal: Vec<Vec<Row>>,
    endless_reveal: bool,
    delay: Option<Duration>,
}

struct ScriptedSource {
    script: Script,
    index: usize,
    revealed: Vec<Row>,
    advances: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new(script: Script) -> Self {
        Self {
            script,
            index: 0,
            revealed: Vec::new(),
            advances: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn settle(&self) {
        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn select_group(&mut self, _group: &str) -> Result<(), SourceError> {
        self.settle().await;
        self.index = 0;
        Ok(())
    }

    async fn expand_within_page(&mut self) -> Result<bool, SourceError> {
        self.settle().await;
        if self.script.endless_reveal {
            return Ok(true);
        }
        if self.index == 0 && !self.script.reveal.is_empty() {
            let rows = self.script.reveal.remove(0);
            self.revealed.extend(rows);
            return Ok(true);
        }
        Ok(false)
    }

    async fn current_page(&mut self) -> Result<Page, SourceError> {
        self.settle().await;
        let mut page = self
            .script
            .pages
            .get(self.index)
            .cloned()
            .ok_or(SourceError::NotLoaded)?;
        if self.index == 0 {
            page.rows.extend(self.revealed.iter().cloned());
        }
        Ok(page)
    }

    async fn advance(&mut self) -> Result<bool, SourceError> {
        self.settle().await;
        self.advances.fetch_add(1, Ordering::SeqCst);
        if self.index + 1 < self.script.pages.len() {
            self.index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[derive(Default)]
struct ScriptedFactory {
    scripts: BTreeMap<String, Script>,
}

impl ScriptedFactory {
    fn with(mut self, group: &str, script: Script) -> Self {
        self.scripts.insert(group.to_string(), script);
        self
    }
}

#[async_trait]
impl PageSourceFactory for ScriptedFactory {
    async fn open(&self, group: &str) -> Result<Box<dyn PageSource>, SourceError> {
        let script = self
            .scripts
            .get(group)
            .cloned()
            .ok_or_else(|| SourceError::Structure(format!("no calendar for {group}")))?;
        Ok(Box::new(ScriptedSource::new(script)))
    }
}

fn pages(pages: Vec<Page>) -> Script {
    Script {
        pages,
        ..Script::default()
    }
}

fn outcome_of(digest: &campwatch_core::Digest, group: &str) -> GroupOutcome {
    digest
        .reports()
        .iter()
        .find(|r| r.group == group)
        .map(|r| r.outcome.clone())
        .unwrap()
}

#[tokio::test]
async fn run_straddling_pages_is_kept() {
    campwatch_logging::initialize_for_tests();
    let mut source = ScriptedSource::new(pages(vec![
        march(1, 5, &[("G5", &[4, 5])]),
        march(6, 10, &[("G5", &[6, 8])]),
        march(11, 15, &[("G5", &[])]),
    ]));

    let result = scan_group(
        &mut source,
        "Oceanside",
        &criteria(&["Oceanside"], d(3, 14), 3),
        &ScanSettings::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(result.pages, 3);
    assert_eq!(result.sites.len(), 1);
    assert_eq!(
        result.sites[0].dates.iter().copied().collect::<Vec<_>>(),
        vec![d(3, 4), d(3, 5), d(3, 6)]
    );
}

#[tokio::test]
async fn stops_advancing_once_stop_date_is_visible() {
    let mut source = ScriptedSource::new(pages(vec![
        march(1, 5, &[("G5", &[2])]),
        march(6, 10, &[("G5", &[7])]),
        march(11, 15, &[("G5", &[12])]),
    ]));
    let advances = Arc::clone(&source.advances);

    let result = scan_group(
        &mut source,
        "Oceanside",
        &criteria(&["Oceanside"], d(3, 10), 1),
        &ScanSettings::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(result.pages, 2);
    assert_eq!(advances.load(Ordering::SeqCst), 1);
    assert_eq!(result.sites[0].dates.len(), 2);
}

#[tokio::test]
async fn exhausted_source_and_page_cap_end_the_loop() {
    let mut single = ScriptedSource::new(pages(vec![march(1, 5, &[("G5", &[1])])]));
    let result = scan_group(
        &mut single,
        "Oceanside",
        &criteria(&["Oceanside"], d(3, 31), 1),
        &ScanSettings::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(result.pages, 1);

    let mut many = ScriptedSource::new(pages(vec![
        march(1, 5, &[]),
        march(6, 10, &[]),
        march(11, 15, &[]),
    ]));
    let settings = ScanSettings {
        max_pages: 2,
        ..ScanSettings::default()
    };
    let result = scan_group(
        &mut many,
        "Oceanside",
        &criteria(&["Oceanside"], d(3, 31), 1),
        &settings,
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(result.pages, 2);
}

#[tokio::test]
async fn revealed_rows_are_scanned() {
    let extra = march(1, 5, &[("B7", &[2, 3])]).rows;
    let mut source = ScriptedSource::new(Script {
        pages: vec![march(1, 5, &[("G5", &[1])])],
        reveal: vec![extra],
        ..Script::default()
    });

    let result = scan_group(
        &mut source,
        "Oceanside",
        &criteria(&["Oceanside"], d(3, 5), 2),
        &ScanSettings::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let ids: Vec<&str> = result.sites.iter().map(|s| s.site_id.as_str()).collect();
    assert_eq!(ids, vec!["B7"]);
}

#[tokio::test]
async fn endless_reveal_is_capped() {
    let mut source = ScriptedSource::new(Script {
        pages: vec![march(1, 5, &[("G5", &[1])])],
        endless_reveal: true,
        ..Script::default()
    });
    let settings = ScanSettings {
        max_expansions: 3,
        ..ScanSettings::default()
    };

    let result = scan_group(
        &mut source,
        "Oceanside",
        &criteria(&["Oceanside"], d(3, 5), 1),
        &settings,
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(result.sites.len(), 1);
}

#[tokio::test]
async fn cancelled_scan_stops_before_reading() {
    let mut source = ScriptedSource::new(pages(vec![march(1, 5, &[("G5", &[1])])]));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = scan_group(
        &mut source,
        "Oceanside",
        &criteria(&["Oceanside"], d(3, 5), 1),
        &ScanSettings::default(),
        &cancel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ScanError::Cancelled));
}

#[tokio::test]
async fn format_failure_only_aborts_its_group() {
    let mut broken = march(1, 5, &[("B7", &[1])]);
    broken.header_label = "Availability".into();
    let factory = ScriptedFactory::default()
        .with("Oceanside", pages(vec![march(1, 5, &[("G5", &[1, 2])])]))
        .with("Bayside", pages(vec![broken]));

    let digest = scan(
        &criteria(&["Oceanside", "Bayside", "Woods"], d(3, 5), 2),
        Arc::new(factory),
        &BatchOptions::default(),
    )
    .await;

    assert!(!digest.nothing_found());
    assert!(digest.site("G5").is_some());
    assert_eq!(
        outcome_of(&digest, "Oceanside"),
        GroupOutcome::Completed { pages: 1, sites: 1 }
    );
    assert!(matches!(
        outcome_of(&digest, "Bayside"),
        GroupOutcome::Failed { reason } if reason.contains("period label")
    ));
    assert!(matches!(
        outcome_of(&digest, "Woods"),
        GroupOutcome::Failed { reason } if reason.contains("no calendar")
    ));
}

#[tokio::test(start_paused = true)]
async fn slow_page_times_out_without_failing_batch() {
    let slow = Script {
        delay: Some(Duration::from_secs(120)),
        ..pages(vec![march(1, 5, &[("B7", &[1])])])
    };
    let factory = ScriptedFactory::default()
        .with("Oceanside", pages(vec![march(1, 5, &[("G5", &[1])])]))
        .with("Bayside", slow);
    let options = BatchOptions {
        scan: ScanSettings {
            page_ready_timeout: Duration::from_secs(5),
            ..ScanSettings::default()
        },
        ..BatchOptions::default()
    };

    let digest = scan(
        &criteria(&["Oceanside", "Bayside"], d(3, 5), 1),
        Arc::new(factory),
        &options,
    )
    .await;

    assert!(digest.site("G5").is_some());
    assert!(digest.site("B7").is_none());
    assert!(matches!(
        outcome_of(&digest, "Bayside"),
        GroupOutcome::Failed { reason } if reason.contains("not ready")
    ));
}

#[tokio::test(start_paused = true)]
async fn deadline_abandons_unfinished_groups_and_keeps_the_rest() {
    let slow = Script {
        delay: Some(Duration::from_secs(30)),
        ..pages(vec![march(1, 5, &[("B7", &[1])])])
    };
    let factory = ScriptedFactory::default()
        .with("Oceanside", pages(vec![march(1, 5, &[("G5", &[1])])]))
        .with("Bayside", slow);
    let options = BatchOptions {
        deadline: Some(Duration::from_secs(10)),
        ..BatchOptions::default()
    };

    let digest = scan(
        &criteria(&["Oceanside", "Bayside"], d(3, 5), 1),
        Arc::new(factory),
        &options,
    )
    .await;

    assert!(digest.site("G5").is_some());
    assert_eq!(outcome_of(&digest, "Bayside"), GroupOutcome::Abandoned);
    assert_eq!(
        outcome_of(&digest, "Oceanside"),
        GroupOutcome::Completed { pages: 1, sites: 1 }
    );
}

#[tokio::test]
async fn same_site_in_two_groups_is_merged() {
    let factory = ScriptedFactory::default()
        .with("Oceanside", pages(vec![march(1, 5, &[("G5", &[1, 2])])]))
        .with("Bayside", pages(vec![march(1, 5, &[("G5", &[4, 5])])]));
    let options = BatchOptions {
        max_concurrent_groups: 1,
        ..BatchOptions::default()
    };

    let digest = scan(
        &criteria(&["Oceanside", "Bayside"], d(3, 5), 2),
        Arc::new(factory),
        &options,
    )
    .await;

    assert_eq!(digest.sites().count(), 1);
    let site = digest.site("G5").unwrap();
    assert_eq!(
        site.dates.iter().copied().collect::<Vec<_>>(),
        vec![d(3, 1), d(3, 2), d(3, 4), d(3, 5)]
    );
    assert!(site.group_id == "Oceanside" || site.group_id == "Bayside");
    assert_eq!(digest.date_groups()["G5"].len(), 2);
}
