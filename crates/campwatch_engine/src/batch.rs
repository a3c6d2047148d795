use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use campwatch_core::{Digest, DigestBuilder, GroupResult, SearchCriteria};
use campwatch_logging::{cw_error, cw_info, cw_warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::paginate::page_ready;
use crate::{scan_group, PageSourceFactory, ScanError, ScanSettings};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub scan: ScanSettings,
    /// Number of page-source sessions open at the same time.
    pub max_concurrent_groups: usize,
    /// Overall time box of the batch. Groups not finished by then are
    /// reported as abandoned.
    pub deadline: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            scan: ScanSettings::default(),
            max_concurrent_groups: 4,
            deadline: None,
        }
    }
}

/// Scans every group of `criteria` and returns the merged digest.
///
/// Each group runs in its own task with its own page-source session. A
/// group that fails or times out is reported in the digest and does not
/// affect the others.
pub async fn scan(
    criteria: &SearchCriteria,
    factory: Arc<dyn PageSourceFactory>,
    options: &BatchOptions,
) -> Digest {
    let started = Instant::now();
    let builder = Arc::new(Mutex::new(DigestBuilder::new(criteria.clone())));
    let cancel = CancellationToken::new();
    let permits = Arc::new(Semaphore::new(options.max_concurrent_groups.max(1)));

    let mut tasks = JoinSet::new();
    for group in criteria.groups() {
        let group = group.to_string();
        let criteria = criteria.clone();
        let factory = Arc::clone(&factory);
        let settings = options.scan.clone();
        let builder = Arc::clone(&builder);
        let cancel = cancel.clone();
        let permits = Arc::clone(&permits);

        tasks.spawn(async move {
            let _permit = tokio::select! {
                _ = cancel.cancelled() => return,
                permit = permits.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };

            let outcome = run_group(factory.as_ref(), &group, &criteria, &settings, &cancel).await;
            let mut digest = builder.lock().unwrap_or_else(PoisonError::into_inner);
            match outcome {
                Ok(result) => {
                    cw_info!(
                        "Group '{}' finished: {} pages, {} sites",
                        group,
                        result.pages,
                        result.sites.len()
                    );
                    digest.merge_group(result);
                }
                Err(ScanError::Cancelled) => {
                    cw_info!("Group '{}' abandoned", group);
                }
                Err(err) => {
                    cw_warn!("Group '{}' failed: {}", group, err);
                    digest.record_failure(&group, err.to_string());
                }
            }
        });
    }

    let drain = async {
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                cw_error!("Group task ended abnormally: {}", err);
            }
        }
    };
    match options.deadline {
        Some(deadline) => {
            if tokio::time::timeout(deadline, drain).await.is_err() {
                cw_warn!(
                    "Batch deadline of {:?} reached; abandoning unfinished groups",
                    deadline
                );
                cancel.cancel();
                tasks.shutdown().await;
            }
        }
        None => drain.await,
    }

    let builder = {
        let mut guard = builder.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, DigestBuilder::new(criteria.clone()))
    };
    let digest = builder.finish();
    cw_info!(
        "Batch finished in {:?}: {} sites with qualifying stays",
        started.elapsed(),
        digest.sites().count()
    );
    digest
}

async fn run_group(
    factory: &dyn PageSourceFactory,
    group: &str,
    criteria: &SearchCriteria,
    settings: &ScanSettings,
    cancel: &CancellationToken,
) -> Result<GroupResult, ScanError> {
    let mut source = page_ready(
        settings.page_ready_timeout,
        "opening session",
        factory.open(group),
    )
    .await?;
    scan_group(source.as_mut(), group, criteria, settings, cancel).await
}
