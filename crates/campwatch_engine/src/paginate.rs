use std::future::Future;
use std::time::Duration;

use campwatch_core::{extract_page, should_continue, GroupResult, GroupScan, SearchCriteria};
use campwatch_logging::{cw_debug, cw_warn};
use tokio_util::sync::CancellationToken;

use crate::{PageSource, ScanError, SourceError};

#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Upper bound for every single page-source call.
    pub page_ready_timeout: Duration,
    /// Hard cap on windows read per group.
    pub max_pages: usize,
    /// Hard cap on "reveal more rows" steps per window.
    pub max_expansions: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            page_ready_timeout: Duration::from_secs(60),
            max_pages: 64,
            max_expansions: 256,
        }
    }
}

/// Runs the pagination loop for one group and finalizes its aggregators.
///
/// Pages are read until the trailing visible date reaches the end of the
/// search window, the source has no further pages, or `max_pages` is hit.
pub async fn scan_group(
    source: &mut dyn PageSource,
    group: &str,
    criteria: &SearchCriteria,
    settings: &ScanSettings,
    cancel: &CancellationToken,
) -> Result<GroupResult, ScanError> {
    let timeout = settings.page_ready_timeout;
    page_ready(timeout, "selecting group", source.select_group(group)).await?;

    let mut scan = GroupScan::new(group, criteria.min_length());
    loop {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut expansions = 0;
        while page_ready(timeout, "revealing rows", source.expand_within_page()).await? {
            expansions += 1;
            if expansions >= settings.max_expansions {
                cw_warn!(
                    "Group '{}': stopped revealing rows after {} expansions",
                    group,
                    expansions
                );
                break;
            }
        }

        let page = page_ready(timeout, "reading page", source.current_page()).await?;
        let extract = extract_page(&page, group, criteria)?;
        let window_end = extract.window_end;
        cw_debug!(
            "Group '{}' page {}: {}..{} with {} qualifying dates",
            group,
            scan.pages() + 1,
            extract.window_start,
            window_end,
            extract.facts.len()
        );
        scan.ingest(extract);

        if !should_continue(window_end, criteria.stop()) {
            break;
        }
        if scan.pages() >= settings.max_pages {
            cw_warn!(
                "Group '{}': page limit {} reached before {}",
                group,
                settings.max_pages,
                criteria.stop()
            );
            break;
        }
        if !page_ready(timeout, "advancing", source.advance()).await? {
            cw_debug!("Group '{}': source has no further pages", group);
            break;
        }
    }

    Ok(scan.finish())
}

pub(crate) async fn page_ready<T, F>(
    waited: Duration,
    stage: &'static str,
    call: F,
) -> Result<T, ScanError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(waited, call).await {
        Ok(result) => result.map_err(ScanError::from),
        Err(_) => Err(ScanError::PageTimeout { waited, stage }),
    }
}
