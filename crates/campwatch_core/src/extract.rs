use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::{resolve_columns, FormatError, Page, SearchCriteria};

/// One available, filter-qualifying date of one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub group_id: String,
    pub site_id: String,
    pub date: NaiveDate,
    pub available: bool,
}

/// Everything the aggregator needs from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtract {
    /// Ordered by site id, then ascending date.
    pub facts: Vec<Fact>,
    pub window_start: NaiveDate,
    /// Trailing visible date; drives the pagination stop condition.
    pub window_end: NaiveDate,
    pub links: BTreeMap<String, String>,
}

/// Turns one visible page into availability facts for `group`.
///
/// Rows tagged with another group are skipped. Only available cells whose
/// date is inside the search window and on a selected weekday yield a fact.
pub fn extract_page(
    page: &Page,
    group: &str,
    criteria: &SearchCriteria,
) -> Result<PageExtract, FormatError> {
    let dates = resolve_columns(&page.header_label, &page.day_labels)?;
    let window_start = dates.iter().copied().min().ok_or(FormatError::NoDateColumns)?;
    let window_end = dates.iter().copied().max().ok_or(FormatError::NoDateColumns)?;

    let mut by_site: BTreeMap<&str, BTreeSet<NaiveDate>> = BTreeMap::new();
    let mut links: BTreeMap<String, String> = BTreeMap::new();

    for row in &page.rows {
        if row.group.as_deref().is_some_and(|g| g.trim() != group) {
            continue;
        }
        let site_id = row.site_id.trim();
        if site_id.is_empty() {
            continue;
        }

        let accepted = by_site.entry(site_id).or_default();
        let mut link = row.link.clone();
        for cell in row.cells.iter().filter(|c| c.available) {
            let date = *dates.get(cell.column).ok_or(FormatError::ColumnOutOfRange {
                column: cell.column,
                columns: dates.len(),
            })?;
            if !criteria.accepts(date) {
                continue;
            }
            accepted.insert(date);
            if link.is_none() {
                link = cell.link.clone();
            }
        }
        if let Some(link) = link {
            links.entry(site_id.to_string()).or_insert(link);
        }
    }

    let facts = by_site
        .into_iter()
        .flat_map(|(site_id, dates)| {
            dates.into_iter().map(move |date| Fact {
                group_id: group.to_string(),
                site_id: site_id.to_string(),
                date,
                available: true,
            })
        })
        .collect();

    Ok(PageExtract {
        facts,
        window_start,
        window_end,
        links,
    })
}
