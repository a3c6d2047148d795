use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{GroupResult, PageExtract, Run, RunAggregator, Site};

/// Pagination stop predicate: keep paging while the trailing visible date is
/// strictly before the end of the search window.
pub fn should_continue(window_end: NaiveDate, stop: NaiveDate) -> bool {
    window_end < stop
}

/// Aggregation state of one group's scan, fed page by page.
#[derive(Debug)]
pub struct GroupScan {
    group: String,
    min_length: u32,
    aggregators: BTreeMap<String, RunAggregator>,
    sites: BTreeMap<String, Site>,
    links: BTreeMap<String, String>,
    pages: usize,
}

impl GroupScan {
    pub fn new(group: impl Into<String>, min_length: u32) -> Self {
        Self {
            group: group.into(),
            min_length,
            aggregators: BTreeMap::new(),
            sites: BTreeMap::new(),
            links: BTreeMap::new(),
            pages: 0,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Sites with at least one committed run so far.
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn ingest(&mut self, extract: PageExtract) {
        self.pages += 1;
        for (site_id, link) in extract.links {
            self.links.entry(site_id).or_insert(link);
        }

        for fact in extract.facts.into_iter().filter(|f| f.available) {
            let aggregator = self
                .aggregators
                .entry(fact.site_id.clone())
                .or_insert_with(|| RunAggregator::new(self.min_length));
            if let Some(run) = aggregator.consume(fact.date) {
                commit(&mut self.sites, &self.group, &fact.site_id, &run);
            }
        }

        // Every date up to the window end has now been seen for every site,
        // so runs ending earlier are over, whether or not the site row
        // appears on later pages.
        for (site_id, aggregator) in &mut self.aggregators {
            if let Some(run) = aggregator.close_before(extract.window_end) {
                commit(&mut self.sites, &self.group, site_id, &run);
            }
        }
    }

    /// Closes every pending run and returns the group's sites.
    pub fn finish(mut self) -> GroupResult {
        for (site_id, aggregator) in &mut self.aggregators {
            if let Some(run) = aggregator.finish() {
                commit(&mut self.sites, &self.group, site_id, &run);
            }
        }

        let mut links = self.links;
        let sites = self
            .sites
            .into_values()
            .map(|mut site| {
                site.link = links.remove(&site.site_id);
                site
            })
            .collect();

        GroupResult {
            group: self.group,
            pages: self.pages,
            sites,
        }
    }
}

fn commit(sites: &mut BTreeMap<String, Site>, group: &str, site_id: &str, run: &Run) {
    sites
        .entry(site_id.to_string())
        .or_insert_with(|| Site::new(site_id, group))
        .add_run(run);
}
