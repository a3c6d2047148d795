use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{decompose, DateGroup, Run, SearchCriteria};

/// A site with at least one qualifying stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub site_id: String,
    /// Group the site was first seen in.
    pub group_id: String,
    pub link: Option<String>,
    pub dates: BTreeSet<NaiveDate>,
}

impl Site {
    pub fn new(site_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            group_id: group_id.into(),
            link: None,
            dates: BTreeSet::new(),
        }
    }

    pub fn add_run(&mut self, run: &Run) {
        self.dates.extend(run.dates());
    }

    /// Date union; group and link stay as first seen.
    fn absorb(&mut self, other: Site) {
        self.dates.extend(other.dates);
        if self.link.is_none() {
            self.link = other.link;
        }
    }
}

/// Finalized output of one group's pagination loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResult {
    pub group: String,
    pub pages: usize,
    pub sites: Vec<Site>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupOutcome {
    Completed { pages: usize, sites: usize },
    Failed { reason: String },
    /// Not scanned to completion before the batch deadline.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub group: String,
    pub outcome: GroupOutcome,
}

/// Collects group results of one batch. Shared between group tasks behind a
/// mutex; a site seen in several groups keeps its first group and gets the
/// union of dates.
#[derive(Debug)]
pub struct DigestBuilder {
    criteria: SearchCriteria,
    sites: BTreeMap<String, Site>,
    outcomes: BTreeMap<String, GroupOutcome>,
}

impl DigestBuilder {
    pub fn new(criteria: SearchCriteria) -> Self {
        Self {
            criteria,
            sites: BTreeMap::new(),
            outcomes: BTreeMap::new(),
        }
    }

    pub fn merge_group(&mut self, result: GroupResult) {
        let site_count = result.sites.len();
        for site in result.sites {
            match self.sites.get_mut(&site.site_id) {
                Some(existing) => existing.absorb(site),
                None => {
                    self.sites.insert(site.site_id.clone(), site);
                }
            }
        }
        self.outcomes.insert(
            result.group,
            GroupOutcome::Completed {
                pages: result.pages,
                sites: site_count,
            },
        );
    }

    pub fn record_failure(&mut self, group: &str, reason: impl Into<String>) {
        self.outcomes.insert(
            group.to_string(),
            GroupOutcome::Failed {
                reason: reason.into(),
            },
        );
    }

    /// Groups without a recorded outcome are reported as abandoned.
    pub fn finish(self) -> Digest {
        let mut outcomes = self.outcomes;
        let reports = self
            .criteria
            .groups()
            .map(|group| GroupReport {
                group: group.to_string(),
                outcome: outcomes.remove(group).unwrap_or(GroupOutcome::Abandoned),
            })
            .collect();

        Digest {
            criteria: self.criteria,
            nothing_found: self.sites.is_empty(),
            sites: self.sites,
            reports,
        }
    }
}

/// Finalized per-site result of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    #[serde(skip)]
    criteria: SearchCriteria,
    sites: BTreeMap<String, Site>,
    reports: Vec<GroupReport>,
    nothing_found: bool,
}

impl Digest {
    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn nothing_found(&self) -> bool {
        self.nothing_found
    }

    /// Sites in ascending id order.
    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.sites.values()
    }

    pub fn site(&self, site_id: &str) -> Option<&Site> {
        self.sites.get(site_id)
    }

    pub fn reports(&self) -> &[GroupReport] {
        &self.reports
    }

    pub fn date_groups(&self) -> BTreeMap<&str, Vec<DateGroup>> {
        self.sites
            .iter()
            .map(|(id, site)| (id.as_str(), decompose(site.dates.iter().copied())))
            .collect()
    }
}
