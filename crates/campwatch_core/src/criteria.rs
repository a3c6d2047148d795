use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::CriteriaError;

/// Set of selected weekdays, stored as a Monday-first bit mask.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Weekdays(u8);

impl Weekdays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= bit(day);
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & bit(day) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Selected days, Monday first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        let mut day = Weekday::Mon;
        (0..7).filter_map(move |_| {
            let current = day;
            day = day.succ();
            self.contains(current).then_some(current)
        })
    }
}

impl FromIterator<Weekday> for Weekdays {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Debug for Weekdays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

fn bit(day: Weekday) -> u8 {
    1 << day.num_days_from_monday()
}

/// Parses an English weekday name or abbreviation, ignoring case.
pub fn parse_weekday(raw: &str) -> Result<Weekday, CriteriaError> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| CriteriaError::UnknownWeekday(raw.trim().to_string()))
}

/// Immutable, validated search input for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    groups: BTreeSet<String>,
    weekdays: Weekdays,
    start: NaiveDate,
    stop: NaiveDate,
    min_length: u32,
}

impl SearchCriteria {
    /// Validates and builds criteria. Group names are trimmed; blank names
    /// are dropped and duplicates collapse.
    pub fn new<G, S, W>(
        groups: G,
        weekdays: W,
        start: NaiveDate,
        stop: NaiveDate,
        min_length: u32,
    ) -> Result<Self, CriteriaError>
    where
        G: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: IntoIterator<Item = Weekday>,
    {
        let groups: BTreeSet<String> = groups
            .into_iter()
            .map(|g| g.as_ref().trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        if groups.is_empty() {
            return Err(CriteriaError::NoGroups);
        }

        let weekdays: Weekdays = weekdays.into_iter().collect();
        if weekdays.is_empty() {
            return Err(CriteriaError::NoWeekdays);
        }
        if start > stop {
            return Err(CriteriaError::InvertedWindow { start, stop });
        }
        if min_length < 1 {
            return Err(CriteriaError::MinLength(min_length));
        }

        Ok(Self {
            groups,
            weekdays,
            start,
            stop,
            min_length,
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    pub fn weekdays(&self) -> Weekdays {
        self.weekdays
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn stop(&self) -> NaiveDate {
        self.stop
    }

    pub fn min_length(&self) -> u32 {
        self.min_length
    }

    /// Both window ends are inclusive.
    pub fn in_window(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.stop
    }

    /// True when `date` may be part of a qualifying stay.
    pub fn accepts(&self, date: NaiveDate) -> bool {
        self.in_window(date) && self.weekdays.contains(date.weekday())
    }
}
