use chrono::NaiveDate;
use thiserror::Error;

/// Rejected search input. Raised before any page is requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("at least one group must be searched")]
    NoGroups,
    #[error("at least one weekday must be selected")]
    NoWeekdays,
    #[error("unknown weekday {0:?}")]
    UnknownWeekday(String),
    #[error("search window starts {start} after it stops {stop}")]
    InvertedWindow { start: NaiveDate, stop: NaiveDate },
    #[error("minimum stay length must be at least 1, got {0}")]
    MinLength(u32),
}

/// A page whose period label or date columns cannot be turned into dates.
/// Fatal for the group being scanned, never for the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unrecognised period label {0:?}")]
    PeriodLabel(String),
    #[error("column {column} has a non-numeric day label {label:?}")]
    DayLabel { column: usize, label: String },
    #[error("page shows no date columns")]
    NoDateColumns,
    #[error("day labels roll over at column {column} but {label:?} names a single month")]
    UnexpectedRollover { column: usize, label: String },
    #[error("day labels roll over more than once (again at column {column})")]
    RepeatedRollover { column: usize },
    #[error("{year}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("cell refers to column {column} but the page has {columns} date columns")]
    ColumnOutOfRange { column: usize, columns: usize },
}
