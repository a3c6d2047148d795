use chrono::{Month, NaiveDate};

use crate::FormatError;

/// A month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct YearMonth {
    year: i32,
    month: u32,
}

/// The period a page shows, e.g. `"MAR 2024"` or `"Feb / Mar 2024"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodLabel {
    first: YearMonth,
    second: Option<YearMonth>,
}

impl PeriodLabel {
    /// Parses one or two month tokens and a four-digit year.
    ///
    /// The year belongs to the last month; a first month numerically after
    /// the second (`Dec / Jan 2025`) is placed in the previous year.
    pub fn parse(label: &str) -> Result<Self, FormatError> {
        let bad = || FormatError::PeriodLabel(label.to_string());

        let mut months: Vec<u32> = Vec::with_capacity(2);
        let mut year: Option<i32> = None;
        for token in label
            .split(|c: char| c.is_whitespace() || c == '/' || c == ',')
            .filter(|t| !t.is_empty())
        {
            if token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) {
                if year.is_some() {
                    return Err(bad());
                }
                year = token.parse().ok();
            } else {
                let month = token.parse::<Month>().map_err(|_| bad())?;
                months.push(month.number_from_month());
            }
        }

        let year = year.ok_or_else(bad)?;
        match months.as_slice() {
            [only] => Ok(Self {
                first: YearMonth { year, month: *only },
                second: None,
            }),
            [first, second] => {
                let first_year = if first > second { year - 1 } else { year };
                Ok(Self {
                    first: YearMonth {
                        year: first_year,
                        month: *first,
                    },
                    second: Some(YearMonth {
                        year,
                        month: *second,
                    }),
                })
            }
            _ => Err(bad()),
        }
    }

    pub fn spans_two_months(&self) -> bool {
        self.second.is_some()
    }
}

/// Resolves every date column of a page to its calendar date.
///
/// Columns before the first day-of-month reset use the first month of the
/// period label, columns at or after it use the second.
pub fn resolve_columns(label: &str, day_labels: &[String]) -> Result<Vec<NaiveDate>, FormatError> {
    let period = PeriodLabel::parse(label)?;
    if day_labels.is_empty() {
        return Err(FormatError::NoDateColumns);
    }

    let days = day_labels
        .iter()
        .enumerate()
        .map(|(column, raw)| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| FormatError::DayLabel {
                    column,
                    label: raw.clone(),
                })
        })
        .collect::<Result<Vec<u32>, _>>()?;

    let mut rollover: Option<usize> = None;
    for column in 1..days.len() {
        if days[column] < days[column - 1] {
            if rollover.is_some() {
                return Err(FormatError::RepeatedRollover { column });
            }
            rollover = Some(column);
        }
    }

    let second = match (rollover, period.second) {
        (Some(column), None) => {
            return Err(FormatError::UnexpectedRollover {
                column,
                label: label.to_string(),
            })
        }
        (_, second) => second,
    };
    let split = rollover.unwrap_or(days.len());

    days.iter()
        .enumerate()
        .map(|(column, &day)| {
            let ym = match second {
                Some(second) if column >= split => second,
                _ => period.first,
            };
            NaiveDate::from_ymd_opt(ym.year, ym.month, day).ok_or(FormatError::InvalidDate {
                year: ym.year,
                month: ym.month,
                day,
            })
        })
        .collect()
}
