use chrono::NaiveDate;

/// A span of calendar-consecutive dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: NaiveDate,
    pub last: NaiveDate,
    pub length: u32,
}

impl Run {
    fn starting(date: NaiveDate) -> Self {
        Self {
            start: date,
            last: date,
            length: 1,
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.length as usize)
    }
}

/// Consecutive-run detector for a single site.
///
/// State is kept across pages: a run only ends at a real date gap or when
/// the stream is finished.
#[derive(Debug, Clone)]
pub struct RunAggregator {
    min_length: u32,
    pending: Option<Run>,
    last_closed: Option<NaiveDate>,
}

impl RunAggregator {
    pub fn new(min_length: u32) -> Self {
        Self {
            min_length: min_length.max(1),
            pending: None,
            last_closed: None,
        }
    }

    pub fn pending(&self) -> Option<Run> {
        self.pending
    }

    /// Feeds one available date. Returns the run this date closed, if that
    /// run was long enough to keep.
    ///
    /// Dates at or before the last consumed date are re-reads of an
    /// overlapping page and leave the state untouched.
    pub fn consume(&mut self, date: NaiveDate) -> Option<Run> {
        let Some(run) = self.pending.as_mut() else {
            if self.last_closed.is_none_or(|closed| date > closed) {
                self.pending = Some(Run::starting(date));
            }
            return None;
        };

        if run.last.succ_opt() == Some(date) {
            run.last = date;
            run.length += 1;
            return None;
        }
        if date <= run.last {
            return None;
        }

        // Gap: the pending run can no longer grow.
        let closed = self.close();
        self.pending = Some(Run::starting(date));
        closed
    }

    /// Closes the pending run when `date` proves it cannot be extended:
    /// every date up to `date` has been seen and the day after the run was
    /// not among them.
    pub fn close_before(&mut self, date: NaiveDate) -> Option<Run> {
        match self.pending {
            Some(run) if run.last < date => self.close(),
            _ => None,
        }
    }

    /// Ends the stream, closing any pending run.
    pub fn finish(&mut self) -> Option<Run> {
        self.close()
    }

    fn close(&mut self) -> Option<Run> {
        let run = self.pending.take()?;
        self.last_closed = Some(run.last);
        (run.length >= self.min_length).then_some(run)
    }
}
