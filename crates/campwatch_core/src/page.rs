/// One visible window of the availability grid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Period label above the grid, e.g. `"Feb / Mar 2024"`.
    pub header_label: String,
    /// Day-of-month label of every date column, left to right.
    pub day_labels: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub site_id: String,
    /// Group (loop) the row belongs to, when the grid shows it.
    pub group: Option<String>,
    pub link: Option<String>,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Index into [`Page::day_labels`].
    pub column: usize,
    pub available: bool,
    pub link: Option<String>,
}

impl Row {
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            ..Self::default()
        }
    }

    /// Marks the given columns available and every other column of
    /// `0..columns` unavailable.
    pub fn with_available(mut self, columns: usize, available: &[usize]) -> Self {
        self.cells = (0..columns)
            .map(|column| Cell {
                column,
                available: available.contains(&column),
                link: None,
            })
            .collect();
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}
