//! Campwatch core: pure extraction, run aggregation and digest rendering.
mod aggregate;
mod criteria;
mod digest;
mod error;
mod extract;
mod page;
mod period;
mod render;
mod scan;

pub use aggregate::{Run, RunAggregator};
pub use criteria::{parse_weekday, SearchCriteria, Weekdays};
pub use digest::{Digest, DigestBuilder, GroupOutcome, GroupReport, GroupResult, Site};
pub use error::{CriteriaError, FormatError};
pub use extract::{extract_page, Fact, PageExtract};
pub use page::{Cell, Page, Row};
pub use period::{resolve_columns, PeriodLabel};
pub use render::{
    band_color, decompose, render_html, render_text, site_view, DateGroup, SiteView, BAND_COUNT,
    DIGEST_TITLE,
};
pub use scan::{should_continue, GroupScan};
