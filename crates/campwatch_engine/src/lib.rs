//! Campwatch engine: page-source sessions, pagination and batch scans.
mod batch;
mod decode;
mod fetch;
mod grid;
mod http;
mod notify;
mod paginate;
mod persist;
mod source;
mod types;

pub use batch::{scan, BatchOptions};
pub use decode::{decode_page, DecodeError};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use grid::{parse_grid, parse_more_rows, GridPage, MoreRows};
pub use http::{HttpPageSource, HttpPageSourceFactory, HttpSourceSettings};
pub use notify::{notify, HtmlFileSink, JsonFileSink, LogSink, NotificationSink, NotifySummary};
pub use paginate::{scan_group, ScanSettings};
pub use persist::{ensure_output_dir, write_atomically, PersistError};
pub use source::{PageSource, PageSourceFactory};
pub use types::{
    DeliveryError, FailureKind, FetchError, FetchMetadata, FetchOutput, ScanError, SourceError,
};
