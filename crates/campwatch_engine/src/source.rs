use async_trait::async_trait;
use campwatch_core::Page;

use crate::SourceError;

/// Pull-based view of a paginated availability grid for one session.
///
/// Calls are strictly sequential; every method may suspend while the remote
/// page settles, and the caller bounds each call with a page-ready timeout.
#[async_trait]
pub trait PageSource: Send {
    /// Navigates to the first window of `group`.
    async fn select_group(&mut self, group: &str) -> Result<(), SourceError>;

    /// Reveals more rows of the current window. `false` means nothing more
    /// to reveal, which is the normal end of expansion.
    async fn expand_within_page(&mut self) -> Result<bool, SourceError>;

    /// Snapshot of the currently visible window.
    async fn current_page(&mut self) -> Result<Page, SourceError>;

    /// Moves to the next window. `false` means there are no further pages.
    async fn advance(&mut self) -> Result<bool, SourceError>;
}

/// Opens one exclusive [`PageSource`] session per scanned group.
#[async_trait]
pub trait PageSourceFactory: Send + Sync {
    async fn open(&self, group: &str) -> Result<Box<dyn PageSource>, SourceError>;
}
