use std::sync::Arc;

use async_trait::async_trait;
use campwatch_core::Page;
use campwatch_logging::cw_debug;
use url::Url;

use crate::grid::{parse_grid, parse_more_rows};
use crate::{
    decode_page, FetchError, FetchSettings, Fetcher, PageSource, PageSourceFactory, ReqwestFetcher,
    SourceError,
};

#[derive(Debug, Clone)]
pub struct HttpSourceSettings {
    /// Calendar page of the first window; the group is added as a query
    /// parameter.
    pub start_url: Url,
    pub group_param: String,
}

#[derive(Debug)]
struct Loaded {
    page: Page,
    load_more: Option<Url>,
    next_page: Option<Url>,
}

/// [`PageSource`] over server-rendered calendar pages.
pub struct HttpPageSource {
    fetcher: Arc<dyn Fetcher>,
    settings: HttpSourceSettings,
    current: Option<Loaded>,
}

impl HttpPageSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: HttpSourceSettings) -> Self {
        Self {
            fetcher,
            settings,
            current: None,
        }
    }

    /// Returns the decoded body and the URL it was finally served from.
    async fn fetch_text(&self, url: &Url) -> Result<(String, Url), SourceError> {
        let output = self.fetcher.fetch(url).await?;
        let text = decode_page(&output.bytes, output.metadata.content_type.as_deref())?;
        let base = Url::parse(&output.metadata.final_url).unwrap_or_else(|_| url.clone());
        Ok((text, base))
    }

    async fn load(&mut self, url: &Url) -> Result<(), SourceError> {
        cw_debug!("Loading availability window {}", url);
        let (html, base) = self.fetch_text(url).await?;
        let grid = parse_grid(&html, &base)?;
        self.current = Some(Loaded {
            page: grid.page,
            load_more: grid.load_more,
            next_page: grid.next_page,
        });
        Ok(())
    }

    fn loaded(&mut self) -> Result<&mut Loaded, SourceError> {
        self.current.as_mut().ok_or(SourceError::NotLoaded)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn select_group(&mut self, group: &str) -> Result<(), SourceError> {
        let mut url = self.settings.start_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.settings.group_param, group);
        self.load(&url).await
    }

    async fn expand_within_page(&mut self) -> Result<bool, SourceError> {
        let Some(url) = self.loaded()?.load_more.take() else {
            return Ok(false);
        };
        let (html, base) = self.fetch_text(&url).await?;
        let more = parse_more_rows(&html, &base)?;
        let loaded = self.loaded()?;
        loaded.page.rows.extend(more.rows);
        loaded.load_more = more.load_more;
        Ok(true)
    }

    async fn current_page(&mut self) -> Result<Page, SourceError> {
        Ok(self.loaded()?.page.clone())
    }

    async fn advance(&mut self) -> Result<bool, SourceError> {
        let Some(url) = self.loaded()?.next_page.clone() else {
            return Ok(false);
        };
        self.load(&url).await?;
        Ok(true)
    }
}

/// Opens one [`HttpPageSource`] per group; sessions share the fetcher but
/// no page state.
pub struct HttpPageSourceFactory {
    fetcher: Arc<dyn Fetcher>,
    settings: HttpSourceSettings,
}

impl HttpPageSourceFactory {
    pub fn new(fetch: FetchSettings, settings: HttpSourceSettings) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(fetch)?;
        Ok(Self::with_fetcher(Arc::new(fetcher), settings))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, settings: HttpSourceSettings) -> Self {
        Self { fetcher, settings }
    }
}

#[async_trait]
impl PageSourceFactory for HttpPageSourceFactory {
    async fn open(&self, _group: &str) -> Result<Box<dyn PageSource>, SourceError> {
        Ok(Box::new(HttpPageSource::new(
            Arc::clone(&self.fetcher),
            self.settings.clone(),
        )))
    }
}
