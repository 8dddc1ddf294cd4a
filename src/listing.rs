use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;
use time::UtcOffset;
use tracing::{debug, info, instrument, warn};

use crate::{
    api::{LINKS_PATH, ShortLink},
    display::LinkRow,
    outcome::RequestOutcome,
    transport::{ApiRequest, Transport, TransportError},
    view::ListingView,
};

/// Shown for every listing failure; the server's own error detail is only logged.
pub const LOAD_FAILED_MESSAGE: &str = "failed to load data";

/// Which slice of the link list is being viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page_index: usize,
    page_size: usize,
}

impl PageCursor {
    /// A `page_size` of zero is bumped to one.
    #[must_use]
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub fn first(page_size: usize) -> Self {
        Self::new(0, page_size)
    }

    #[must_use]
    pub const fn page_index(self) -> usize {
        self.page_index
    }

    #[must_use]
    pub const fn page_size(self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn is_first(self) -> bool {
        self.page_index == 0
    }

    #[must_use]
    pub const fn offset(self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            page_index: self.page_index.saturating_add(1),
            ..self
        }
    }

    /// `None` on the first page; the index never goes below zero.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self.page_index.checked_sub(1) {
            Some(page_index) => Some(Self { page_index, ..self }),
            None => None,
        }
    }
}

/// Summary of the rows on the current page only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStats {
    /// 1-based, inclusive, e.g. `21-25`.
    pub range: String,
    pub total_clicks: u64,
}

impl PageStats {
    #[must_use]
    pub fn new(cursor: PageCursor, links: &[ShortLink]) -> Self {
        let start = cursor.offset().saturating_add(1);
        let end = cursor.offset().saturating_add(links.len());
        Self {
            range: format!("{start}-{end}"),
            total_clicks: links
                .iter()
                .fold(0_u64, |total, link| total.saturating_add(link.clicks_count)),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("link service responded with {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected response from link service: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

pub struct ListingController {
    transport: Arc<dyn Transport>,
    view: Arc<dyn ListingView>,
    display_offset: UtcOffset,
    cursor: PageCursor,
}

impl ListingController {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        view: Arc<dyn ListingView>,
        page_size: usize,
    ) -> Self {
        Self {
            transport,
            view,
            display_offset: UtcOffset::UTC,
            cursor: PageCursor::first(page_size),
        }
    }

    #[must_use]
    pub fn with_display_offset(mut self, display_offset: UtcOffset) -> Self {
        self.display_offset = display_offset;
        self
    }

    #[must_use]
    pub const fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// Starts over from the first page.
    pub async fn activate(&mut self) -> RequestOutcome<Vec<ShortLink>> {
        self.load_page(PageCursor::first(self.cursor.page_size()))
            .await
    }

    pub async fn reload(&mut self) -> RequestOutcome<Vec<ShortLink>> {
        self.load_page(self.cursor).await
    }

    /// Always moves forward, even past the last known page.
    pub async fn next_page(&mut self) -> RequestOutcome<Vec<ShortLink>> {
        self.load_page(self.cursor.next()).await
    }

    /// Returns `None` without issuing a request when already on the first page.
    pub async fn previous_page(&mut self) -> Option<RequestOutcome<Vec<ShortLink>>> {
        let Some(previous) = self.cursor.previous() else {
            debug!("Already on the first page");
            return None;
        };
        Some(self.load_page(previous).await)
    }

    #[instrument(skip(self))]
    pub async fn load_page(&mut self, cursor: PageCursor) -> RequestOutcome<Vec<ShortLink>> {
        self.cursor = cursor;
        self.view.show_loading();

        let result = self.fetch(cursor).await;
        self.view.hide_loading();

        match result {
            Ok(links) => {
                info!(rows = links.len(), "Loaded page");
                self.render(cursor, &links);
                RequestOutcome::Success(links)
            }
            Err(err) => {
                warn!(?err, "Failed to load links");
                self.view.show_error(LOAD_FAILED_MESSAGE);
                RequestOutcome::Failure(LOAD_FAILED_MESSAGE.to_owned())
            }
        }
    }

    async fn fetch(&self, cursor: PageCursor) -> Result<Vec<ShortLink>, LoadError> {
        let response = self
            .transport
            .send(ApiRequest::Get {
                path: LINKS_PATH.to_owned(),
                query: vec![
                    ("limit", cursor.page_size().to_string()),
                    ("offset", cursor.offset().to_string()),
                ],
            })
            .await?;

        if !response.is_success() {
            return Err(LoadError::Status(response.status));
        }

        // NOTE: some servers encode an empty page as `null`
        let links: Option<Vec<ShortLink>> =
            response.json().map_err(LoadError::MalformedResponse)?;
        Ok(links.unwrap_or_default())
    }

    fn render(&self, cursor: PageCursor, links: &[ShortLink]) {
        let has_previous = !cursor.is_first();

        if links.is_empty() {
            if cursor.is_first() {
                self.view.show_empty();
            }
            self.view.set_nav_enabled(has_previous, false);
            return;
        }

        let rows: Vec<_> = links
            .iter()
            .map(|link| LinkRow::new(link, self.display_offset))
            .collect();
        self.view.render_rows(&rows);
        self.view.update_stats(&PageStats::new(cursor, links));
        // a short page is the last page
        self.view
            .set_nav_enabled(has_previous, links.len() == cursor.page_size());
    }
}
