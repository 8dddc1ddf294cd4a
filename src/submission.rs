use std::{sync::Arc, time::Duration};

use reqwest::StatusCode;
use thiserror::Error;
use time::UtcOffset;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::{
    api::{CreateLinkRequest, LINKS_PATH, ShortLink},
    clipboard::{Clipboard, SystemClipboard, TerminalClipboard},
    display::LinkRow,
    outcome::RequestOutcome,
    transport::{ApiRequest, Transport, TransportError},
    view::SubmissionView,
};

/// Used when a rejected request carries no `error` message of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "link creation failed";

/// How long the "copied" acknowledgement stays visible.
pub const COPIED_ACK_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("failed to encode request: {0}")]
    InvalidRequest(#[source] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected response from link service: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

/// Clears the busy indicator when dropped, so it is reset even if the submission future is
/// cancelled or unwinds.
struct BusyGuard(Arc<dyn SubmissionView>);

impl BusyGuard {
    fn start(view: &Arc<dyn SubmissionView>) -> Self {
        view.set_busy(true);
        Self(Arc::clone(view))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.set_busy(false);
    }
}

pub struct SubmissionController {
    transport: Arc<dyn Transport>,
    view: Arc<dyn SubmissionView>,
    clipboard: Arc<dyn Clipboard>,
    fallback_clipboard: Arc<dyn Clipboard>,
    display_offset: UtcOffset,
    copied_ack_delay: Duration,
    outcome: Option<RequestOutcome<ShortLink>>,
}

impl SubmissionController {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, view: Arc<dyn SubmissionView>) -> Self {
        Self {
            transport,
            view,
            clipboard: Arc::new(SystemClipboard::default()),
            fallback_clipboard: Arc::new(TerminalClipboard),
            display_offset: UtcOffset::UTC,
            copied_ack_delay: COPIED_ACK_DELAY,
            outcome: None,
        }
    }

    #[must_use]
    pub fn with_clipboards(
        mut self,
        clipboard: Arc<dyn Clipboard>,
        fallback_clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        self.clipboard = clipboard;
        self.fallback_clipboard = fallback_clipboard;
        self
    }

    #[must_use]
    pub fn with_display_offset(mut self, display_offset: UtcOffset) -> Self {
        self.display_offset = display_offset;
        self
    }

    /// The outcome currently on display, if any submission was made.
    #[must_use]
    pub const fn outcome(&self) -> Option<&RequestOutcome<ShortLink>> {
        self.outcome.as_ref()
    }

    pub async fn submit(
        &mut self,
        original_url: &str,
        custom_code: Option<&str>,
    ) -> RequestOutcome<ShortLink> {
        self.submit_request(CreateLinkRequest::new(original_url, custom_code))
            .await
    }

    #[instrument(skip(self))]
    pub async fn submit_request(
        &mut self,
        request: CreateLinkRequest,
    ) -> RequestOutcome<ShortLink> {
        self.view.clear_outcome();
        // nothing is on display until the request resolves
        self.outcome = None;
        let _busy = BusyGuard::start(&self.view);

        let outcome = match self.create(&request).await {
            Ok(link) => {
                info!(short_code = %link.short_code, "Created short link");
                self.view
                    .show_link(&LinkRow::new(&link, self.display_offset));
                self.view.reset_form();
                RequestOutcome::Success(link)
            }
            Err(err) => {
                warn!(?err, "Failed to create short link");
                let message = err.to_string();
                self.view.show_error(&message);
                RequestOutcome::Failure(message)
            }
        };

        self.outcome = Some(outcome.clone());
        outcome
    }

    async fn create(&self, request: &CreateLinkRequest) -> Result<ShortLink, SubmitError> {
        let body = serde_json::to_value(request).map_err(SubmitError::InvalidRequest)?;
        let response = self
            .transport
            .send(ApiRequest::Post {
                path: LINKS_PATH.to_owned(),
                body,
            })
            .await?;

        if !response.is_success() {
            let message = response
                .error_message()
                .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_owned());
            return Err(SubmitError::Rejected {
                status: response.status,
                message,
            });
        }

        response.json().map_err(SubmitError::MalformedResponse)
    }

    /// Copies the displayed short URL and flashes the "copied" acknowledgement.
    ///
    /// Returns the task that reverts the acknowledgement, or `None` when no link is on display.
    ///
    /// # Panics
    /// Panics when called outside of a tokio runtime.
    pub fn copy_short_url(&self) -> Option<JoinHandle<()>> {
        let short_url = &self.outcome.as_ref()?.success()?.short_url;

        if let Err(err) = self.clipboard.copy_text(short_url) {
            debug!(?err, "Clipboard unavailable; falling back");
            if let Err(err) = self.fallback_clipboard.copy_text(short_url) {
                debug!(?err, "Fallback copy failed");
            }
        }

        self.view.set_copied(true);
        let view = Arc::clone(&self.view);
        let delay = self.copied_ack_delay;
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            view.set_copied(false);
        }))
    }
}
