use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use time::UtcOffset;
use tracing::{info, instrument, warn};

use crate::{
    api::{LinkStats, ShortLink, link_path, link_stats_path},
    display::{LinkRow, StatsReport},
    outcome::RequestOutcome,
    transport::{ApiRequest, ApiResponse, Transport, TransportError},
    view::DetailsView,
};

/// Used when a failed request carries no `error` message of its own.
pub const DETAILS_FAILED_MESSAGE: &str = "request to link service failed";

#[derive(Debug, Error)]
pub enum DetailsError {
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected response from link service: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

/// Looks up, deletes, and reports on single links by id.
pub struct DetailsController {
    transport: Arc<dyn Transport>,
    view: Arc<dyn DetailsView>,
    display_offset: UtcOffset,
}

impl DetailsController {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, view: Arc<dyn DetailsView>) -> Self {
        Self {
            transport,
            view,
            display_offset: UtcOffset::UTC,
        }
    }

    #[must_use]
    pub fn with_display_offset(mut self, display_offset: UtcOffset) -> Self {
        self.display_offset = display_offset;
        self
    }

    #[instrument(skip(self))]
    pub async fn show(&self, id: i64) -> RequestOutcome<ShortLink> {
        let result = self.fetch(ApiRequest::Get {
            path: link_path(id),
            query: Vec::new(),
        });
        match result.await.and_then(|response| decode::<ShortLink>(&response)) {
            Ok(link) => {
                self.view
                    .show_link(&LinkRow::new(&link, self.display_offset));
                RequestOutcome::Success(link)
            }
            Err(err) => self.fail(&err),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> RequestOutcome<()> {
        match self.fetch(ApiRequest::Delete { path: link_path(id) }).await {
            Ok(_) => {
                info!("Deleted short link");
                self.view.show_deleted(id);
                RequestOutcome::Success(())
            }
            Err(err) => self.fail(&err),
        }
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, id: i64) -> RequestOutcome<LinkStats> {
        let result = self.fetch(ApiRequest::Get {
            path: link_stats_path(id),
            query: Vec::new(),
        });
        match result.await.and_then(|response| decode::<LinkStats>(&response)) {
            Ok(stats) => {
                self.view
                    .show_stats(id, &StatsReport::new(&stats, self.display_offset));
                RequestOutcome::Success(stats)
            }
            Err(err) => self.fail(&err),
        }
    }

    /// Sends `request` and turns any non-2xx answer into [`DetailsError::Rejected`].
    async fn fetch(&self, request: ApiRequest) -> Result<ApiResponse, DetailsError> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            let message = response
                .error_message()
                .unwrap_or_else(|| DETAILS_FAILED_MESSAGE.to_owned());
            return Err(DetailsError::Rejected {
                status: response.status,
                message,
            });
        }
        Ok(response)
    }

    fn fail<T>(&self, err: &DetailsError) -> RequestOutcome<T> {
        warn!(?err, "Link request failed");
        let message = err.to_string();
        self.view.show_error(&message);
        RequestOutcome::Failure(message)
    }
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, DetailsError> {
    response.json().map_err(DetailsError::MalformedResponse)
}
