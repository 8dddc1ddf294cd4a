use std::sync::Arc;

use async_trait::async_trait;
use rearch::CapsuleHandle;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    api,
    config::{api_base_url_capsule, http_client_capsule},
};

pub fn transport_capsule(CapsuleHandle { mut get, .. }: CapsuleHandle) -> Arc<dyn Transport> {
    let client = get.as_ref(http_client_capsule).clone();
    let base_url = get.as_ref(api_base_url_capsule).clone();
    Arc::new(HttpTransport { client, base_url })
}

/// A single call against the link API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Post {
        path: String,
        body: serde_json::Value,
    },
    Get {
        path: String,
        query: Vec<(&'static str, String)>,
    },
    Delete {
        path: String,
    },
}

/// Whatever the server answered with, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// # Errors
    /// Will return [`Err`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// The non-empty `error` field of a JSON error body, if there is one.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.json::<api::Error>()
            .ok()
            .and_then(|body| body.error)
            .filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Issues requests against the link API.
///
/// Non-2xx statuses are *not* errors at this layer; they come back as an [`ApiResponse`] so
/// callers can read whatever body the server sent along.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self))]
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let builder = match request {
            ApiRequest::Post { path, body } => self.client.post(self.endpoint(&path)?).json(&body),
            ApiRequest::Get { path, query } => {
                self.client.get(self.endpoint(&path)?).query(&query)
            }
            ApiRequest::Delete { path } => self.client.delete(self.endpoint(&path)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, body_len = body.len(), "Received response");

        Ok(ApiResponse { status, body })
    }
}
