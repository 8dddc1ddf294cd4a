#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;
use mockall::mock;
use reqwest::StatusCode;
use time::{Duration, macros::datetime};

use crate::{
    api::ShortLink,
    clipboard::Clipboard,
    display::{LinkRow, StatsReport},
    listing::PageStats,
    transport::{ApiRequest, ApiResponse, Transport, TransportError},
    view::{DetailsView, ListingView, SubmissionView},
};

mock! {
    pub Transport {}

    #[async_trait]
    impl Transport for Transport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
    }
}

mock! {
    pub SubmissionView {}

    impl SubmissionView for SubmissionView {
        fn set_busy(&self, busy: bool);
        fn clear_outcome(&self);
        fn show_link(&self, link: &LinkRow);
        fn show_error(&self, message: &str);
        fn reset_form(&self);
        fn set_copied(&self, copied: bool);
    }
}

mock! {
    pub ListingView {}

    impl ListingView for ListingView {
        fn show_loading(&self);
        fn hide_loading(&self);
        fn show_error(&self, message: &str);
        fn show_empty(&self);
        fn render_rows(&self, rows: &[LinkRow]);
        fn update_stats(&self, stats: &PageStats);
        fn set_nav_enabled(&self, previous: bool, next: bool);
    }
}

mock! {
    pub DetailsView {}

    impl DetailsView for DetailsView {
        fn show_link(&self, link: &LinkRow);
        fn show_deleted(&self, id: i64);
        fn show_stats(&self, id: i64, stats: &StatsReport);
        fn show_error(&self, message: &str);
    }
}

mock! {
    pub Clipboard {}

    impl Clipboard for Clipboard {
        fn copy_text(&self, text: &str) -> anyhow::Result<()>;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEvent {
    Loading,
    LoadingHidden,
    Error(String),
    Empty,
    Rows(Vec<LinkRow>),
    Stats(PageStats),
    Nav { previous: bool, next: bool },
}

/// Records every update so whole renders can be compared.
#[derive(Debug, Default)]
pub struct RecordingListingView {
    events: Mutex<Vec<ListingEvent>>,
}

impl RecordingListingView {
    pub fn take(&self) -> Vec<ListingEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, event: ListingEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ListingView for RecordingListingView {
    fn show_loading(&self) {
        self.push(ListingEvent::Loading);
    }

    fn hide_loading(&self) {
        self.push(ListingEvent::LoadingHidden);
    }

    fn show_error(&self, message: &str) {
        self.push(ListingEvent::Error(message.to_owned()));
    }

    fn show_empty(&self) {
        self.push(ListingEvent::Empty);
    }

    fn render_rows(&self, rows: &[LinkRow]) {
        self.push(ListingEvent::Rows(rows.to_vec()));
    }

    fn update_stats(&self, stats: &PageStats) {
        self.push(ListingEvent::Stats(stats.clone()));
    }

    fn set_nav_enabled(&self, previous: bool, next: bool) {
        self.push(ListingEvent::Nav { previous, next });
    }
}

pub fn short_link(id: i64, clicks_count: u64) -> ShortLink {
    ShortLink {
        id,
        short_code: format!("code{id}"),
        short_url: format!("https://s.example/code{id}"),
        original_url: format!("https://example.com/article/{id}"),
        created_at: datetime!(2024-01-01 0:00 UTC) + Duration::hours(id),
        expires_at: None,
        clicks_count,
    }
}

pub fn short_link_json(link: &ShortLink) -> serde_json::Value {
    serde_json::json!({
        "id": link.id,
        "short_code": link.short_code,
        "short_url": link.short_url,
        "original_url": link.original_url,
        "created_at": link
            .created_at
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap(),
        "clicks_count": link.clicks_count,
    })
}

pub fn response(status: StatusCode, body: &serde_json::Value) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
    }
}
