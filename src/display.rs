use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};
use tracing::warn;

use crate::api::{Click, LinkStats, ShortLink};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day].[month].[year], [hour]:[minute]:[second]");

/// Renders `timestamp` as a day-first local date, e.g. `01.01.2024, 00:00:00`.
#[must_use]
pub fn format_timestamp(timestamp: OffsetDateTime, offset: UtcOffset) -> String {
    let local = timestamp.to_offset(offset);
    local.format(TIMESTAMP_FORMAT).unwrap_or_else(|format_error| {
        warn!(?format_error, "Failed to format timestamp for display");
        local.to_string()
    })
}

/// A [`ShortLink`] prepared for a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRow {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub created: String,
    pub expires: Option<String>,
    pub clicks: u64,
}

impl LinkRow {
    #[must_use]
    pub fn new(link: &ShortLink, offset: UtcOffset) -> Self {
        Self {
            id: link.id,
            short_code: link.short_code.clone(),
            short_url: link.short_url.clone(),
            original_url: link.original_url.clone(),
            created: format_timestamp(link.created_at, offset),
            expires: link
                .expires_at
                .map(|expires_at| format_timestamp(expires_at, offset)),
            clicks: link.clicks_count,
        }
    }
}

/// A single recent click prepared for a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickRow {
    pub clicked: String,
    /// `city, country` or whichever of the two is known.
    pub location: Option<String>,
    pub ip_address: Option<String>,
}

impl ClickRow {
    #[must_use]
    pub fn new(click: &Click, offset: UtcOffset) -> Self {
        let location = match (&click.city, &click.country) {
            (Some(city), Some(country)) => Some(format!("{city}, {country}")),
            (Some(place), None) | (None, Some(place)) => Some(place.clone()),
            (None, None) => None,
        };
        Self {
            clicked: format_timestamp(click.clicked_at, offset),
            location,
            ip_address: click.ip_address.clone(),
        }
    }
}

/// [`LinkStats`] prepared for a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub total_clicks: u64,
    pub unique_ips: u64,
    pub clicks_by_date: Vec<(String, u64)>,
    pub clicks_by_country: Vec<(String, u64)>,
    pub recent_clicks: Vec<ClickRow>,
}

impl StatsReport {
    #[must_use]
    pub fn new(stats: &LinkStats, offset: UtcOffset) -> Self {
        Self {
            total_clicks: stats.total_clicks,
            unique_ips: stats.unique_ips,
            clicks_by_date: stats
                .clicks_by_date
                .iter()
                .map(|day| (day.date.clone(), day.count))
                .collect(),
            clicks_by_country: stats
                .clicks_by_country
                .iter()
                .map(|country| (country.country.clone(), country.count))
                .collect(),
            recent_clicks: stats
                .recent_clicks
                .iter()
                .map(|click| ClickRow::new(click, offset))
                .collect(),
        }
    }
}
