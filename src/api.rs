use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Collection endpoint for short links, relative to the API base URL.
pub const LINKS_PATH: &str = "/api/v1/urls";

#[must_use]
pub fn link_path(id: i64) -> String {
    format!("{LINKS_PATH}/{id}")
}

#[must_use]
pub fn link_stats_path(id: i64) -> String {
    format!("{LINKS_PATH}/{id}/stats")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateLinkRequest {
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expires_at: Option<OffsetDateTime>,
}

impl CreateLinkRequest {
    /// An empty `custom_code` is treated as absent so it never reaches the API.
    #[must_use]
    pub fn new(original_url: impl Into<String>, custom_code: Option<&str>) -> Self {
        Self {
            original_url: original_url.into(),
            custom_code: custom_code
                .filter(|code| !code.is_empty())
                .map(str::to_owned),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: Option<OffsetDateTime>) -> Self {
        self.expires_at = expires_at;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShortLink {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    #[serde(default)]
    pub original_url: String,
    /// Timestamp in ISO-8601 format
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub clicks_count: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct Error {
    #[serde(default)]
    pub error: Option<String>,
}

/// Click analytics for one link, as served by `GET /api/v1/urls/{id}/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkStats {
    pub total_clicks: u64,
    pub unique_ips: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clicks_by_date: Vec<DateCount>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clicks_by_country: Vec<CountryCount>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recent_clicks: Vec<Click>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Click {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub clicked_at: OffsetDateTime,
    #[serde(default, deserialize_with = "nullable_text")]
    pub ip_address: Option<String>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub city: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a plain string, `null`, or a nullable-column object `{"String": .., "Valid": ..}`.
fn nullable_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Plain(String),
        Column {
            #[serde(rename = "String")]
            value: String,
            #[serde(rename = "Valid")]
            valid: bool,
        },
    }

    let text = match Option::<Text>::deserialize(deserializer)? {
        Some(Text::Plain(value) | Text::Column { value, valid: true }) => Some(value),
        Some(Text::Column { valid: false, .. }) | None => None,
    };
    Ok(text.filter(|value| !value.is_empty()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_create_request_omits_empty_custom_code() {
        let body = serde_json::to_value(CreateLinkRequest::new("https://example.com", Some("")))
            .unwrap();
        assert_eq!(body, json!({ "original_url": "https://example.com" }));
    }

    #[test]
    fn test_create_request_keeps_custom_code_verbatim() {
        let body = serde_json::to_value(CreateLinkRequest::new(
            "https://example.com",
            Some("mycode"),
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({ "original_url": "https://example.com", "custom_code": "mycode" })
        );
    }

    #[test]
    fn test_create_request_with_expiry() {
        let body = serde_json::to_value(
            CreateLinkRequest::new("https://example.com", None)
                .with_expiry(Some(datetime!(2030-05-01 12:00 UTC))),
        )
        .unwrap();
        assert_eq!(body["expires_at"], "2030-05-01T12:00:00Z");
        assert!(body.get("custom_code").is_none());
    }

    #[test]
    fn test_short_link_without_original_url() {
        let link: ShortLink = serde_json::from_value(json!({
            "id": 1,
            "short_code": "abc123",
            "short_url": "https://s.example/abc123",
            "created_at": "2024-01-01T00:00:00Z",
            "clicks_count": 0
        }))
        .unwrap();

        assert_eq!(link.id, 1);
        assert_eq!(link.short_code, "abc123");
        assert_eq!(link.original_url, "");
        assert_eq!(link.created_at, datetime!(2024-01-01 0:00 UTC));
        assert_eq!(link.expires_at, None);
        assert_eq!(link.clicks_count, 0);
    }

    #[test]
    fn test_short_link_with_fractional_timestamp() {
        let link: ShortLink = serde_json::from_value(json!({
            "id": 7,
            "short_code": "xyz",
            "short_url": "https://s.example/xyz",
            "original_url": "https://example.com/very/long",
            "created_at": "2024-03-05T10:20:30.123456+03:00",
            "expires_at": "2024-04-05T10:20:30Z",
            "clicks_count": 42
        }))
        .unwrap();

        assert_eq!(link.created_at.offset().whole_hours(), 3);
        assert_eq!(link.expires_at, Some(datetime!(2024-04-05 10:20:30 UTC)));
        assert_eq!(link.clicks_count, 42);
    }

    #[test]
    fn test_single_link_paths() {
        assert_eq!(link_path(7), "/api/v1/urls/7");
        assert_eq!(link_stats_path(7), "/api/v1/urls/7/stats");
    }

    #[test]
    fn test_link_stats() {
        let stats: LinkStats = serde_json::from_value(json!({
            "total_clicks": 12,
            "unique_ips": 4,
            "clicks_by_date": [{ "date": "2024-01-02", "count": 9 }],
            "clicks_by_country": [{ "country": "DE", "count": 12 }],
            "recent_clicks": [
                {
                    "id": 3,
                    "url_id": 7,
                    "clicked_at": "2024-01-02T10:00:00Z",
                    "ip_address": { "String": "10.0.0.1", "Valid": true },
                    "country": { "String": "", "Valid": false },
                    "city": "Berlin"
                },
                { "id": 2, "url_id": 7, "clicked_at": "2024-01-01T09:00:00Z" }
            ]
        }))
        .unwrap();

        assert_eq!(stats.total_clicks, 12);
        assert_eq!(stats.clicks_by_date[0].count, 9);
        assert_eq!(stats.clicks_by_country[0].country, "DE");

        let latest = &stats.recent_clicks[0];
        assert_eq!(latest.clicked_at, datetime!(2024-01-02 10:00 UTC));
        assert_eq!(latest.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(latest.country, None);
        assert_eq!(latest.city.as_deref(), Some("Berlin"));
        assert_eq!(stats.recent_clicks[1].ip_address, None);
    }

    #[test]
    fn test_link_stats_without_clicks() {
        let stats: LinkStats = serde_json::from_value(json!({
            "total_clicks": 0,
            "unique_ips": 0,
            "clicks_by_date": null,
            "clicks_by_country": null,
            "recent_clicks": null
        }))
        .unwrap();

        assert!(stats.clicks_by_date.is_empty());
        assert!(stats.clicks_by_country.is_empty());
        assert!(stats.recent_clicks.is_empty());
    }

    #[test]
    fn test_error_body_without_error_field() {
        let error: Error = serde_json::from_str(r#"{"message":"nope"}"#).unwrap();
        assert_eq!(error.error, None);
    }
}
