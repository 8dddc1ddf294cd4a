use std::{
    env::{self, VarError},
    num::NonZeroUsize,
    time::Duration,
};

use rearch::{CapsuleHandle, Container};
use reqwest::Client;
use time::{UtcOffset, macros::format_description};
use tracing::{info, instrument, warn};
use url::Url;

#[must_use]
#[instrument]
pub fn init_container() -> Container {
    info!("Initializing container");
    let container = Container::new();

    let (api_base_url, page_size, request_timeout) = container.read((
        api_base_url_capsule,
        page_size_capsule,
        request_timeout_capsule,
    ));
    info!(%api_base_url, page_size, ?request_timeout, "Container initialized");

    container
}

/// # Panics
/// Panics when environment variable is invalid.
#[must_use]
pub fn api_base_url_capsule(_: CapsuleHandle) -> Url {
    const ENV_VAR_NAME: &str = "API_URL";
    const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/";

    let raw = read_var(ENV_VAR_NAME).unwrap_or_else(|| {
        warn!(
            api_url = DEFAULT_API_URL,
            "{ENV_VAR_NAME} environment variable not set; defaulting to {DEFAULT_API_URL}"
        );
        DEFAULT_API_URL.to_owned()
    });
    Url::parse(&raw).unwrap_or_else(|err| {
        panic!("{ENV_VAR_NAME} environment variable is not a valid URL ({raw}): {err}")
    })
}

/// # Panics
/// Panics when environment variable is invalid.
#[must_use]
pub fn page_size_capsule(_: CapsuleHandle) -> usize {
    const ENV_VAR_NAME: &str = "PAGE_SIZE";
    const DEFAULT_PAGE_SIZE: usize = 20;

    read_var(ENV_VAR_NAME).map_or_else(
        || {
            info!(
                page_size = DEFAULT_PAGE_SIZE,
                "{ENV_VAR_NAME} environment variable not set; defaulting to {DEFAULT_PAGE_SIZE}"
            );
            DEFAULT_PAGE_SIZE
        },
        |raw| {
            parse_page_size(&raw).unwrap_or_else(|| {
                panic!("{ENV_VAR_NAME} environment variable must be a positive integer: {raw}")
            })
        },
    )
}

/// Requests have no deadline unless `REQUEST_TIMEOUT_SECS` is set.
///
/// # Panics
/// Panics when environment variable is invalid.
#[must_use]
pub fn request_timeout_capsule(_: CapsuleHandle) -> Option<Duration> {
    const ENV_VAR_NAME: &str = "REQUEST_TIMEOUT_SECS";

    read_var(ENV_VAR_NAME).map(|raw| {
        raw.parse()
            .map(Duration::from_secs)
            .unwrap_or_else(|err| {
                panic!("{ENV_VAR_NAME} environment variable is invalid ({raw}): {err}")
            })
    })
}

/// Offset used when rendering timestamps. Defaults to UTC.
///
/// # Panics
/// Panics when environment variable is invalid.
#[must_use]
pub fn display_offset_capsule(_: CapsuleHandle) -> UtcOffset {
    const ENV_VAR_NAME: &str = "DISPLAY_UTC_OFFSET";

    read_var(ENV_VAR_NAME).map_or(UtcOffset::UTC, |raw| {
        parse_offset(&raw).unwrap_or_else(|err| {
            panic!("{ENV_VAR_NAME} environment variable must look like +03:00 ({raw}): {err}")
        })
    })
}

/// # Panics
/// Panics when the HTTP client cannot be constructed (e.g. no TLS backend is available).
pub fn http_client_capsule(CapsuleHandle { mut get, .. }: CapsuleHandle) -> Client {
    let timeout = *get.as_ref(request_timeout_capsule);

    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .unwrap_or_else(|err| panic!("Failed to build HTTP client: {err}"))
}

fn read_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            info!(name, value = %value, "Environment variable set");
            Some(value)
        }
        Err(VarError::NotPresent) => None,
        Err(VarError::NotUnicode(actual)) => {
            panic!("{name} environment variable is invalid: {}", actual.display());
        }
    }
}

fn parse_page_size(raw: &str) -> Option<usize> {
    raw.trim().parse::<NonZeroUsize>().ok().map(NonZeroUsize::get)
}

fn parse_offset(raw: &str) -> Result<UtcOffset, time::error::Parse> {
    UtcOffset::parse(
        raw.trim(),
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use time::macros::offset;

    use super::*;

    #[test]
    fn test_parse_page_size() {
        assert_eq!(parse_page_size("20"), Some(20));
        assert_eq!(parse_page_size(" 5 "), Some(5));
        assert_eq!(parse_page_size("0"), None);
        assert_eq!(parse_page_size("-1"), None);
        assert_eq!(parse_page_size("twenty"), None);
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+03:00").unwrap(), offset!(+3));
        assert_eq!(parse_offset("-05:30").unwrap(), offset!(-5:30));
        assert!(parse_offset("3").is_err());
    }
}
