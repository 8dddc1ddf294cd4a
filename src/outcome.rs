/// The displayed state of a single request lifecycle.
///
/// A controller holds at most one of these at a time. `Loading` always resolves into either
/// `Success` or `Failure`, and beginning a new request replaces whatever was shown before.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestOutcome<T> {
    #[default]
    Loading,
    Success(T),
    Failure(String),
}

impl<T> RequestOutcome<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Loading | Self::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failure(message) => Some(message.as_str()),
            Self::Loading | Self::Success(_) => None,
        }
    }
}
