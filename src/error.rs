use std::sync::Arc;

/// Result type used throughout the SDK.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can be returned by the Enhencer SDK.
///
/// Network failures during event delivery are not represented here: they are logged and the
/// action carries on.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The settings store could not read or persist the visitor id.
    ///
    /// Every settings-store failure is reported as this variant, including I/O errors and locks
    /// poisoned by a panicking thread.
    #[error("settings store error: {0}")]
    Persistence(String),

    /// The collection service response could not be parsed during audience forwarding.
    #[error("unable to parse audience response")]
    Parse(#[source] Arc<serde_json::Error>),

    /// Invalid base URL configuration.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error(transparent)]
    Network(Arc<reqwest::Error>),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(Arc::new(value))
    }
}

impl Error {
    /// Report a settings-store failure as [`Error::Persistence`].
    pub(crate) fn persistence(context: &str, err: impl std::fmt::Display) -> Error {
        Error::Persistence(format!("{}: {}", context, err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(Arc::new(value.without_url()))
    }
}
