//! Error types for sketch generation.

use std::time::Duration;

/// Coarse classification of a [`SketchError`], stable enough to show in a UI
/// or match on without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No API key, or the service rejected the one supplied.
    MissingCredential,
    /// Invalid client configuration (bad header, bad gateway URL).
    Configuration,
    /// HTTP 429 from the service.
    RateLimited,
    /// HTTP 503 from the service.
    ServiceUnavailable,
    /// The request never produced an HTTP response (DNS, TLS, CORS, reset).
    NetworkTransport,
    /// The model answered with an explanation instead of an image.
    ModelRefusal,
    /// The model answered with neither an image nor an explanation.
    EmptyResponse,
    /// The response body could not be decoded.
    MalformedResponse,
    /// Any other non-success HTTP status.
    Api,
    /// Local I/O failure (reading the photo, saving the sketch).
    Io,
}

impl ErrorKind {
    /// Returns the kebab-case identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing-credential",
            Self::Configuration => "configuration",
            Self::RateLimited => "rate-limited",
            Self::ServiceUnavailable => "service-unavailable",
            Self::NetworkTransport => "network-transport",
            Self::ModelRefusal => "model-refusal",
            Self::EmptyResponse => "empty-response",
            Self::MalformedResponse => "malformed-response",
            Self::Api => "api",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while generating a sketch.
#[derive(Debug, thiserror::Error)]
pub enum SketchError {
    /// API key missing or rejected.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// Client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested wait, from the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The service is temporarily overloaded or down.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The request failed before an HTTP response arrived.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The model declined and explained why.
    #[error("{0}")]
    ModelRefusal(String),

    /// The model returned neither an image nor an explanation.
    #[error("model returned neither image nor explanation, retry.")]
    EmptyResponse,

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// I/O error (e.g., reading the photo or saving the sketch).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SketchError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl SketchError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential(_) => ErrorKind::MissingCredential,
            Self::Config(_) => ErrorKind::Configuration,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            Self::Network(_) => ErrorKind::NetworkTransport,
            Self::ModelRefusal(_) => ErrorKind::ModelRefusal,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Api { .. } => ErrorKind::Api,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns true if this error is transient and worth retrying.
    ///
    /// Only rate limiting and service unavailability qualify. Network
    /// failures are not retried: a rejected cross-origin or unreachable
    /// endpoint fails the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::ServiceUnavailable(_))
    }

    /// Returns the server-suggested retry delay, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Returns a message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential(msg) => format!(
                "No usable API key ({msg}). Set API_KEY or GOOGLE_API_KEY, or pass one explicitly."
            ),
            Self::Config(msg) => format!("The client is misconfigured: {msg}"),
            Self::RateLimited { .. } => "Too many requests right now. Automatic retries were \
                 exhausted; please try again in a few minutes."
                .to_string(),
            Self::ServiceUnavailable(_) => "The generation service is temporarily unavailable. \
                 Automatic retries were exhausted; please try again later."
                .to_string(),
            Self::Network(_) => {
                "Could not reach the generation service. Check the network connection and \
                 endpoint configuration."
                    .to_string()
            }
            Self::ModelRefusal(text) => text.clone(),
            Self::EmptyResponse => self.to_string(),
            Self::MalformedResponse(_) => {
                "The generation service sent a response that could not be read.".to_string()
            }
            Self::Api { status, message } => {
                format!("The generation service rejected the request ({status}): {message}")
            }
            Self::Io(e) => format!("File error: {e}"),
        }
    }
}

/// Result type alias for sketch generation operations.
pub type Result<T> = std::result::Result<T, SketchError>;

/// Maximum length of an upstream error body kept in messages.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Collapses whitespace and truncates an upstream error body so it can be
/// embedded in a one-line message.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    format!("{truncated}...")
}

/// Parses a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
