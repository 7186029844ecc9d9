//! Error types for portal and calendar store operations.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
///
/// Session-level codes drive the fetch retry loop; transport-level codes
/// drive per-request handling against the calendar store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// A required input field was absent in the authentication step.
    LoginInputMissing,
    /// An expected UI affordance never became interactable.
    NavigationTimeout,
    /// The automation session itself became unusable.
    TransportFailure,
    /// Authentication failed or credentials are invalid/expired.
    AuthenticationFailed,
    /// Network error - connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// Rate limit exceeded - too many requests.
    RateLimited,
    /// Server returned an error (5xx status codes).
    ServerError,
    /// Invalid response from the server - parse error, unexpected format.
    InvalidResponse,
    /// Resource not found (404).
    NotFound,
    /// Configuration error - missing or invalid config.
    ConfigurationError,
    /// Calendar-specific error - e.g. target calendar not found.
    CalendarError,
    /// Internal error - unexpected state, bug.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if a whole fetch session should be torn down and
    /// re-attempted for this error.
    pub fn is_session_retryable(&self) -> bool {
        matches!(
            self,
            Self::LoginInputMissing | Self::NavigationTimeout | Self::TransportFailure
        )
    }

    /// Returns true if this error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginInputMissing => "login_input_missing",
            Self::NavigationTimeout => "navigation_timeout",
            Self::TransportFailure => "transport_failure",
            Self::AuthenticationFailed => "authentication_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::ConfigurationError => "configuration_error",
            Self::CalendarError => "calendar_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from the portal session or the calendar store.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    /// The error code categorizing this error.
    code: ProviderErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a missing-login-input error.
    pub fn login_input_missing(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::LoginInputMissing, message)
    }

    /// Creates a navigation timeout error.
    pub fn navigation_timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NavigationTimeout, message)
    }

    /// Creates a transport failure error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::TransportFailure, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates a calendar-specific error.
    pub fn calendar(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::CalendarError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if a whole fetch session should be re-attempted.
    pub fn is_session_retryable(&self) -> bool {
        self.code.is_session_retryable()
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
