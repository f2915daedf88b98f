//! Error types for the WebUntis client.

use std::fmt;
use thiserror::Error;

/// The category of a client error.
///
/// The classification drives the retry policy: resolution and upstream
/// transport problems are transient, configuration and authentication
/// problems are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UntisErrorCode {
    /// The supplied server name is not a known WebUntis server.
    UnknownServer,
    /// The server exists but the reachability probe failed.
    UnreachableServer,
    /// Login or token acquisition was rejected.
    AuthenticationFailed,
    /// Connection failed, timed out, or DNS resolution failed.
    NetworkError,
    /// The upstream returned a 5xx status.
    ServerError,
    /// The upstream payload could not be decoded.
    InvalidResponse,
    /// Missing or invalid configuration.
    ConfigurationError,
    /// Unexpected internal state.
    InternalError,
}

impl UntisErrorCode {
    /// Returns true if the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UnreachableServer | Self::NetworkError | Self::ServerError
        )
    }

    /// Returns a stable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownServer => "unknown_server",
            Self::UnreachableServer => "unreachable_server",
            Self::AuthenticationFailed => "authentication_failed",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for UntisErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from talking to WebUntis or preparing to do so.
#[derive(Debug, Error)]
pub struct UntisError {
    code: UntisErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl UntisError {
    /// Creates a new error with the given code and message.
    pub fn new(code: UntisErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unknown-server error.
    pub fn unknown_server(message: impl Into<String>) -> Self {
        Self::new(UntisErrorCode::UnknownServer, message)
    }

    /// Creates an unreachable-server error.
    pub fn unreachable_server(message: impl Into<String>) -> Self {
        Self::new(UntisErrorCode::UnreachableServer, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(UntisErrorCode::AuthenticationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(UntisErrorCode::NetworkError, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(UntisErrorCode::ServerError, message)
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(UntisErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(UntisErrorCode::ConfigurationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(UntisErrorCode::InternalError, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> UntisErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for UntisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for client operations.
pub type UntisResult<T> = Result<T, UntisError>;
