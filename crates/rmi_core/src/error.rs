//! Error types for the invocation runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The single runtime error kind for transport and dispatch failures.
///
/// Anything that goes wrong between the caller and the server object's
/// method body surfaces as one of these: connection failures, malformed
/// wire records, missing or incompatible remote methods. Errors raised by
/// the server object itself are *not* of this kind; they travel back to the
/// caller unchanged inside [`RemoteError::User`].
///
/// The error is serializable because skeletons transmit it to clients in
/// `ERROR` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RmiError {
    message: String,
    cause: Option<String>,
}

impl RmiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap an underlying error, keeping its rendered form.
    pub fn with_cause(message: impl Into<String>, cause: &dyn fmt::Display) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

impl fmt::Display for RmiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {})", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for RmiError {}

impl From<std::io::Error> for RmiError {
    fn from(e: std::io::Error) -> Self {
        Self::with_cause("I/O error", &e)
    }
}

/// The declared failure set of every remote method.
///
/// A method on a remote interface returns `Result<T, RemoteError<E>>`:
/// `User` carries the error value the server object raised from inside the
/// method body, `Rmi` carries a transport or dispatch failure. Stubs
/// re-raise a received `User` value untouched, so callers can match on
/// their own error type exactly as if the call had been local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoteError<E = ()> {
    /// Transport or dispatch failure inside the runtime.
    Rmi(RmiError),
    /// Error raised by the server object's method.
    User(E),
}

impl<E> From<RmiError> for RemoteError<E> {
    fn from(e: RmiError) -> Self {
        RemoteError::Rmi(e)
    }
}

impl<E: fmt::Display> fmt::Display for RemoteError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Rmi(e) => write!(f, "rmi error: {}", e),
            RemoteError::User(e) => write!(f, "remote error: {}", e),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RemoteError<E> {}
