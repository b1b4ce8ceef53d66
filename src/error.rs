//! Some common error types.

use std::{
    convert::Infallible,
    error::Error as StdError,
    fmt::{self, Debug, Display, Formatter},
};

use crate::{http::StatusCode, Response};

/// General error.
#[derive(Debug)]
pub struct Error {
    status: StatusCode,
    reason: anyhow::Error,
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        unreachable!()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.reason)
    }
}

#[derive(Debug)]
struct StatusError(StatusCode);

impl Display for StatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for StatusError {}

impl Error {
    /// Create a new error with status code.
    #[inline]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: anyhow::Error::from(StatusError(status)),
        }
    }

    /// Sets the reason for this error.
    #[inline]
    pub fn with_reason(self, reason: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            reason: anyhow::Error::from(reason),
            ..self
        }
    }

    /// Sets the reason string for this error.
    #[inline]
    pub fn with_reason_string(self, reason: impl Display + Debug + Send + Sync + 'static) -> Self {
        Self {
            reason: anyhow::Error::msg(reason),
            ..self
        }
    }

    /// Returns the status code of this error.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the reason of this error.
    #[inline]
    pub fn reason(&self) -> &impl Display {
        &self.reason
    }

    /// Downcast this error object by reference.
    pub fn downcast_ref<T: Display + Debug + Send + Sync + 'static>(&self) -> Option<&T> {
        self.reason.downcast_ref()
    }

    /// Returns `true` if the reason of this error is of type `T`.
    pub fn is<T: Display + Debug + Send + Sync + 'static>(&self) -> bool {
        self.reason.is::<T>()
    }

    /// Creates full response for this error.
    pub fn as_response(&self) -> Response {
        Response::builder()
            .status(self.status)
            .body(self.reason.to_string())
    }
}

/// A specialized Result type for this crate.
pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// No route matched the request, and no custom not-found endpoint was set.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("not found")]
pub struct NotFoundError;

impl From<NotFoundError> for Error {
    fn from(err: NotFoundError) -> Self {
        Error::new(StatusCode::NOT_FOUND).with_reason(err)
    }
}

/// A possible error value when compiling a path pattern.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ParsePatternError {
    /// The same capture name appears more than once in one pattern.
    #[error("duplicate capture name `{name}` in pattern `{pattern}`")]
    DuplicateName {
        /// The pattern text.
        pattern: String,
        /// The repeated name.
        name: String,
    },
}

impl From<ParsePatternError> for Error {
    fn from(err: ParsePatternError) -> Self {
        Error::new(StatusCode::INTERNAL_SERVER_ERROR).with_reason(err)
    }
}
