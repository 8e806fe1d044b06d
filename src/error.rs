//! Error types for building and sending request information.
//!
//! Every failure in this crate is surfaced as an explicit [`Error`] value. None of
//! them are retried here; a failed mutation leaves the request information exactly
//! as it was before the call.

use http::{HeaderMap, StatusCode};

/// A boxed error returned by pluggable collaborators such as serialization writers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for building and sending request information.
///
/// # Examples
///
/// ```
/// use reqinfo::{Error, RequestInformation};
///
/// let mut info = RequestInformation::new();
/// match info.set_uri(Some(""), None, true) {
///     Err(Error::InvalidArgument(message)) => eprintln!("bad input: {}", message),
///     other => panic!("unexpected result: {:?}", other),
/// }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A required string input was missing or empty.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required input was absent.
    ///
    /// The payload names the missing argument or field.
    #[error("Missing required argument: {0}")]
    NullArgument(&'static str),

    /// A URI string is neither an absolute URL nor a valid relative reference.
    ///
    /// There is no recovery path other than fixing the input.
    #[error("Malformed URI: {0}")]
    MalformedUri(String),

    /// Acquiring a serialization writer or writing the body failed.
    ///
    /// # Fields
    ///
    /// * `content_type` - The content type the body was being serialized as
    /// * `source` - The error reported by the writer or its factory
    #[error("Could not serialize payload as {content_type}: {source}")]
    SerializationFailure {
        /// The content type requested for the body
        content_type: String,
        /// The underlying writer error
        #[source]
        source: BoxError,
    },

    /// A network-level error occurred while sending the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server returned a non-2xx HTTP status code.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// Invalid adapter or request configuration, such as an invalid header.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A stream body could not be read before sending.
    #[error("Failed to read request content: {0}")]
    ContentRead(#[from] std::io::Error),
}

impl Error {
    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
