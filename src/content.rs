//! The body of a request.

use bytes::Bytes;
use std::fmt;
use std::io::Read;

/// The content source of a request body.
pub enum RequestContent {
    /// A caller-supplied stream, sent as `application/octet-stream`.
    Stream(Box<dyn Read + Send>),
    /// Bytes produced by a serialization writer.
    Bytes(Bytes),
}

impl RequestContent {
    /// Reads the whole content into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the stream fails.
    pub fn into_bytes(self) -> std::io::Result<Bytes> {
        match self {
            RequestContent::Bytes(bytes) => Ok(bytes),
            RequestContent::Stream(mut stream) => {
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Returns the serialized bytes, or `None` for a stream.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            RequestContent::Bytes(bytes) => Some(bytes),
            RequestContent::Stream(_) => None,
        }
    }
}

impl fmt::Debug for RequestContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestContent::Stream(_) => f.write_str("Stream(..)"),
            RequestContent::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
        }
    }
}
