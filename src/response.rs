//! Raw response returned by the adapter.
//!
//! The [`Response`] type carries the status, headers, and body bytes of a
//! successful exchange along with how long it took. Decoding the body into a
//! model is left to the caller.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A successful (2xx) HTTP response.
///
/// # Examples
///
/// ```no_run
/// use reqinfo::{HttpMethod, ReqwestAdapter, RequestInformation};
///
/// # async fn example() -> Result<(), reqinfo::Error> {
/// let adapter = ReqwestAdapter::builder().build()?;
///
/// let mut info = RequestInformation::new();
/// info.http_method = Some(HttpMethod::Get);
/// info.set_uri(Some("https://api.example.com/users/123"), None, true)?;
///
/// let response = adapter.send(info).await?;
/// println!("Status: {}", response.status);
/// println!("Request took {:?}", response.latency);
/// println!("Body: {}", response.text_lossy());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The raw response body.
    pub body: Bytes,

    /// Time from sending the request until the body was fully received.
    pub latency: Duration,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, latency: Duration) -> Self {
        Self {
            status,
            headers,
            body,
            latency,
        }
    }

    /// Returns a header value by name, if present and valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// # use reqinfo::Response;
    /// # use bytes::Bytes;
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// # use std::time::Duration;
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", HeaderValue::from_static("application/json"));
    ///
    /// let response = Response::new(StatusCode::OK, headers, Bytes::new(), Duration::from_millis(5));
    /// assert_eq!(response.header("Content-Type"), Some("application/json"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns the response content type without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        let header = self.header(http::header::CONTENT_TYPE.as_str())?;
        let essence = header.split(';').next()?.trim();
        (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
