//! Request adapters: the execution side that consumes [`RequestInformation`].
//!
//! [`RequestAdapter`] is what body composition needs from a transport (its
//! serialization writer factory). [`ReqwestAdapter`] is the `reqwest`-backed
//! implementation that sends a finalized request and returns the raw response.

use crate::{
    content::RequestContent,
    options::{OptionKind, RequestOption, TimeoutOption},
    request_information::RequestInformation,
    serialization::{SerializationWriterFactory, SerializationWriterFactoryRegistry},
    Error, Response, Result,
};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// The transport-side services a request needs while it is being built.
pub trait RequestAdapter: Send + Sync {
    /// The factory used to serialize request bodies.
    fn serialization_writer_factory(&self) -> &dyn SerializationWriterFactory;
}

type RequestConfigurator = dyn Fn(&mut reqwest::Request) + Send + Sync;

/// Enriches the outgoing `reqwest::Request` just before it is sent, for
/// example with tracing or correlation headers.
///
/// Set it per request with
/// [`add_request_options`](RequestInformation::add_request_options), or as an
/// adapter-wide default with [`ReqwestAdapterBuilder::telemetry`]. An option on
/// the request replaces the default.
///
/// # Examples
///
/// ```
/// use reqinfo::adapter::TelemetryOption;
/// use reqinfo::RequestOption;
///
/// let option = TelemetryOption::new(|request| {
///     request
///         .headers_mut()
///         .insert("x-client-request-id", "42".parse().unwrap());
/// });
/// assert_eq!(option.kind(), TelemetryOption::KIND);
/// ```
#[derive(Clone)]
pub struct TelemetryOption {
    configurator: Arc<RequestConfigurator>,
}

impl TelemetryOption {
    pub const KIND: OptionKind = OptionKind::new("reqinfo.telemetry");

    pub fn new(configurator: impl Fn(&mut reqwest::Request) + Send + Sync + 'static) -> Self {
        Self {
            configurator: Arc::new(configurator),
        }
    }

    /// Runs the configurator against `request`.
    pub fn apply(&self, request: &mut reqwest::Request) {
        (self.configurator)(request);
    }
}

impl fmt::Debug for TelemetryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryOption").finish_non_exhaustive()
    }
}

impl RequestOption for TelemetryOption {
    fn kind(&self) -> OptionKind {
        Self::KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Sends [`RequestInformation`] with `reqwest`.
///
/// The adapter is designed to be reused across requests. Cloning it is cheap
/// and shares the underlying connection pool.
///
/// # Examples
///
/// ```no_run
/// use reqinfo::{HttpMethod, ReqwestAdapter, RequestInformation};
/// use reqinfo::serialization::SerdeModel;
/// use serde::Serialize;
/// use std::time::Duration;
///
/// #[derive(Serialize)]
/// struct CreateUser {
///     name: String,
/// }
///
/// # async fn example() -> Result<(), reqinfo::Error> {
/// let adapter = ReqwestAdapter::builder()
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
///
/// let mut info = RequestInformation::new();
/// info.http_method = Some(HttpMethod::Post);
/// info.set_uri(Some("https://api.example.com"), Some("/users"), false)?;
/// let body = SerdeModel(CreateUser { name: "Alice".to_string() });
/// info.set_content_from_parsable(&adapter, "application/json", &[&body])?;
///
/// let response = adapter.send(info).await?;
/// println!("Created: {}", response.text_lossy());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ReqwestAdapter {
    inner: Arc<AdapterInner>,
}

struct AdapterInner {
    http_client: reqwest::Client,
    serialization_writer_factory: Arc<dyn SerializationWriterFactory>,
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    telemetry: Option<TelemetryOption>,
}

impl ReqwestAdapter {
    /// Creates a new `ReqwestAdapterBuilder` for configuring an adapter.
    pub fn builder() -> ReqwestAdapterBuilder {
        ReqwestAdapterBuilder::new()
    }

    /// Converts request information into a `reqwest::Request`.
    ///
    /// A relative URI is resolved against the adapter's base URL. Default
    /// headers are applied first so that request headers override them. A
    /// [`TimeoutOption`] or [`TelemetryOption`] on the request takes precedence
    /// over the adapter's. The telemetry configurator runs last.
    ///
    /// A stream body is read on the calling thread. [`send`](Self::send) reads
    /// it on the blocking pool before calling this.
    ///
    /// # Errors
    ///
    /// * [`Error::NullArgument`] if the method or the URI is not set.
    /// * [`Error::ConfigurationError`] if a header name or value is invalid, or
    ///   the URI is relative and the adapter has no base URL.
    /// * [`Error::ContentRead`] if a stream body cannot be read.
    pub fn to_reqwest_request(&self, info: RequestInformation) -> Result<reqwest::Request> {
        let method = info.http_method.ok_or(Error::NullArgument("http_method"))?;
        let url = info.url_with_query(self.inner.base_url.as_ref())?;

        let mut request = reqwest::Request::new(method.into(), url);

        let headers = request.headers_mut();
        for (name, value) in &self.inner.default_headers {
            headers.insert(name, value.clone());
        }
        for (name, value) in info.headers.iter() {
            let (name, value) = parse_header(name, value)?;
            headers.insert(name, value);
        }

        let timeout = info
            .options()
            .get::<TimeoutOption>(TimeoutOption::KIND)
            .map(|option| option.0)
            .or(self.inner.timeout);
        if let Some(timeout) = timeout {
            *request.timeout_mut() = Some(timeout);
        }

        let telemetry = info
            .options()
            .get::<TelemetryOption>(TelemetryOption::KIND)
            .or(self.inner.telemetry.as_ref())
            .cloned();

        if let Some(content) = info.content {
            *request.body_mut() = Some(content.into_bytes()?.into());
        }

        if let Some(telemetry) = telemetry {
            telemetry.apply(&mut request);
        }

        Ok(request)
    }

    /// Sends the request and returns the raw response.
    ///
    /// # Errors
    ///
    /// * [`Error::HttpError`] if the server answers with a non-2xx status.
    /// * [`Error::Network`] if the request could not be sent or the body
    ///   could not be received.
    /// * Any error from [`to_reqwest_request`](Self::to_reqwest_request).
    pub async fn send(&self, mut info: RequestInformation) -> Result<Response> {
        info.content = match info.content.take() {
            Some(stream @ RequestContent::Stream(_)) => {
                Some(RequestContent::Bytes(read_blocking(stream).await?))
            }
            content => content,
        };
        let request = self.to_reqwest_request(info)?;

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Executing HTTP request"
        );

        let start_time = Instant::now();
        let response = self.inner.http_client.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        let latency = start_time.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        if !status.is_success() {
            let raw_response = String::from_utf8_lossy(&body).into_owned();

            if status.is_client_error() {
                tracing::error!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Client error (4xx)"
                );
            } else if status.is_server_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Server error (5xx)"
                );
            }

            return Err(Error::HttpError {
                status,
                raw_response,
                headers,
            });
        }

        Ok(Response::new(status, headers, body, latency))
    }

    /// Sends the request and discards the response body.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_no_response_content(&self, info: RequestInformation) -> Result<()> {
        self.send(info).await.map(|_| ())
    }
}

impl RequestAdapter for ReqwestAdapter {
    fn serialization_writer_factory(&self) -> &dyn SerializationWriterFactory {
        self.inner.serialization_writer_factory.as_ref()
    }
}

/// Drains a stream body on tokio's blocking pool.
async fn read_blocking(content: RequestContent) -> Result<Bytes> {
    let bytes = tokio::task::spawn_blocking(move || content.into_bytes())
        .await
        .map_err(|e| Error::ContentRead(std::io::Error::other(e)))??;
    Ok(bytes)
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

/// Builder for configuring and creating a [`ReqwestAdapter`].
///
/// # Examples
///
/// ```no_run
/// use reqinfo::ReqwestAdapterBuilder;
/// use reqinfo::serialization::SerializationWriterFactoryRegistry;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), reqinfo::Error> {
/// let adapter = ReqwestAdapterBuilder::new()
///     .base_url("https://api.example.com/v1/")?
///     .serialization_writer_factory(Arc::new(SerializationWriterFactoryRegistry::with_defaults()))
///     .timeout(Duration::from_secs(30))
///     .default_header("Accept", "application/json")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ReqwestAdapterBuilder {
    serialization_writer_factory: Option<Arc<dyn SerializationWriterFactory>>,
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    telemetry: Option<TelemetryOption>,
}

impl ReqwestAdapterBuilder {
    /// Creates a new `ReqwestAdapterBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            serialization_writer_factory: None,
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: None,
            telemetry: None,
        }
    }

    /// Sets the base URL that relative request URIs are resolved against.
    ///
    /// Resolution follows URL joining rules: `/users` replaces the whole path,
    /// while `users` is appended after the base path's last `/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedUri`] if `url` is not an absolute URL.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        let parsed =
            Url::parse(url).map_err(|e| Error::MalformedUri(format!("{}: {}", url, e)))?;
        self.base_url = Some(parsed);
        Ok(self)
    }

    /// Sets the factory used to serialize request bodies.
    ///
    /// Defaults to [`SerializationWriterFactoryRegistry::with_defaults`].
    pub fn serialization_writer_factory(
        mut self,
        factory: Arc<dyn SerializationWriterFactory>,
    ) -> Self {
        self.serialization_writer_factory = Some(factory);
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the telemetry option used for requests that carry none.
    pub fn telemetry(mut self, telemetry: TelemetryOption) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Builds the configured `ReqwestAdapter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn build(self) -> Result<ReqwestAdapter> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let serialization_writer_factory = self
            .serialization_writer_factory
            .unwrap_or_else(|| Arc::new(SerializationWriterFactoryRegistry::with_defaults()));

        Ok(ReqwestAdapter {
            inner: Arc::new(AdapterInner {
                http_client,
                serialization_writer_factory,
                base_url: self.base_url,
                default_headers: self.default_headers,
                timeout: self.timeout,
                telemetry: self.telemetry,
            }),
        })
    }
}

impl Default for ReqwestAdapterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
