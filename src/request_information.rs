//! The abstract HTTP request handed from generated client code to an adapter.

use crate::{
    adapter::RequestAdapter,
    case_insensitive::CaseInsensitiveMap,
    content::RequestContent,
    error::BoxError,
    method::HttpMethod,
    options::{RequestOption, RequestOptions},
    serialization::Parsable,
    uri::RequestUri,
    Error, Result,
};
use bytes::Bytes;
use std::io::Read;
use url::{form_urlencoded, Url};

/// The `Content-Type` header name.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// The content type used for stream bodies.
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// A single outgoing HTTP request, independent of any transport.
///
/// A `RequestInformation` is created per API call, filled in by the caller,
/// and consumed once by a [`RequestAdapter`](crate::RequestAdapter).
///
/// # Examples
///
/// ```
/// use reqinfo::{HttpMethod, RequestInformation};
///
/// # fn main() -> Result<(), reqinfo::Error> {
/// let mut info = RequestInformation::new();
/// info.http_method = Some(HttpMethod::Get);
/// info.set_uri(Some("https://api.example.com/users?$top=5&$skip=10"), None, true)?;
///
/// assert_eq!(info.uri.as_ref().unwrap().as_str(), "https://api.example.com/users");
/// assert_eq!(info.query_parameters.get("$top"), Some(&Some("5".to_string())));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RequestInformation {
    /// The URI of the request, without the query parameters below. A relative
    /// reference is resolved against the adapter's base URL when sending.
    pub uri: Option<RequestUri>,

    /// The HTTP method of the request.
    pub http_method: Option<HttpMethod>,

    /// Decoded query parameters. A `None` value is a parameter present without
    /// a value. Names and values are percent-encoded when the URL is built.
    pub query_parameters: CaseInsensitiveMap<Option<String>>,

    /// Request headers.
    pub headers: CaseInsensitiveMap<String>,

    /// The request body.
    pub content: Option<RequestContent>,

    options: RequestOptions,
}

impl RequestInformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URI of the request.
    ///
    /// With `is_raw_url == false` the URI is `current_path` followed by
    /// `path_segment`. With `is_raw_url == true`, `current_path` is a complete
    /// URL whose query string is split into [`query_parameters`](Self::query_parameters)
    /// and `path_segment` is ignored. Either form may be a relative reference
    /// such as `/users/42`.
    ///
    /// In raw mode, a parameter without `=` is stored with no value, a parameter
    /// with an empty name is skipped, and a parameter that is already present is
    /// overwritten. Only the first `=` of a parameter separates its name from its
    /// value. Names and values are percent-decoded, with `+` read as a space.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidArgument`] if `is_raw_url` is set and `current_path` is
    ///   absent or empty.
    /// * [`Error::MalformedUri`] if the result is neither an absolute URL nor a
    ///   valid relative reference.
    ///
    /// On error the request is left unchanged.
    pub fn set_uri(
        &mut self,
        current_path: Option<&str>,
        path_segment: Option<&str>,
        is_raw_url: bool,
    ) -> Result<()> {
        if !is_raw_url {
            let joined = format!(
                "{}{}",
                current_path.unwrap_or_default(),
                path_segment.unwrap_or_default()
            );
            let uri = RequestUri::parse(&joined)?;
            tracing::debug!(uri = %uri, "Resolved templated URI");
            self.uri = Some(uri);
            return Ok(());
        }

        let current_path = current_path
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                Error::InvalidArgument("current_path cannot be null or empty".to_string())
            })?;

        let (scheme_host_and_path, query) = match current_path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (current_path, None),
        };
        let uri = RequestUri::parse(scheme_host_and_path)?;
        let parameters = query.map(parse_query_string).unwrap_or_default();

        tracing::debug!(
            uri = %uri,
            query_parameters = parameters.len(),
            "Resolved raw URL"
        );

        self.uri = Some(uri);
        for (name, value) in parameters {
            self.query_parameters.insert(name, value);
        }
        Ok(())
    }

    /// Builds the URL to send: [`uri`](Self::uri), resolved against `base` when
    /// it is relative, with every query parameter appended after any query the
    /// URI already carries.
    ///
    /// Names and values are form-encoded, so a value containing `&`, `=` or `#`
    /// stays a single parameter.
    ///
    /// # Errors
    ///
    /// * [`Error::NullArgument`] if no URI has been set.
    /// * [`Error::ConfigurationError`] if the URI is relative and `base` is `None`.
    pub fn url_with_query(&self, base: Option<&Url>) -> Result<Url> {
        let mut url = self
            .uri
            .as_ref()
            .ok_or(Error::NullArgument("uri"))?
            .resolve(base)?;
        if self.query_parameters.is_empty() {
            return Ok(url);
        }

        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in self.query_parameters.iter() {
                match value {
                    Some(value) => pairs.append_pair(name, value),
                    None => pairs.append_key_only(name),
                };
            }
        }
        Ok(url)
    }

    /// Returns the stored request options, one per kind.
    pub fn request_options(&self) -> impl Iterator<Item = &dyn RequestOption> {
        self.options.iter()
    }

    /// Returns the option store for typed lookups.
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Adds options, replacing any stored option of the same kind.
    pub fn add_request_options(
        &mut self,
        options: impl IntoIterator<Item = Box<dyn RequestOption>>,
    ) {
        self.options.add(options);
    }

    /// Removes the stored options that share a kind with the given options.
    pub fn remove_request_options(&mut self, options: &[&dyn RequestOption]) {
        self.options.remove(options);
    }

    /// Sets the body to a binary stream.
    ///
    /// The `Content-Type` header is set to `application/octet-stream`,
    /// replacing any previous value. A previous body is dropped.
    pub fn set_stream_content(&mut self, stream: impl Read + Send + 'static) {
        self.content = Some(RequestContent::Stream(Box::new(stream)));
        self.headers
            .insert(CONTENT_TYPE_HEADER, BINARY_CONTENT_TYPE.to_string());
        tracing::debug!(content_type = BINARY_CONTENT_TYPE, "Set stream content");
    }

    /// Sets the body by serializing `values` as `content_type`.
    ///
    /// A single value is written as an object, several values as a collection.
    /// The writer comes from `adapter`'s serialization writer factory and is
    /// released before this method returns.
    ///
    /// # Errors
    ///
    /// * [`Error::NullArgument`] if `content_type` is empty.
    /// * [`Error::InvalidArgument`] if `values` is empty.
    /// * [`Error::SerializationFailure`] if no writer could be obtained or
    ///   writing failed. The body and headers are left unchanged.
    pub fn set_content_from_parsable(
        &mut self,
        adapter: &dyn RequestAdapter,
        content_type: &str,
        values: &[&dyn Parsable],
    ) -> Result<()> {
        if content_type.is_empty() {
            return Err(Error::NullArgument("content_type"));
        }
        if values.is_empty() {
            return Err(Error::InvalidArgument("values cannot be empty".to_string()));
        }

        let content = serialize_values(adapter, content_type, values).map_err(|source| {
            tracing::warn!(
                content_type = content_type,
                error = %source,
                "Failed to serialize request content"
            );
            Error::SerializationFailure {
                content_type: content_type.to_string(),
                source,
            }
        })?;

        tracing::debug!(
            content_type = content_type,
            values = values.len(),
            bytes = content.len(),
            "Set serialized content"
        );
        self.headers
            .insert(CONTENT_TYPE_HEADER, content_type.to_string());
        self.content = Some(RequestContent::Bytes(content));
        Ok(())
    }
}

/// Writes `values` with a writer scoped to this call.
fn serialize_values(
    adapter: &dyn RequestAdapter,
    content_type: &str,
    values: &[&dyn Parsable],
) -> std::result::Result<Bytes, BoxError> {
    let mut writer = adapter
        .serialization_writer_factory()
        .get_serialization_writer(content_type)?;
    match values {
        [single] => writer.write_object_value(None, *single)?,
        _ => writer.write_collection_of_object_values(None, values)?,
    }
    writer.get_serialized_content()
}

/// Splits a query string into decoded `(name, value)` pairs.
///
/// Tokens with an empty name are dropped; a token without `=` has no value.
fn parse_query_string(query: &str) -> Vec<(String, Option<String>)> {
    query
        .split('&')
        .filter_map(|token| {
            let has_value = token.contains('=');
            let (name, value) = form_urlencoded::parse(token.as_bytes()).next()?;
            if name.is_empty() {
                return None;
            }
            Some((name.into_owned(), has_value.then(|| value.into_owned())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(name: &str, value: Option<&str>) -> (String, Option<String>) {
        (name.to_string(), value.map(str::to_string))
    }

    #[test]
    fn test_parse_query_string_splits_on_first_equals() {
        assert_eq!(
            parse_query_string("filter=a=b&flag&=orphan&&x="),
            vec![pair("filter", Some("a=b")), pair("flag", None), pair("x", Some(""))]
        );
    }

    #[test]
    fn test_parse_query_string_decodes() {
        assert_eq!(
            parse_query_string("q=a%26b%3Dc&name=a%20b+c&%24top=5"),
            vec![pair("q", Some("a&b=c")), pair("name", Some("a b c")), pair("$top", Some("5"))]
        );
    }

    #[test]
    fn test_url_with_query_requires_uri() {
        let info = RequestInformation::new();
        assert!(matches!(info.url_with_query(None), Err(Error::NullArgument("uri"))));
    }

    #[test]
    fn test_url_with_query_without_parameters_has_no_question_mark() {
        let mut info = RequestInformation::new();
        info.set_uri(Some("https://a.com/b"), None, true).unwrap();
        assert_eq!(info.url_with_query(None).unwrap().as_str(), "https://a.com/b");
    }

    #[test]
    fn test_url_with_query_appends_valueless_parameters() {
        let mut info = RequestInformation::new();
        info.set_uri(Some("https://a.com/b?flag"), None, true).unwrap();
        assert_eq!(info.url_with_query(None).unwrap().as_str(), "https://a.com/b?flag");
    }

    #[test]
    fn test_url_with_query_encodes_reserved_characters() {
        let mut info = RequestInformation::new();
        info.set_uri(Some("https://a.com/search"), None, false).unwrap();
        info.query_parameters.insert("q", Some("a&b=c#d".to_string()));
        info.query_parameters.insert("x", Some("1".to_string()));

        let url = info.url_with_query(None).unwrap();
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "a&b=c#d".to_string()),
                ("x".to_string(), "1".to_string())
            ]
        );
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_url_with_query_resolves_relative_uri() {
        let mut info = RequestInformation::new();
        info.set_uri(Some("/users"), Some("/42"), false).unwrap();
        info.query_parameters.insert("expand", None);

        assert!(matches!(
            info.url_with_query(None),
            Err(Error::ConfigurationError(_))
        ));
        let base = Url::parse("https://a.com/v1/").unwrap();
        assert_eq!(
            info.url_with_query(Some(&base)).unwrap().as_str(),
            "https://a.com/users/42?expand"
        );
    }
}
