//! Request targets that may be absolute URLs or relative references.

use crate::{Error, Result};
use std::fmt;
use url::Url;

/// Base used only to check that a relative reference is well formed.
const CHECK_BASE: &str = "http://reference.invalid/";

/// The target URI of a request.
///
/// Generated code may build a path such as `/users/42` before a base URL is
/// known, so a relative reference is kept as written and resolved against the
/// adapter's base URL when the request is sent.
///
/// # Examples
///
/// ```
/// use reqinfo::RequestUri;
/// use url::Url;
///
/// # fn main() -> Result<(), reqinfo::Error> {
/// let uri = RequestUri::parse("/users/42")?;
/// assert!(uri.is_relative());
///
/// let base = Url::parse("https://api.example.com/v1/").unwrap();
/// assert_eq!(uri.resolve(Some(&base))?.as_str(), "https://api.example.com/users/42");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestUri {
    Absolute(Url),
    Relative(String),
}

impl RequestUri {
    /// Parses an absolute URL or a relative reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedUri`] if `input` is neither.
    pub fn parse(input: &str) -> Result<Self> {
        match Url::parse(input) {
            Ok(url) => Ok(RequestUri::Absolute(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                check_reference(input)?;
                Url::parse(CHECK_BASE)
                    .and_then(|base| base.join(input))
                    .map_err(|e| malformed(input, e))?;
                Ok(RequestUri::Relative(input.to_owned()))
            }
            Err(e) => Err(malformed(input, e)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RequestUri::Absolute(url) => url.as_str(),
            RequestUri::Relative(reference) => reference,
        }
    }

    pub fn as_absolute(&self) -> Option<&Url> {
        match self {
            RequestUri::Absolute(url) => Some(url),
            RequestUri::Relative(_) => None,
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, RequestUri::Relative(_))
    }

    /// Returns the absolute URL, joining a relative reference onto `base`.
    ///
    /// # Errors
    ///
    /// * [`Error::ConfigurationError`] if the reference is relative and no base
    ///   is given.
    /// * [`Error::MalformedUri`] if joining fails.
    pub fn resolve(&self, base: Option<&Url>) -> Result<Url> {
        match self {
            RequestUri::Absolute(url) => Ok(url.clone()),
            RequestUri::Relative(reference) => {
                let base = base.ok_or_else(|| {
                    Error::ConfigurationError(format!(
                        "relative URI {} requires a base URL",
                        reference
                    ))
                })?;
                base.join(reference).map_err(|e| malformed(reference, e))
            }
        }
    }
}

impl fmt::Display for RequestUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Url> for RequestUri {
    fn from(url: Url) -> Self {
        RequestUri::Absolute(url)
    }
}

fn malformed(input: &str, error: impl fmt::Display) -> Error {
    Error::MalformedUri(format!("{}: {}", input, error))
}

/// Rejects characters that cannot appear unescaped in a URI reference, and
/// `%` not followed by two hex digits.
fn check_reference(input: &str) -> Result<()> {
    let bytes = input.as_bytes();
    for (i, c) in input.char_indices() {
        let invalid = c.is_whitespace()
            || c.is_control()
            || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`')
            || (c == '%'
                && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                    && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit)));
        if invalid {
            return Err(malformed(
                input,
                format!("invalid character {:?} at {}", c, i),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_and_relative() {
        assert!(!RequestUri::parse("https://a.com/b").unwrap().is_relative());
        assert!(RequestUri::parse("/users/42").unwrap().is_relative());
        assert!(RequestUri::parse("users/42?x=%20").unwrap().is_relative());
    }

    #[test]
    fn test_invalid_references_are_malformed() {
        for input in ["not a uri", "/a|b", "/bad%zz", "/trailing%2"] {
            let result = RequestUri::parse(input);
            assert!(
                matches!(result, Err(Error::MalformedUri(_))),
                "{} should be malformed, got {:?}",
                input,
                result
            );
        }
        assert!(matches!(
            RequestUri::parse("http://[::1"),
            Err(Error::MalformedUri(_))
        ));
    }

    #[test]
    fn test_resolve_relative_requires_base() {
        let uri = RequestUri::parse("items/7").unwrap();
        assert!(matches!(uri.resolve(None), Err(Error::ConfigurationError(_))));

        let base = Url::parse("https://a.com/api/").unwrap();
        assert_eq!(
            uri.resolve(Some(&base)).unwrap().as_str(),
            "https://a.com/api/items/7"
        );
    }
}
