//! Per-request options.
//!
//! Options are arbitrary typed values consumed by the adapter or middleware.
//! Each option type declares a stable [`OptionKind`], and a request holds at
//! most one option of each kind.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// A stable identifier shared by every instance of one option type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionKind(&'static str);

impl OptionKind {
    /// Creates a kind from a name that is unique among option types.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A typed configuration value attached to a request.
///
/// # Examples
///
/// ```
/// use reqinfo::{OptionKind, RequestOption, RequestOptions};
/// use std::any::Any;
///
/// #[derive(Debug)]
/// struct TraceId(String);
///
/// impl TraceId {
///     const KIND: OptionKind = OptionKind::new("trace-id");
/// }
///
/// impl RequestOption for TraceId {
///     fn kind(&self) -> OptionKind {
///         Self::KIND
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let mut options = RequestOptions::new();
/// options.add([Box::new(TraceId("a".into())) as Box<dyn RequestOption>]);
/// options.add([Box::new(TraceId("b".into())) as Box<dyn RequestOption>]);
///
/// assert_eq!(options.len(), 1);
/// assert_eq!(options.get::<TraceId>(TraceId::KIND).unwrap().0, "b");
/// ```
pub trait RequestOption: Any + fmt::Debug + Send + Sync {
    /// The kind this option is stored under.
    fn kind(&self) -> OptionKind;

    /// Returns `self` for downcasting to the concrete option type.
    fn as_any(&self) -> &dyn Any;
}

/// The option store of a request: at most one option per [`OptionKind`].
#[derive(Debug, Default)]
pub struct RequestOptions {
    options: HashMap<OptionKind, Box<dyn RequestOption>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores each option under its kind, replacing any option of the same kind.
    pub fn add(&mut self, options: impl IntoIterator<Item = Box<dyn RequestOption>>) {
        for option in options {
            self.options.insert(option.kind(), option);
        }
    }

    /// Removes stored options whose kind matches one of the given options.
    ///
    /// Only the kind is compared; the given options' values are ignored.
    pub fn remove(&mut self, options: &[&dyn RequestOption]) {
        for option in options {
            self.options.remove(&option.kind());
        }
    }

    /// Removes and returns the option stored under `kind`.
    pub fn remove_kind(&mut self, kind: OptionKind) -> Option<Box<dyn RequestOption>> {
        self.options.remove(&kind)
    }

    /// Returns the option stored under `kind` if it is a `T`.
    pub fn get<T: RequestOption>(&self, kind: OptionKind) -> Option<&T> {
        self.options.get(&kind)?.as_any().downcast_ref::<T>()
    }

    /// Iterates over the stored options in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn RequestOption> {
        self.options.values().map(|option| option.as_ref())
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Overrides the adapter's timeout for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutOption(pub Duration);

impl TimeoutOption {
    pub const KIND: OptionKind = OptionKind::new("reqinfo.timeout");
}

impl RequestOption for TimeoutOption {
    fn kind(&self) -> OptionKind {
        Self::KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Tag(&'static str);

    impl RequestOption for Tag {
        fn kind(&self) -> OptionKind {
            OptionKind::new("test.tag")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_add_empty_is_noop() {
        let mut options = RequestOptions::new();
        options.add(Vec::new());
        options.remove(&[]);
        assert!(options.is_empty());
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut options = RequestOptions::new();
        options.add([
            Box::new(Tag("a")) as Box<dyn RequestOption>,
            Box::new(TimeoutOption(Duration::from_secs(5))),
        ]);

        assert_eq!(options.len(), 2);
        assert_eq!(
            options.get::<TimeoutOption>(TimeoutOption::KIND),
            Some(&TimeoutOption(Duration::from_secs(5)))
        );
        assert_eq!(options.get::<Tag>(OptionKind::new("test.tag")).unwrap().0, "a");
    }

    #[test]
    fn test_get_with_wrong_type_is_none() {
        let mut options = RequestOptions::new();
        options.add([Box::new(Tag("a")) as Box<dyn RequestOption>]);
        assert!(options
            .get::<TimeoutOption>(OptionKind::new("test.tag"))
            .is_none());
    }

    #[test]
    fn test_remove_kind_returns_option() {
        let mut options = RequestOptions::new();
        options.add([Box::new(TimeoutOption(Duration::from_secs(1))) as Box<dyn RequestOption>]);

        let removed = options.remove_kind(TimeoutOption::KIND).unwrap();
        assert_eq!(removed.kind(), TimeoutOption::KIND);
        assert!(options.is_empty());
    }
}
