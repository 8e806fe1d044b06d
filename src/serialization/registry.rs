//! A serialization writer factory that dispatches on content type.

use super::{
    normalize_content_type, JsonSerializationWriterFactory, SerializationResult,
    SerializationWriter, SerializationWriterFactory,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Routes writer requests to the factory registered for the content type.
///
/// Lookups use the normalized content type, so `application/json`,
/// `application/json; charset=utf-8` and `application/vnd.acme+json` all reach
/// the JSON factory.
///
/// # Examples
///
/// ```
/// use reqinfo::serialization::{SerializationWriterFactory, SerializationWriterFactoryRegistry};
///
/// let registry = SerializationWriterFactoryRegistry::with_defaults();
/// assert!(registry.get_serialization_writer("application/vnd.acme+json").is_ok());
/// assert!(registry.get_serialization_writer("text/csv").is_err());
/// ```
#[derive(Clone, Default)]
pub struct SerializationWriterFactoryRegistry {
    factories: HashMap<String, Arc<dyn SerializationWriterFactory>>,
}

impl SerializationWriterFactoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the JSON factory registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JsonSerializationWriterFactory));
        registry
    }

    /// Registers a factory under its valid content type, replacing any factory
    /// already registered for it.
    pub fn register(&mut self, factory: Arc<dyn SerializationWriterFactory>) {
        let content_type = normalize_content_type(factory.valid_content_type());
        tracing::debug!(content_type = %content_type, "Registered serialization writer factory");
        self.factories.insert(content_type, factory);
    }

    pub fn supports(&self, content_type: &str) -> bool {
        self.factories
            .contains_key(&normalize_content_type(content_type))
    }
}

impl SerializationWriterFactory for SerializationWriterFactoryRegistry {
    /// A registry serves several content types, so this is a wildcard.
    fn valid_content_type(&self) -> &str {
        "*/*"
    }

    fn get_serialization_writer(
        &self,
        content_type: &str,
    ) -> SerializationResult<Box<dyn SerializationWriter>> {
        if content_type.is_empty() {
            return Err("content type cannot be empty".into());
        }
        let normalized = normalize_content_type(content_type);
        let factory = self.factories.get(&normalized).ok_or_else(|| {
            format!(
                "no serialization writer factory registered for {}",
                normalized
            )
        })?;
        factory.get_serialization_writer(&normalized)
    }
}

impl fmt::Debug for SerializationWriterFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationWriterFactoryRegistry")
            .field("content_types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    struct PlainTextFactory;

    impl SerializationWriterFactory for PlainTextFactory {
        fn valid_content_type(&self) -> &str {
            "text/plain"
        }

        fn get_serialization_writer(
            &self,
            _content_type: &str,
        ) -> SerializationResult<Box<dyn SerializationWriter>> {
            Err("plain text writer is not available".into())
        }
    }

    #[test]
    fn test_defaults_include_json() {
        let registry = SerializationWriterFactoryRegistry::with_defaults();
        assert!(registry.supports("application/json"));
        assert!(registry.supports("APPLICATION/JSON; charset=utf-8"));
        assert!(!registry.supports("text/plain"));

        let mut writer = registry
            .get_serialization_writer("application/json")
            .unwrap();
        writer.write_bool_value(None, true).unwrap();
        assert_eq!(writer.get_serialized_content().unwrap(), Bytes::from_static(b"true"));
    }

    #[test]
    fn test_dispatches_to_registered_factory() {
        let mut registry = SerializationWriterFactoryRegistry::new();
        registry.register(Arc::new(PlainTextFactory));

        let err = registry
            .get_serialization_writer("text/plain; charset=utf-8")
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "plain text writer is not available");
    }

    #[test]
    fn test_unknown_and_empty_content_types_fail() {
        let registry = SerializationWriterFactoryRegistry::with_defaults();
        assert!(registry.get_serialization_writer("").is_err());
        let err = registry.get_serialization_writer("text/csv").err().unwrap();
        assert!(err.to_string().contains("text/csv"));
    }
}
