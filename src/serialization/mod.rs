//! Pluggable body serialization.
//!
//! A [`SerializationWriterFactory`] hands out a [`SerializationWriter`] for a
//! content type. Models implement [`Parsable`] to describe themselves to any
//! writer. Writers release whatever they hold (buffers, handles) when dropped,
//! so a writer that goes out of scope is always released, including on the
//! error path.

mod json;
mod registry;

pub use json::{JsonSerializationWriter, JsonSerializationWriterFactory, SerdeModel};
pub use registry::SerializationWriterFactoryRegistry;

use crate::error::BoxError;
use bytes::Bytes;

/// The result type of writer and model operations.
pub type SerializationResult<T> = std::result::Result<T, BoxError>;

/// A model that can write itself to a [`SerializationWriter`].
///
/// # Examples
///
/// ```
/// use reqinfo::serialization::{
///     JsonSerializationWriter, Parsable, SerializationResult, SerializationWriter,
/// };
///
/// struct Pet {
///     name: String,
///     age: i64,
/// }
///
/// impl Parsable for Pet {
///     fn serialize(&self, writer: &mut dyn SerializationWriter) -> SerializationResult<()> {
///         writer.write_string_value(Some("name"), &self.name)?;
///         writer.write_i64_value(Some("age"), self.age)
///     }
/// }
///
/// let mut writer = JsonSerializationWriter::new();
/// writer.write_object_value(None, &Pet { name: "Rex".into(), age: 3 }).unwrap();
/// let bytes = writer.get_serialized_content().unwrap();
/// assert_eq!(&bytes[..], br#"{"age":3,"name":"Rex"}"#);
/// ```
pub trait Parsable {
    /// Writes the model's fields to `writer`.
    fn serialize(&self, writer: &mut dyn SerializationWriter) -> SerializationResult<()>;
}

/// Encodes values into bytes for one content type.
///
/// A `None` key writes the value being built at the current level (the root
/// value, or the value of the object currently being written) instead of a
/// named field.
pub trait SerializationWriter {
    fn write_string_value(&mut self, key: Option<&str>, value: &str) -> SerializationResult<()>;

    fn write_bool_value(&mut self, key: Option<&str>, value: bool) -> SerializationResult<()>;

    fn write_i64_value(&mut self, key: Option<&str>, value: i64) -> SerializationResult<()>;

    fn write_f64_value(&mut self, key: Option<&str>, value: f64) -> SerializationResult<()>;

    fn write_null_value(&mut self, key: Option<&str>) -> SerializationResult<()>;

    fn write_collection_of_string_values(
        &mut self,
        key: Option<&str>,
        values: &[String],
    ) -> SerializationResult<()>;

    /// Writes a nested model.
    fn write_object_value(
        &mut self,
        key: Option<&str>,
        value: &dyn Parsable,
    ) -> SerializationResult<()>;

    /// Writes a sequence of models.
    fn write_collection_of_object_values(
        &mut self,
        key: Option<&str>,
        values: &[&dyn Parsable],
    ) -> SerializationResult<()>;

    /// Returns everything written so far as bytes.
    fn get_serialized_content(&mut self) -> SerializationResult<Bytes>;
}

/// Produces serialization writers for a content type.
pub trait SerializationWriterFactory: Send + Sync {
    /// The content type this factory writes.
    fn valid_content_type(&self) -> &str;

    /// Returns a new writer for `content_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is empty or not supported.
    fn get_serialization_writer(
        &self,
        content_type: &str,
    ) -> SerializationResult<Box<dyn SerializationWriter>>;
}

/// Reduces a content type to its base `type/subtype` form.
///
/// Parameters are dropped, the result is lowercase, and a vendor-specific
/// subtype keeps only its structured suffix, so
/// `application/vnd.github+json; charset=utf-8` becomes `application/json`.
pub fn normalize_content_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if let Some((kind, subtype)) = essence.split_once('/') {
        let subtype = subtype.rsplit_once('+').map_or(subtype, |(_, suffix)| suffix);
        return format!("{}/{}", kind, subtype);
    }
    essence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_content_type() {
        assert_eq!(normalize_content_type("application/json"), "application/json");
        assert_eq!(
            normalize_content_type("Application/JSON; charset=utf-8"),
            "application/json"
        );
        assert_eq!(
            normalize_content_type("application/vnd.github.v3+json"),
            "application/json"
        );
        assert_eq!(normalize_content_type("text/plain"), "text/plain");
    }
}
