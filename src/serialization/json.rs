//! JSON serialization writer built on `serde_json`.

use super::{
    normalize_content_type, Parsable, SerializationResult, SerializationWriter,
    SerializationWriterFactory,
};
use bytes::Bytes;
use serde_json::{Map, Number, Value};

const JSON_CONTENT_TYPE: &str = "application/json";

/// An object under construction. Holds either named fields or a single bare
/// value, never both.
#[derive(Default)]
struct Frame {
    fields: Map<String, Value>,
    value: Option<Value>,
}

impl Frame {
    fn into_value(self) -> Value {
        self.value.unwrap_or(Value::Object(self.fields))
    }
}

/// Writes models as a JSON document.
///
/// Values are assembled into a [`serde_json::Value`] tree and encoded when
/// [`get_serialized_content`](SerializationWriter::get_serialized_content) is
/// called.
#[derive(Default)]
pub struct JsonSerializationWriter {
    frames: Vec<Frame>,
    root: Option<Value>,
}

impl JsonSerializationWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value written at the root so far.
    pub fn root(&self) -> Option<&Value> {
        self.root.as_ref()
    }

    fn put(&mut self, key: Option<&str>, value: Value) -> SerializationResult<()> {
        match (self.frames.last_mut(), key) {
            (Some(frame), Some(key)) => {
                if frame.value.is_some() {
                    return Err(format!("cannot write field {} after a bare value", key).into());
                }
                frame.fields.insert(key.to_owned(), value);
            }
            (Some(frame), None) => {
                if !frame.fields.is_empty() || frame.value.is_some() {
                    return Err("cannot write a bare value into an object that already has content".into());
                }
                frame.value = Some(value);
            }
            (None, Some(key)) => match self.root.get_or_insert_with(|| Value::Object(Map::new())) {
                Value::Object(fields) => {
                    fields.insert(key.to_owned(), value);
                }
                _ => return Err(format!("cannot write field {} into a non-object root", key).into()),
            },
            (None, None) => {
                if self.root.is_some() {
                    return Err("the root value has already been written".into());
                }
                self.root = Some(value);
            }
        }
        Ok(())
    }
}

impl SerializationWriter for JsonSerializationWriter {
    fn write_string_value(&mut self, key: Option<&str>, value: &str) -> SerializationResult<()> {
        self.put(key, Value::String(value.to_owned()))
    }

    fn write_bool_value(&mut self, key: Option<&str>, value: bool) -> SerializationResult<()> {
        self.put(key, Value::Bool(value))
    }

    fn write_i64_value(&mut self, key: Option<&str>, value: i64) -> SerializationResult<()> {
        self.put(key, Value::Number(value.into()))
    }

    fn write_f64_value(&mut self, key: Option<&str>, value: f64) -> SerializationResult<()> {
        let number = Number::from_f64(value)
            .ok_or_else(|| format!("{} cannot be represented in JSON", value))?;
        self.put(key, Value::Number(number))
    }

    fn write_null_value(&mut self, key: Option<&str>) -> SerializationResult<()> {
        self.put(key, Value::Null)
    }

    fn write_collection_of_string_values(
        &mut self,
        key: Option<&str>,
        values: &[String],
    ) -> SerializationResult<()> {
        let items = values.iter().cloned().map(Value::String).collect();
        self.put(key, Value::Array(items))
    }

    fn write_object_value(
        &mut self,
        key: Option<&str>,
        value: &dyn Parsable,
    ) -> SerializationResult<()> {
        self.frames.push(Frame::default());
        let written = value.serialize(self);
        let frame = self
            .frames
            .pop()
            .ok_or("object frame was removed while writing")?;
        written?;
        self.put(key, frame.into_value())
    }

    fn write_collection_of_object_values(
        &mut self,
        key: Option<&str>,
        values: &[&dyn Parsable],
    ) -> SerializationResult<()> {
        let mut items = Vec::with_capacity(values.len());
        for value in values {
            let mut item = JsonSerializationWriter::new();
            item.write_object_value(None, *value)?;
            items.push(item.root.unwrap_or(Value::Null));
        }
        self.put(key, Value::Array(items))
    }

    fn get_serialized_content(&mut self) -> SerializationResult<Bytes> {
        if !self.frames.is_empty() {
            return Err("an object is still being written".into());
        }
        let root = self.root.as_ref().unwrap_or(&Value::Null);
        Ok(Bytes::from(serde_json::to_vec(root)?))
    }
}

/// Creates [`JsonSerializationWriter`]s for `application/json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializationWriterFactory;

impl SerializationWriterFactory for JsonSerializationWriterFactory {
    fn valid_content_type(&self) -> &str {
        JSON_CONTENT_TYPE
    }

    fn get_serialization_writer(
        &self,
        content_type: &str,
    ) -> SerializationResult<Box<dyn SerializationWriter>> {
        if content_type.is_empty() {
            return Err("content type cannot be empty".into());
        }
        if normalize_content_type(content_type) != JSON_CONTENT_TYPE {
            return Err(format!("expected a {} content type, got {}", JSON_CONTENT_TYPE, content_type).into());
        }
        Ok(Box::new(JsonSerializationWriter::new()))
    }
}

impl Parsable for Value {
    fn serialize(&self, writer: &mut dyn SerializationWriter) -> SerializationResult<()> {
        match self {
            Value::Object(fields) => {
                for (key, value) in fields {
                    write_json_field(writer, Some(key), value)?;
                }
                Ok(())
            }
            other => write_json_field(writer, None, other),
        }
    }
}

fn write_json_field(
    writer: &mut dyn SerializationWriter,
    key: Option<&str>,
    value: &Value,
) -> SerializationResult<()> {
    match value {
        Value::Null => writer.write_null_value(key),
        Value::Bool(b) => writer.write_bool_value(key, *b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => writer.write_i64_value(key, i),
            (None, Some(f)) => writer.write_f64_value(key, f),
            (None, None) => Err(format!("unsupported number {}", n).into()),
        },
        Value::String(s) => writer.write_string_value(key, s),
        Value::Array(items) => {
            let items: Vec<&dyn Parsable> = items.iter().map(|item| item as &dyn Parsable).collect();
            writer.write_collection_of_object_values(key, &items)
        }
        Value::Object(_) => writer.write_object_value(key, value),
    }
}

/// Adapts any `serde::Serialize` type into a [`Parsable`] model.
///
/// The value is converted to a JSON tree first and then written field by
/// field, so it works with every writer, not only the JSON one.
///
/// # Examples
///
/// ```
/// use reqinfo::serialization::{JsonSerializationWriter, SerdeModel, SerializationWriter};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Tag {
///     label: String,
/// }
///
/// let mut writer = JsonSerializationWriter::new();
/// let tag = SerdeModel(Tag { label: "red".into() });
/// writer.write_object_value(None, &tag).unwrap();
/// assert_eq!(&writer.get_serialized_content().unwrap()[..], br#"{"label":"red"}"#);
/// ```
#[derive(Debug, Clone)]
pub struct SerdeModel<T>(pub T);

impl<T: serde::Serialize> Parsable for SerdeModel<T> {
    fn serialize(&self, writer: &mut dyn SerializationWriter) -> SerializationResult<()> {
        let value = serde_json::to_value(&self.0)?;
        Parsable::serialize(&value, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Failing;

    impl Parsable for Failing {
        fn serialize(&self, _writer: &mut dyn SerializationWriter) -> SerializationResult<()> {
            Err("model refused to serialize".into())
        }
    }

    fn write_root(value: &dyn Parsable) -> Value {
        let mut writer = JsonSerializationWriter::new();
        writer.write_object_value(None, value).unwrap();
        let bytes = writer.get_serialized_content().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_nested_objects_and_arrays() {
        let model = json!({
            "name": "widget",
            "price": 9.5,
            "count": 3,
            "active": true,
            "owner": { "id": 7, "tags": ["a", "b"] },
            "parts": [{ "id": 1 }, { "id": 2 }],
            "note": null
        });
        assert_eq!(write_root(&model), model);
    }

    #[test]
    fn test_primitive_root() {
        assert_eq!(write_root(&json!("plain")), json!("plain"));
        assert_eq!(write_root(&json!([1, "two", null])), json!([1, "two", null]));
    }

    #[test]
    fn test_collection_of_objects() {
        let first = json!({ "id": 1 });
        let second = json!({ "id": 2 });
        let mut writer = JsonSerializationWriter::new();
        writer
            .write_collection_of_object_values(None, &[&first, &second])
            .unwrap();
        assert_eq!(writer.root(), Some(&json!([{ "id": 1 }, { "id": 2 }])));
    }

    #[test]
    fn test_keyed_values_at_top_level_build_an_object() {
        let mut writer = JsonSerializationWriter::new();
        writer.write_string_value(Some("a"), "x").unwrap();
        writer
            .write_collection_of_string_values(Some("b"), &["y".to_string()])
            .unwrap();
        assert_eq!(writer.root(), Some(&json!({ "a": "x", "b": ["y"] })));
    }

    /// Writes a named field and a bare value in the given order.
    struct Mixed {
        field_first: bool,
    }

    impl Parsable for Mixed {
        fn serialize(&self, writer: &mut dyn SerializationWriter) -> SerializationResult<()> {
            if self.field_first {
                writer.write_string_value(Some("name"), "rex")?;
                writer.write_i64_value(None, 3)
            } else {
                writer.write_i64_value(None, 3)?;
                writer.write_string_value(Some("name"), "rex")
            }
        }
    }

    #[test]
    fn test_bare_value_and_fields_cannot_mix() {
        for field_first in [true, false] {
            let mut writer = JsonSerializationWriter::new();
            assert!(writer
                .write_object_value(None, &Mixed { field_first })
                .is_err());
            assert_eq!(writer.root(), None);
        }
    }

    #[test]
    fn test_root_is_written_once() {
        let mut writer = JsonSerializationWriter::new();
        writer.write_string_value(Some("a"), "x").unwrap();
        assert!(writer.write_i64_value(None, 1).is_err());
        assert_eq!(writer.root(), Some(&json!({ "a": "x" })));
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        let mut writer = JsonSerializationWriter::new();
        assert!(writer.write_f64_value(Some("x"), f64::NAN).is_err());
    }

    #[test]
    fn test_model_error_propagates_and_unwinds_frame() {
        let mut writer = JsonSerializationWriter::new();
        assert!(writer.write_object_value(None, &Failing).is_err());
        assert!(writer.get_serialized_content().is_ok());
    }

    #[test]
    fn test_factory_checks_content_type() {
        let factory = JsonSerializationWriterFactory;
        assert!(factory.get_serialization_writer("application/json").is_ok());
        assert!(factory
            .get_serialization_writer("application/problem+json; charset=utf-8")
            .is_ok());
        assert!(factory.get_serialization_writer("text/plain").is_err());
        assert!(factory.get_serialization_writer("").is_err());
    }
}
