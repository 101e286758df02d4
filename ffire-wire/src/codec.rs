//! The reference encoder/decoder: a schema-driven interpreter over a
//! `Value` tree that mirrors `TypeRef`.
//!
//! No target-language emitter is authoritative on its own — this module
//! is the ground truth every emitted codec's output is checked against,
//! and the implementation P2 (cross-language equivalence) and P1
//! (round-trip) are tested through directly.

use crate::buffer::{ReadCursor, WriteCursor};
use crate::error::WireError;
use crate::order;
use ffire_schema::{MessageDecl, PrimitiveKind, Schema, StructDef, TypeDef, TypeRef};

/// A dynamically-typed value, shaped like the `TypeRef` it was encoded
/// (or will be decoded) against.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `bool`.
    Bool(bool),
    /// `i8`.
    I8(i8),
    /// `i16`.
    I16(i16),
    /// `i32`.
    I32(i32),
    /// `i64`.
    I64(i64),
    /// `f32`.
    F32(f32),
    /// `f64`.
    F64(f64),
    /// `string`.
    Str(String),
    /// An array of homogeneously-typed elements.
    Array(Vec<Value>),
    /// A struct instance: field name to value, in any order — lookup is
    /// by name, not position.
    Struct(Vec<(String, Value)>),
    /// An optional value: `None` encodes a single absent presence byte.
    Optional(Option<Box<Value>>),
}

impl Value {
    fn get_field<'a>(fields: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
        fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Encodes `value` against `ty`, appending bytes to `out`.
///
/// `value` must have been constructed to match the shape of `ty` (as a
/// decoder or a schema-driven fixture builder would produce) — this is a
/// caller contract, not a wire-format failure mode, so a shape mismatch
/// panics rather than returning a [`WireError`].
///
/// # Errors
/// Returns [`WireError::TooLarge`] if a string or array length exceeds
/// the uint16 cap.
///
/// # Panics
/// Panics if `value`'s shape doesn't match `ty`.
pub fn encode_value(
    schema: &Schema,
    ty: &TypeRef,
    value: &Value,
    out: &mut WriteCursor,
) -> Result<(), WireError> {
    match (ty, value) {
        (TypeRef::Primitive { kind, optional: false }, _) => encode_primitive(*kind, value, out),
        (TypeRef::Primitive { kind, optional: true }, Value::Optional(inner)) => {
            encode_optional(inner.as_deref(), out, |v, out| encode_primitive(*kind, v, out))
        }
        (TypeRef::Array { element, optional: false }, Value::Array(items)) => {
            encode_array(schema, element, items, out)
        }
        (TypeRef::Array { element, optional: true }, Value::Optional(inner)) => {
            encode_optional(inner.as_deref(), out, |v, out| {
                let Value::Array(items) = v else {
                    panic!("Value shape does not match array TypeRef");
                };
                encode_array(schema, element, items, out)
            })
        }
        (TypeRef::StructRef { name, optional: false }, Value::Struct(fields)) => {
            encode_struct(schema, name, fields, out)
        }
        (TypeRef::StructRef { name, optional: true }, Value::Optional(inner)) => {
            encode_optional(inner.as_deref(), out, |v, out| {
                let Value::Struct(fields) = v else {
                    panic!("Value shape does not match struct TypeRef");
                };
                encode_struct(schema, name, fields, out)
            })
        }
        _ => panic!("Value shape does not match TypeRef {ty:?}"),
    }
}

fn encode_optional(
    inner: Option<&Value>,
    out: &mut WriteCursor,
    encode_present: impl FnOnce(&Value, &mut WriteCursor) -> Result<(), WireError>,
) -> Result<(), WireError> {
    match inner {
        None => {
            out.write_bool(false);
            Ok(())
        }
        Some(v) => {
            out.write_bool(true);
            encode_present(v, out)
        }
    }
}

fn encode_primitive(kind: PrimitiveKind, value: &Value, out: &mut WriteCursor) -> Result<(), WireError> {
    match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(b)) => out.write_bool(*b),
        (PrimitiveKind::I8, Value::I8(v)) => out.write_i8(*v),
        (PrimitiveKind::I16, Value::I16(v)) => out.write_i16(*v),
        (PrimitiveKind::I32, Value::I32(v)) => out.write_i32(*v),
        (PrimitiveKind::I64, Value::I64(v)) => out.write_i64(*v),
        (PrimitiveKind::F32, Value::F32(v)) => out.write_f32(*v),
        (PrimitiveKind::F64, Value::F64(v)) => out.write_f64(*v),
        (PrimitiveKind::String, Value::Str(s)) => return out.write_string(s),
        _ => panic!("Value shape does not match primitive kind {kind:?}"),
    }
    Ok(())
}

fn encode_array(
    schema: &Schema,
    element: &TypeRef,
    items: &[Value],
    out: &mut WriteCursor,
) -> Result<(), WireError> {
    out.write_len_prefix(items.len())?;
    for item in items {
        encode_value(schema, element, item, out)?;
    }
    Ok(())
}

fn encode_struct(
    schema: &Schema,
    struct_name: &str,
    fields: &[(String, Value)],
    out: &mut WriteCursor,
) -> Result<(), WireError> {
    let def = struct_def(schema, struct_name);
    for field in order::reorder_fields(&def.fields) {
        let value = Value::get_field(fields, &field.name).expect("field present in schema-shaped value");
        encode_value(schema, &field.ty, value, out)?;
    }
    Ok(())
}

fn struct_def<'a>(schema: &'a Schema, name: &str) -> &'a StructDef {
    let TypeDef::Struct(def) = schema.get_type(name).expect("struct exists in validated schema");
    def
}

/// Decodes a value of shape `ty` from `cur`, leniently (trailing bytes
/// after a top-level decode are the caller's concern — see
/// [`decode_message`] vs [`decode_message_strict`]).
///
/// # Errors
/// Returns [`WireError::Truncated`], [`WireError::InvalidUtf8`],
/// [`WireError::InvalidBool`], or [`WireError::InvalidPresence`] on
/// malformed input. Never panics.
pub fn decode_value(schema: &Schema, ty: &TypeRef, cur: &mut ReadCursor<'_>) -> Result<Value, WireError> {
    match ty {
        TypeRef::Primitive { kind, optional: false } => decode_primitive(*kind, cur),
        TypeRef::Primitive { kind, optional: true } => {
            decode_optional(cur, |cur| decode_primitive(*kind, cur))
        }
        TypeRef::Array { element, optional: false } => decode_array(schema, element, cur),
        TypeRef::Array { element, optional: true } => {
            decode_optional(cur, |cur| decode_array(schema, element, cur))
        }
        TypeRef::StructRef { name, optional: false } => decode_struct(schema, name, cur),
        TypeRef::StructRef { name, optional: true } => {
            decode_optional(cur, |cur| decode_struct(schema, name, cur))
        }
    }
}

fn decode_optional(
    cur: &mut ReadCursor<'_>,
    decode_present: impl FnOnce(&mut ReadCursor<'_>) -> Result<Value, WireError>,
) -> Result<Value, WireError> {
    let present = cur.read_bool().map_err(|e| match e {
        WireError::InvalidBool { byte } => WireError::InvalidPresence { byte },
        other => other,
    })?;
    if present {
        Ok(Value::Optional(Some(Box::new(decode_present(cur)?))))
    } else {
        Ok(Value::Optional(None))
    }
}

fn decode_primitive(kind: PrimitiveKind, cur: &mut ReadCursor<'_>) -> Result<Value, WireError> {
    Ok(match kind {
        PrimitiveKind::Bool => Value::Bool(cur.read_bool()?),
        PrimitiveKind::I8 => Value::I8(cur.read_i8()?),
        PrimitiveKind::I16 => Value::I16(cur.read_i16()?),
        PrimitiveKind::I32 => Value::I32(cur.read_i32()?),
        PrimitiveKind::I64 => Value::I64(cur.read_i64()?),
        PrimitiveKind::F32 => Value::F32(cur.read_f32()?),
        PrimitiveKind::F64 => Value::F64(cur.read_f64()?),
        PrimitiveKind::String => Value::Str(cur.read_string()?),
    })
}

fn decode_array(schema: &Schema, element: &TypeRef, cur: &mut ReadCursor<'_>) -> Result<Value, WireError> {
    let count = cur.read_len_prefix()? as usize;
    let mut items = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        items.push(decode_value(schema, element, cur)?);
    }
    Ok(Value::Array(items))
}

fn decode_struct(schema: &Schema, struct_name: &str, cur: &mut ReadCursor<'_>) -> Result<Value, WireError> {
    let def = struct_def(schema, struct_name);
    let mut fields = Vec::with_capacity(def.fields.len());
    for field in order::reorder_fields(&def.fields) {
        let value = decode_value(schema, &field.ty, cur)?;
        fields.push((field.name.clone(), value));
    }
    Ok(Value::Struct(fields))
}

/// Encodes a full message: the message's target type, with no envelope.
///
/// # Errors
/// See [`encode_value`].
pub fn encode_message(schema: &Schema, message: &MessageDecl, value: &Value) -> Result<Vec<u8>, WireError> {
    let mut out = WriteCursor::new();
    encode_value(schema, &message.target, value, &mut out)?;
    Ok(out.into_bytes())
}

/// Decodes a full message leniently: trailing bytes after the root value
/// are ignored. This is the default to match existing deployed codecs.
///
/// # Errors
/// See [`decode_value`].
pub fn decode_message(schema: &Schema, message: &MessageDecl, bytes: &[u8]) -> Result<Value, WireError> {
    let mut cur = ReadCursor::new(bytes);
    decode_value(schema, &message.target, &mut cur)
}

/// Decodes a full message strictly: returns [`WireError::TrailingBytes`]
/// if any bytes remain after the root value.
///
/// # Errors
/// See [`decode_value`]; additionally [`WireError::TrailingBytes`].
pub fn decode_message_strict(
    schema: &Schema,
    message: &MessageDecl,
    bytes: &[u8],
) -> Result<Value, WireError> {
    let mut cur = ReadCursor::new(bytes);
    let value = decode_value(schema, &message.target, &mut cur)?;
    cur.expect_exhausted()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffire_schema::{Field, Schema, StructDef, TypeDef};

    fn device_schema() -> (Schema, MessageDecl) {
        let mut schema = Schema::new("test");
        let mut device = StructDef::new("Device");
        device.add_field(Field::new("Name", TypeRef::primitive(PrimitiveKind::String)));
        device.add_field(Field::new("Channels", TypeRef::primitive(PrimitiveKind::I32)));
        schema.add_type(TypeDef::Struct(device));
        let message = MessageDecl::new(
            "DeviceList",
            TypeRef::array(TypeRef::struct_ref("Device")),
        );
        (schema, message)
    }

    #[test]
    fn test_s3_device_list_matches_seed_bytes() {
        let (schema, message) = device_schema();
        let value = Value::Array(vec![Value::Struct(vec![
            ("Name".to_string(), Value::Str("Speaker".to_string())),
            ("Channels".to_string(), Value::I32(2)),
        ])]);
        let bytes = encode_message(&schema, &message, &value).unwrap();
        let expected: Vec<u8> = vec![
            0x01, 0x00, // array length = 1
            0x07, 0x00, // string length = 7
            b'S', b'p', b'e', b'a', b'k', b'e', b'r',
            0x02, 0x00, 0x00, 0x00, // Channels = 2 i32 LE
        ];
        assert_eq!(bytes, expected);
        assert_eq!(bytes.len(), 14);

        let decoded = decode_message(&schema, &message, &bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_count_message_i32() {
        let mut schema = Schema::new("test");
        let message = MessageDecl::new("Count", TypeRef::primitive(PrimitiveKind::I32));
        schema.add_message(message.clone());
        let bytes = encode_message(&schema, &message, &Value::I32(42)).unwrap();
        assert_eq!(bytes, vec![42, 0, 0, 0]);
        assert_eq!(decode_message(&schema, &message, &bytes).unwrap(), Value::I32(42));
    }

    #[test]
    fn test_optional_field_round_trip() {
        let mut schema = Schema::new("test");
        let mut r = StructDef::new("R");
        r.add_field(Field::new("Req", TypeRef::primitive(PrimitiveKind::I32)));
        r.add_field(Field::new("Opt", TypeRef::optional_primitive(PrimitiveKind::String)));
        schema.add_type(TypeDef::Struct(r));
        let message = MessageDecl::new("M", TypeRef::struct_ref("R"));

        let present = Value::Struct(vec![
            ("Req".to_string(), Value::I32(7)),
            ("Opt".to_string(), Value::Optional(Some(Box::new(Value::Str("x".into()))))),
        ]);
        let bytes = encode_message(&schema, &message, &present).unwrap();
        assert_eq!(decode_message(&schema, &message, &bytes).unwrap(), present);

        let absent = Value::Struct(vec![
            ("Req".to_string(), Value::I32(7)),
            ("Opt".to_string(), Value::Optional(None)),
        ]);
        let bytes = encode_message(&schema, &message, &absent).unwrap();
        assert_eq!(bytes.len(), 4 + 1);
        assert_eq!(decode_message(&schema, &message, &bytes).unwrap(), absent);
    }

    #[test]
    fn test_strict_decode_rejects_trailing_bytes() {
        let mut schema = Schema::new("test");
        let message = MessageDecl::new("Count", TypeRef::primitive(PrimitiveKind::I32));
        schema.add_message(message.clone());
        let mut bytes = encode_message(&schema, &message, &Value::I32(1)).unwrap();
        bytes.push(0xFF);
        assert!(decode_message(&schema, &message, &bytes).is_ok());
        assert!(matches!(
            decode_message_strict(&schema, &message, &bytes),
            Err(WireError::TrailingBytes { remaining: 1 })
        ));
    }

    #[test]
    fn test_decode_truncated_array_length_prefix() {
        let (schema, message) = device_schema();
        let bytes = [0x05, 0x00]; // claims 5 elements, no data follows
        assert!(matches!(
            decode_message(&schema, &message, &bytes),
            Err(WireError::Truncated { .. })
        ));
    }

    #[test]
    fn test_size_too_large_string() {
        let mut schema = Schema::new("test");
        let message = MessageDecl::new("S", TypeRef::primitive(PrimitiveKind::String));
        schema.add_message(message.clone());
        let huge = "x".repeat(usize::from(u16::MAX) + 1);
        let result = encode_message(&schema, &message, &Value::Str(huge));
        assert!(matches!(result, Err(WireError::TooLarge { .. })));
    }
}
