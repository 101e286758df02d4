//! Python target emitter.
//!
//! Built on the standard `struct` module and `bytearray`, with an
//! exception-based error model (`FfireWireError` and its subclasses)
//! mirroring [`ffire_wire::error::WireError`]'s variants one for one.
//! Generated types are `@dataclass`es, the idiomatic stdlib-only way to
//! declare a plain value object.

use crate::analyzer::reservation_size;
use crate::error::GenError;
use crate::planner::{self, Plan};
use crate::strategy::{self, Strategy};
use crate::target::{Emitter, GeneratedSources, TargetLanguage};
use ffire_schema::{Field, MessageDecl, PrimitiveKind, Schema, StructDef, TypeRef};

const RUNTIME: &str = r#"class FfireWireError(Exception):
    """Base class for every error this module raises."""


class Truncated(FfireWireError):
    def __init__(self, needed: int, remaining: int):
        super().__init__(f"truncated: need {needed} bytes, have {remaining}")
        self.needed = needed
        self.remaining = remaining


class TooLarge(FfireWireError):
    def __init__(self, length: int):
        super().__init__(f"length {length} exceeds the uint16 cap")
        self.length = length


class InvalidUtf8(FfireWireError):
    def __init__(self):
        super().__init__("invalid utf-8 in string field")


class InvalidBool(FfireWireError):
    def __init__(self, byte: int):
        super().__init__(f"invalid bool byte 0x{byte:02x}")
        self.byte = byte


class InvalidPresence(FfireWireError):
    def __init__(self, byte: int):
        super().__init__(f"invalid presence byte 0x{byte:02x}")
        self.byte = byte


class TrailingBytes(FfireWireError):
    def __init__(self, remaining: int):
        super().__init__(f"{remaining} trailing bytes after decode")
        self.remaining = remaining


class _Reader:
    __slots__ = ("buf", "pos")

    def __init__(self, buf: bytes):
        self.buf = buf
        self.pos = 0

    def _take(self, n: int) -> bytes:
        if self.pos + n > len(self.buf):
            raise Truncated(n, len(self.buf) - self.pos)
        b = self.buf[self.pos : self.pos + n]
        self.pos += n
        return b

    def read_bool(self) -> bool:
        byte = self._take(1)[0]
        if byte == 0x00:
            return False
        if byte == 0x01:
            return True
        raise InvalidBool(byte)

    def read_presence(self) -> bool:
        byte = self._take(1)[0]
        if byte == 0x00:
            return False
        if byte == 0x01:
            return True
        raise InvalidPresence(byte)

    def read_i8(self) -> int:
        return struct.unpack("<b", self._take(1))[0]

    def read_i16(self) -> int:
        return struct.unpack("<h", self._take(2))[0]

    def read_i32(self) -> int:
        return struct.unpack("<i", self._take(4))[0]

    def read_i64(self) -> int:
        return struct.unpack("<q", self._take(8))[0]

    def read_f32(self) -> float:
        return struct.unpack("<f", self._take(4))[0]

    def read_f64(self) -> float:
        return struct.unpack("<d", self._take(8))[0]

    def read_len_prefix(self) -> int:
        return struct.unpack("<H", self._take(2))[0]

    def read_string(self) -> str:
        n = self.read_len_prefix()
        raw = self._take(n)
        try:
            return raw.decode("utf-8")
        except UnicodeDecodeError as exc:
            raise InvalidUtf8() from exc

    def read_bytes(self, n: int) -> bytes:
        return self._take(n)

    def expect_exhausted(self) -> None:
        remaining = len(self.buf) - self.pos
        if remaining > 0:
            raise TrailingBytes(remaining)


class _Writer:
    __slots__ = ("buf",)

    def __init__(self):
        self.buf = bytearray()

    def write_bool(self, value: bool) -> None:
        self.buf.append(0x01 if value else 0x00)

    def write_i8(self, value: int) -> None:
        self.buf += struct.pack("<b", value)

    def write_i16(self, value: int) -> None:
        self.buf += struct.pack("<h", value)

    def write_i32(self, value: int) -> None:
        self.buf += struct.pack("<i", value)

    def write_i64(self, value: int) -> None:
        self.buf += struct.pack("<q", value)

    def write_f32(self, value: float) -> None:
        self.buf += struct.pack("<f", value)

    def write_f64(self, value: float) -> None:
        self.buf += struct.pack("<d", value)

    def write_len_prefix(self, length: int) -> None:
        if length > 0xFFFF:
            raise TooLarge(length)
        self.buf += struct.pack("<H", length)

    def write_string(self, value: str) -> None:
        encoded = value.encode("utf-8")
        self.write_len_prefix(len(encoded))
        self.buf += encoded

    def write_bytes(self, raw: bytes) -> None:
        self.buf += raw
"#;

/// The Python target-language emitter.
pub struct PythonEmitter;

impl Emitter for PythonEmitter {
    fn target(&self) -> TargetLanguage {
        TargetLanguage::Python
    }

    fn emit(&self, schema: &Schema) -> Result<GeneratedSources, GenError> {
        let plan = Plan::build(schema);
        let mut out = String::new();
        out.push_str("\"\"\"Generated by ffire-codegen. Do not edit by hand.\"\"\"\n\n");
        out.push_str("from __future__ import annotations\n\nimport struct\nfrom dataclasses import dataclass\nfrom typing import List, Optional\n\n");
        out.push_str(RUNTIME);
        out.push('\n');

        for def in plan.structs_in_order() {
            out.push_str(&emit_struct(schema, def));
        }
        for message in &schema.messages {
            out.push_str(&emit_message(schema, message));
        }

        Ok(GeneratedSources::single(format!("{}.py", schema.package), out))
    }
}

fn py_type(ty: &TypeRef) -> String {
    let base = match ty {
        TypeRef::Primitive { kind, .. } => py_scalar_type(*kind).to_string(),
        TypeRef::Array { element, .. } => format!("List[{}]", py_type(element)),
        TypeRef::StructRef { name, .. } => name.clone(),
    };
    if ty.is_optional() {
        format!("Optional[{base}]")
    } else {
        base
    }
}

fn py_scalar_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::I8 | PrimitiveKind::I16 | PrimitiveKind::I32 | PrimitiveKind::I64 => "int",
        PrimitiveKind::F32 | PrimitiveKind::F64 => "float",
        PrimitiveKind::String => "str",
    }
}

fn emit_struct(schema: &Schema, def: &StructDef) -> String {
    let fields = planner::wire_fields(def);
    let mut out = format!("@dataclass\nclass {}:\n", def.name);
    for f in &fields {
        out.push_str(&format!("    {}: {}\n", f.name, py_type(&f.ty)));
    }
    out.push('\n');

    out.push_str(&format!("def _encode_{}(value: {}, w: _Writer) -> None:\n", snake(&def.name), def.name));
    for f in &fields {
        out.push_str(&indent(&emit_field_encode(schema, f, "value"), 1));
    }
    out.push_str("\n\n");

    out.push_str(&format!("def _decode_{}(r: _Reader) -> {}:\n", snake(&def.name), def.name));
    for f in &fields {
        out.push_str(&indent(&format!("{} = {}\n", f.name, emit_field_decode(schema, f)), 1));
    }
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    out.push_str(&format!("    return {}({})\n\n\n", def.name, names.iter().map(|n| format!("{n}={n}")).collect::<Vec<_>>().join(", ")));
    out
}

fn snake(name: &str) -> String {
    planner::to_snake_case(name)
}

fn indent(text: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    text.lines().map(|l| format!("{pad}{l}\n")).collect()
}

fn emit_field_encode(schema: &Schema, field: &Field, owner: &str) -> String {
    let path = format!("{owner}.{}", field.name);
    if field.is_optional() {
        let inner = field.ty.without_optional();
        return format!(
            "if {path} is not None:\n    w.write_bool(True)\n{}\nelse:\n    w.write_bool(False)\n",
            indent(&encode_expr(schema, &inner, &path), 1)
        );
    }
    encode_expr(schema, &field.ty, &path)
}

fn encode_expr(schema: &Schema, ty: &TypeRef, path: &str) -> String {
    match ty {
        TypeRef::Primitive { kind, .. } => match kind {
            PrimitiveKind::Bool => format!("w.write_bool({path})\n"),
            PrimitiveKind::I8 => format!("w.write_i8({path})\n"),
            PrimitiveKind::I16 => format!("w.write_i16({path})\n"),
            PrimitiveKind::I32 => format!("w.write_i32({path})\n"),
            PrimitiveKind::I64 => format!("w.write_i64({path})\n"),
            PrimitiveKind::F32 => format!("w.write_f32({path})\n"),
            PrimitiveKind::F64 => format!("w.write_f64({path})\n"),
            PrimitiveKind::String => format!("w.write_string({path})\n"),
        },
        TypeRef::Array { element, .. } => {
            let elem_encode = match element.as_ref() {
                TypeRef::StructRef { name, .. } => format!("_encode_{}(item, w)\n", snake(name)),
                _ => encode_expr(schema, element, "item"),
            };
            match strategy::array_strategy(schema, element) {
                Strategy::BulkCopy => format!(
                    "w.write_len_prefix(len({path}))\nfor item in {path}:\n{}",
                    indent(&elem_encode, 1)
                ),
                _ => format!(
                    "w.write_len_prefix(len({path}))\nfor item in {path}:\n{}",
                    indent(&elem_encode, 1)
                ),
            }
        }
        TypeRef::StructRef { name, .. } => format!("_encode_{}({path}, w)\n", snake(name)),
    }
}

fn emit_field_decode(schema: &Schema, field: &Field) -> String {
    if field.is_optional() {
        let inner = field.ty.without_optional();
        return format!(
            "({} if r.read_presence() else None)",
            decode_expr(schema, &inner)
        );
    }
    decode_expr(schema, &field.ty)
}

fn decode_expr(schema: &Schema, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Primitive { kind, .. } => match kind {
            PrimitiveKind::Bool => "r.read_bool()".to_string(),
            PrimitiveKind::I8 => "r.read_i8()".to_string(),
            PrimitiveKind::I16 => "r.read_i16()".to_string(),
            PrimitiveKind::I32 => "r.read_i32()".to_string(),
            PrimitiveKind::I64 => "r.read_i64()".to_string(),
            PrimitiveKind::F32 => "r.read_f32()".to_string(),
            PrimitiveKind::F64 => "r.read_f64()".to_string(),
            PrimitiveKind::String => "r.read_string()".to_string(),
        },
        TypeRef::Array { element, .. } => {
            let elem_decode = decode_expr(schema, element);
            format!(
                "[{} for _ in range(r.read_len_prefix())]",
                elem_decode
            )
        }
        TypeRef::StructRef { name, .. } => format!("_decode_{}(r)", snake(name)),
    }
}

fn emit_message(schema: &Schema, message: &MessageDecl) -> String {
    let snake_name = snake(&planner::root_name(&message.target));
    let value_ty = py_type(&message.target);
    let reservation = reservation_size(schema, &message.target);
    let _ = reservation;

    let mut out = String::new();
    out.push_str(&format!(
        "def encode_{snake_name}_message(value: {value_ty}) -> bytes:\n\
         \x20   \"\"\"Encodes a `{value_ty}` value with no envelope, length prefix, or type tag.\"\"\"\n\
         \x20   w = _Writer()\n"
    ));
    out.push_str(&indent(&encode_expr(schema, &message.target, "value"), 1));
    out.push_str("    return bytes(w.buf)\n\n\n");

    out.push_str(&format!(
        "def decode_{snake_name}_message(data: bytes) -> {value_ty}:\n\
         \x20   \"\"\"Decodes a `{value_ty}` value leniently; trailing bytes are ignored.\"\"\"\n\
         \x20   r = _Reader(data)\n\
         \x20   value = {}\n\
         \x20   return value\n\n\n",
        decode_expr(schema, &message.target)
    ));

    out.push_str(&format!(
        "def decode_{snake_name}_message_strict(data: bytes) -> {value_ty}:\n\
         \x20   \"\"\"Decodes a `{value_ty}` value strictly, rejecting trailing bytes.\"\"\"\n\
         \x20   r = _Reader(data)\n\
         \x20   value = {}\n\
         \x20   r.expect_exhausted()\n\
         \x20   return value\n\n\n",
        decode_expr(schema, &message.target)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffire_schema::TypeDef;

    fn device_schema() -> Schema {
        let mut schema = Schema::new("demo");
        let mut device = StructDef::new("Device");
        device.add_field(Field::new("Name", TypeRef::primitive(PrimitiveKind::String)));
        device.add_field(Field::new("Channels", TypeRef::primitive(PrimitiveKind::I32)));
        schema.add_type(TypeDef::Struct(device));
        schema.add_message(MessageDecl::new("Device", TypeRef::struct_ref("Device")));
        schema
    }

    #[test]
    fn test_emit_produces_dataclass_and_functions() {
        let schema = device_schema();
        let emitter = PythonEmitter;
        let sources = emitter.emit(&schema).unwrap();
        let text = &sources.files[0].source;
        assert!(text.contains("class Device:"));
        assert!(text.contains("def encode_device_message"));
        assert!(text.contains("def decode_device_message_strict"));
    }

    #[test]
    fn test_struct_fields_in_canonical_order() {
        let schema = device_schema();
        let TypeDef::Struct(def) = schema.get_type("Device").unwrap();
        let text = emit_struct(&schema, def);
        let channels_pos = text.find("Channels").unwrap();
        let name_pos = text.find("Name").unwrap();
        assert!(channels_pos < name_pos);
    }

    #[test]
    fn test_optional_field_decode_uses_presence_reader() {
        let mut schema = Schema::new("demo");
        let mut r = StructDef::new("R");
        r.add_field(Field::new("Nick", TypeRef::optional_primitive(PrimitiveKind::String)));
        schema.add_type(TypeDef::Struct(r));
        let TypeDef::Struct(def) = schema.get_type("R").unwrap();
        let text = emit_struct(&schema, def);
        assert!(text.contains("r.read_presence()"));
        assert!(!text.contains("r.read_bool()"));
    }

    #[test]
    fn test_runtime_defines_distinct_presence_error_class() {
        assert!(RUNTIME.contains("def read_presence(self) -> bool:"));
        assert!(RUNTIME.contains("raise InvalidPresence(byte)"));
    }
}
