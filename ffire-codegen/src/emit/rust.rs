//! Rust target emitter.
//!
//! Generated code depends on `ffire-wire`'s cursor types directly,
//! reading and writing through the bounds-checked
//! [`ffire_wire::buffer::WriteCursor`] / [`ffire_wire::buffer::ReadCursor`]
//! pair rather than a fixed-offset buffer trait.

use crate::analyzer::reservation_size;
use crate::error::GenError;
use crate::planner::{self, Plan};
use crate::strategy::{self, Strategy};
use crate::target::{Emitter, GeneratedSources, TargetLanguage};
use ffire_schema::{MessageDecl, PrimitiveKind, Schema, StructDef, TypeDef, TypeRef};

/// The Rust target-language emitter.
pub struct RustEmitter;

impl Emitter for RustEmitter {
    fn target(&self) -> TargetLanguage {
        TargetLanguage::Rust
    }

    fn emit(&self, schema: &Schema) -> Result<GeneratedSources, GenError> {
        let plan = Plan::build(schema);
        let mut out = String::new();
        out.push_str("//! Generated by ffire-codegen. Do not edit by hand.\n\n");
        out.push_str("use ffire_wire::{ReadCursor, WireError, WriteCursor};\n\n");

        for def in plan.structs_in_order() {
            out.push_str(&emit_struct(schema, def));
        }

        for message in &schema.messages {
            out.push_str(&emit_message(schema, message));
        }

        Ok(GeneratedSources::single(format!("{}.rs", schema.package), out))
    }
}

fn rust_type(ty: &TypeRef) -> String {
    let base = match ty {
        TypeRef::Primitive { kind, .. } => primitive_type(*kind).to_string(),
        TypeRef::Array { element, .. } => format!("Vec<{}>", rust_type(element)),
        TypeRef::StructRef { name, .. } => name.clone(),
    };
    if ty.is_optional() {
        format!("Option<{base}>")
    } else {
        base
    }
}

fn primitive_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::I8 => "i8",
        PrimitiveKind::I16 => "i16",
        PrimitiveKind::I32 => "i32",
        PrimitiveKind::I64 => "i64",
        PrimitiveKind::F32 => "f32",
        PrimitiveKind::F64 => "f64",
        PrimitiveKind::String => "String",
    }
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{pad}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

fn emit_struct(schema: &Schema, def: &StructDef) -> String {
    let mut out = String::new();
    let fields = planner::wire_fields(def);

    out.push_str(&format!("#[derive(Debug, Clone, PartialEq)]\n#[allow(non_snake_case)]\npub struct {} {{\n", def.name));
    for field in &fields {
        out.push_str(&format!("    pub {}: {},\n", field.name, rust_type(&field.ty)));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("impl {} {{\n", def.name));
    match strategy::struct_strategy(schema, &def.name) {
        Strategy::InlineFixedBlock => out.push_str(&emit_inline_fixed_struct_body(&fields)),
        _ => out.push_str(&emit_general_struct_body(schema, &fields)),
    }
    if strategy::is_simple_struct(schema, &def.name) {
        out.push_str(&emit_encoded_len(&fields));
    }
    out.push_str("}\n\n");
    out
}

fn emit_general_struct_body(schema: &Schema, fields: &[&ffire_schema::Field]) -> String {
    let mut out = String::new();
    out.push_str("    #[allow(non_snake_case)]\n");
    out.push_str("    pub fn encode(&self, out: &mut WriteCursor) -> Result<(), WireError> {\n");
    for field in fields {
        let place = format!("&self.{}", field.name);
        out.push_str(&indent(&emit_encode(schema, &field.ty, &place), 8));
    }
    out.push_str("        Ok(())\n    }\n\n");

    out.push_str("    #[allow(non_snake_case)]\n");
    out.push_str("    pub fn decode(cur: &mut ReadCursor<'_>) -> Result<Self, WireError> {\n");
    for field in fields {
        out.push_str(&format!("        let {} = {};\n", field.name, emit_decode(schema, &field.ty)));
    }
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    out.push_str(&format!("        Ok(Self {{ {} }})\n    }}\n", names.join(", ")));
    out
}

/// E3: every field is a non-optional primitive. A single fixed-size byte
/// block is assembled (encode) or sliced (decode) instead of calling the
/// per-field cursor methods one at a time.
fn emit_inline_fixed_struct_body(fields: &[&ffire_schema::Field]) -> String {
    let total: usize = fields
        .iter()
        .map(|f| {
            let TypeRef::Primitive { kind, .. } = &f.ty else {
                unreachable!("inline fixed block precondition: all-primitive fields")
            };
            kind.fixed_size().expect("non-string primitive has a fixed size")
        })
        .sum();

    let mut encode = format!("    #[allow(non_snake_case)]\n    pub fn encode(&self, out: &mut WriteCursor) -> Result<(), WireError> {{\n        let mut buf = [0u8; {total}];\n");
    let mut decode = format!("    #[allow(non_snake_case)]\n    pub fn decode(cur: &mut ReadCursor<'_>) -> Result<Self, WireError> {{\n        let raw = cur.read_bytes({total})?;\n");

    let mut offset = 0;
    for field in fields {
        let TypeRef::Primitive { kind, .. } = &field.ty else { unreachable!() };
        let size = kind.fixed_size().expect("fixed size");
        let end = offset + size;
        match kind {
            PrimitiveKind::Bool => {
                encode.push_str(&format!("        buf[{offset}] = u8::from(self.{});\n", field.name));
                decode.push_str(&format!(
                    "        let {name} = match raw[{offset}] {{\n            0x00 => false,\n            0x01 => true,\n            other => return Err(WireError::InvalidBool {{ byte: other }}),\n        }};\n",
                    name = field.name
                ));
            }
            _ => {
                let ty = primitive_type(*kind);
                encode.push_str(&format!(
                    "        buf[{offset}..{end}].copy_from_slice(&self.{name}.to_le_bytes());\n",
                    name = field.name
                ));
                decode.push_str(&format!(
                    "        let {name} = {ty}::from_le_bytes(raw[{offset}..{end}].try_into().expect(\"fixed-width slice\"));\n",
                    name = field.name
                ));
            }
        }
        offset = end;
    }
    encode.push_str("        out.write_bytes(&buf);\n        Ok(())\n    }\n\n");
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    decode.push_str(&format!("        Ok(Self {{ {} }})\n    }}\n", names.join(", ")));

    format!("{encode}{decode}")
}

fn emit_encoded_len(fields: &[&ffire_schema::Field]) -> String {
    let mut out = String::new();
    out.push_str("\n    /// Exact encoded byte length of this value. Used by two-pass array\n");
    out.push_str("    /// sizing (E2) for arrays of this struct.\n");
    out.push_str("    #[allow(non_snake_case)]\n    #[must_use]\n    pub fn encoded_len(&self) -> usize {\n        0");
    for field in fields {
        let TypeRef::Primitive { kind, .. } = &field.ty else {
            unreachable!("simple-struct precondition: primitive fields only")
        };
        match kind.fixed_size() {
            Some(size) => out.push_str(&format!(" + {size}")),
            None => out.push_str(&format!(" + 2 + self.{}.len()", field.name)),
        }
    }
    out.push_str("\n    }\n");
    out
}

/// `ref_expr` must already evaluate to a reference to `ty`'s full shape
/// (including any `Option` wrapper).
fn emit_encode(schema: &Schema, ty: &TypeRef, ref_expr: &str) -> String {
    if ty.is_optional() {
        let inner = ty.without_optional();
        format!(
            "match {ref_expr} {{\n    Some(v) => {{\n        out.write_bool(true);\n{}    }}\n    None => out.write_bool(false),\n}}\n",
            indent(&encode_value(schema, &inner, "v"), 8)
        )
    } else {
        encode_value(schema, ty, ref_expr)
    }
}

/// `var` must already evaluate to a reference to the non-optional shape
/// `ty` (a field place prefixed with `&`, or a loop binding from
/// iterating a `&Vec<T>`).
fn encode_value(schema: &Schema, ty: &TypeRef, var: &str) -> String {
    match ty {
        TypeRef::Primitive { kind, .. } => match kind {
            PrimitiveKind::Bool => format!("out.write_bool(*{var});\n"),
            PrimitiveKind::I8 => format!("out.write_i8(*{var});\n"),
            PrimitiveKind::I16 => format!("out.write_i16(*{var});\n"),
            PrimitiveKind::I32 => format!("out.write_i32(*{var});\n"),
            PrimitiveKind::I64 => format!("out.write_i64(*{var});\n"),
            PrimitiveKind::F32 => format!("out.write_f32(*{var});\n"),
            PrimitiveKind::F64 => format!("out.write_f64(*{var});\n"),
            PrimitiveKind::String => format!("out.write_string({var})?;\n"),
        },
        TypeRef::Array { element, .. } => match strategy::array_strategy(schema, element) {
            Strategy::BulkCopy => emit_bulk_copy_encode(element, var),
            Strategy::TwoPassSizing => emit_two_pass_encode(element, var),
            _ => {
                let inner = encode_value(schema, element, "item");
                format!(
                    "out.write_len_prefix({var}.len())?;\nfor item in {var} {{\n{}}}\n",
                    indent(&inner, 4)
                )
            }
        },
        TypeRef::StructRef { .. } => format!("{var}.encode(out)?;\n"),
    }
}

fn emit_bulk_copy_encode(element: &TypeRef, var: &str) -> String {
    let TypeRef::Primitive { kind, .. } = element else {
        unreachable!("bulk-copy precondition: fixed-size primitive element")
    };
    let size = kind.fixed_size().expect("non-string primitive has a fixed size");
    format!(
        "out.write_len_prefix({var}.len())?;\nlet mut raw = Vec::with_capacity({var}.len() * {size});\nfor v in {var} {{\n    raw.extend_from_slice(&v.to_le_bytes());\n}}\nout.write_bytes(&raw);\n"
    )
}

fn emit_two_pass_encode(element: &TypeRef, var: &str) -> String {
    match element {
        TypeRef::Primitive { kind: PrimitiveKind::String, .. } => format!(
            "out.write_len_prefix({var}.len())?;\nlet total: usize = {var}.iter().map(|s| 2 + s.len()).sum();\nlet mut scratch = WriteCursor::with_capacity(total);\nfor s in {var} {{\n    scratch.write_string(s)?;\n}}\nout.write_bytes(&scratch.into_bytes());\n"
        ),
        TypeRef::StructRef { .. } => format!(
            "out.write_len_prefix({var}.len())?;\nlet total: usize = {var}.iter().map(|x| x.encoded_len()).sum();\nlet mut scratch = WriteCursor::with_capacity(total);\nfor x in {var} {{\n    x.encode(&mut scratch)?;\n}}\nout.write_bytes(&scratch.into_bytes());\n"
        ),
        _ => unreachable!("two-pass-sizing precondition: string or simple-struct element"),
    }
}

/// Returns a Rust expression computing a value of `ty` (including any
/// `Option` wrapper) by reading from `cur`.
fn emit_decode(schema: &Schema, ty: &TypeRef) -> String {
    if ty.is_optional() {
        let inner = ty.without_optional();
        format!(
            "match cur.read_bool().map_err(|e| match e {{ WireError::InvalidBool {{ byte }} => WireError::InvalidPresence {{ byte }}, other => other }})? {{\n    true => Some({}),\n    false => None,\n}}",
            decode_value(schema, &inner)
        )
    } else {
        decode_value(schema, ty)
    }
}

fn decode_value(schema: &Schema, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Primitive { kind, .. } => match kind {
            PrimitiveKind::Bool => "cur.read_bool()?".to_string(),
            PrimitiveKind::I8 => "cur.read_i8()?".to_string(),
            PrimitiveKind::I16 => "cur.read_i16()?".to_string(),
            PrimitiveKind::I32 => "cur.read_i32()?".to_string(),
            PrimitiveKind::I64 => "cur.read_i64()?".to_string(),
            PrimitiveKind::F32 => "cur.read_f32()?".to_string(),
            PrimitiveKind::F64 => "cur.read_f64()?".to_string(),
            PrimitiveKind::String => "cur.read_string()?".to_string(),
        },
        TypeRef::Array { element, .. } => match strategy::array_strategy(schema, element) {
            Strategy::BulkCopy => emit_bulk_copy_decode(element),
            _ => {
                let elem = decode_value(schema, element);
                format!(
                    "{{\n    let count = cur.read_len_prefix()? as usize;\n    let mut items = Vec::with_capacity(count.min(4096));\n    for _ in 0..count {{\n        items.push({elem});\n    }}\n    items\n}}"
                )
            }
        },
        TypeRef::StructRef { name, .. } => format!("{name}::decode(cur)?"),
    }
}

fn emit_bulk_copy_decode(element: &TypeRef) -> String {
    let TypeRef::Primitive { kind, .. } = element else {
        unreachable!("bulk-copy precondition: fixed-size primitive element")
    };
    let size = kind.fixed_size().expect("non-string primitive has a fixed size");
    let ty = primitive_type(*kind);
    format!(
        "{{\n    let count = cur.read_len_prefix()? as usize;\n    let raw = cur.read_bytes(count * {size})?;\n    let mut items = Vec::with_capacity(count);\n    for chunk in raw.chunks_exact({size}) {{\n        items.push({ty}::from_le_bytes(chunk.try_into().expect(\"chunks_exact guarantees length\")));\n    }}\n    items\n}}"
    )
}

fn emit_message(schema: &Schema, message: &MessageDecl) -> String {
    let root_ty = planner::root_message_type_name(message);
    let snake = planner::to_snake_case(&planner::root_name(&message.target));
    let value_ty = rust_type(&message.target);
    let reservation = reservation_size(schema, &message.target);

    let mut out = String::new();
    out.push_str(&format!("/// Root type for the `{}` message.\n", message.name));
    out.push_str(&format!("pub type {root_ty} = {value_ty};\n\n"));

    out.push_str(&format!(
        "/// Encodes a [`{root_ty}`] value with no envelope, length prefix, or type tag.\n\
         ///\n\
         /// # Errors\n\
         /// Returns [`WireError::TooLarge`] if any string or array exceeds the\n\
         /// wire-format's uint16 cap.\n\
         pub fn encode_{snake}_message(value: &{root_ty}) -> Result<Vec<u8>, WireError> {{\n\
         \x20   let mut out = WriteCursor::with_capacity({reservation});\n"
    ));
    out.push_str(&indent(&emit_encode(schema, &message.target, "value"), 4));
    out.push_str("    Ok(out.into_bytes())\n}\n\n");

    out.push_str(&format!(
        "/// Decodes a [`{root_ty}`] value leniently: trailing bytes after the root\n\
         /// value are ignored.\n\
         ///\n\
         /// # Errors\n\
         /// Returns a [`WireError`] on malformed input; never panics.\n\
         pub fn decode_{snake}_message(bytes: &[u8]) -> Result<{root_ty}, WireError> {{\n\
         \x20   let mut cur = ReadCursor::new(bytes);\n\
         \x20   let value = {};\n\
         \x20   Ok(value)\n}}\n\n",
        emit_decode(schema, &message.target)
    ));

    out.push_str(&format!(
        "/// Decodes a [`{root_ty}`] value strictly: returns\n\
         /// [`WireError::TrailingBytes`] if any bytes remain after the root value.\n\
         ///\n\
         /// # Errors\n\
         /// See [`decode_{snake}_message`]; additionally\n\
         /// [`WireError::TrailingBytes`].\n\
         pub fn decode_{snake}_message_strict(bytes: &[u8]) -> Result<{root_ty}, WireError> {{\n\
         \x20   let mut cur = ReadCursor::new(bytes);\n\
         \x20   let value = {};\n\
         \x20   cur.expect_exhausted()?;\n\
         \x20   Ok(value)\n}}\n\n",
        emit_decode(schema, &message.target)
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffire_schema::Field;

    fn device_schema() -> Schema {
        let mut schema = Schema::new("demo");
        let mut device = StructDef::new("Device");
        device.add_field(Field::new("Name", TypeRef::primitive(PrimitiveKind::String)));
        device.add_field(Field::new("Channels", TypeRef::primitive(PrimitiveKind::I32)));
        schema.add_type(TypeDef::Struct(device));
        schema.add_message(MessageDecl::new(
            "DeviceList",
            TypeRef::array(TypeRef::struct_ref("Device")),
        ));
        schema
    }

    #[test]
    fn test_emit_struct_declares_fields_in_wire_order() {
        let schema = device_schema();
        let TypeDef::Struct(def) = schema.get_type("Device").unwrap();
        let text = emit_struct(&schema, def);
        let channels_pos = text.find("Channels").unwrap();
        let name_pos = text.find("Name").unwrap();
        assert!(channels_pos < name_pos, "i32 (fixed4) must precede string (variable)");
    }

    #[test]
    fn test_emit_message_defines_root_alias_and_functions() {
        let schema = device_schema();
        let text = emit_message(&schema, &schema.messages[0]);
        assert!(text.contains("pub type DeviceListMessage = Vec<Device>;"));
        assert!(text.contains("pub fn encode_device_message"));
        assert!(text.contains("pub fn decode_device_message"));
        assert!(text.contains("pub fn decode_device_message_strict"));
    }

    #[test]
    fn test_inline_fixed_block_used_for_all_primitive_struct() {
        let mut schema = Schema::new("demo");
        let mut point = StructDef::new("Point");
        point.add_field(Field::new("X", TypeRef::primitive(PrimitiveKind::I32)));
        point.add_field(Field::new("Y", TypeRef::primitive(PrimitiveKind::I32)));
        schema.add_type(TypeDef::Struct(point));
        let TypeDef::Struct(def) = schema.get_type("Point").unwrap();
        let text = emit_struct(&schema, def);
        assert!(text.contains("let mut buf = [0u8; 8];"));
    }

    #[test]
    fn test_bulk_copy_used_for_fixed_primitive_array_field() {
        let mut schema = Schema::new("demo");
        let mut samples = StructDef::new("Samples");
        samples.add_field(Field::new(
            "Values",
            TypeRef::array(TypeRef::primitive(PrimitiveKind::I32)),
        ));
        schema.add_type(TypeDef::Struct(samples));
        let TypeDef::Struct(def) = schema.get_type("Samples").unwrap();
        let text = emit_struct(&schema, def);
        assert!(text.contains("raw.extend_from_slice(&v.to_le_bytes());"));
    }

    #[test]
    fn test_emit_rejects_nothing_for_valid_schema() {
        let schema = device_schema();
        let emitter = RustEmitter;
        let sources = emitter.emit(&schema).unwrap();
        assert_eq!(sources.files.len(), 1);
        assert!(sources.files[0].source.contains("pub struct Device"));
    }
}
