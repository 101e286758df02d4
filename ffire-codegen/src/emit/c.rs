//! C target emitter.
//!
//! C has no shared runtime crate to depend on (there's no `ffire-wire`
//! equivalent on the C side), so this emitter inlines a small
//! bounds-checked cursor pair into every generated source file. The
//! cursor functions mirror [`ffire_wire::buffer`]'s contract byte for
//! byte — same bounds checks, same little-endian layout, same error
//! taxonomy — just expressed as a C error code instead of a `Result`.

use crate::analyzer::reservation_size;
use crate::error::GenError;
use crate::planner::{self, Plan};
use crate::strategy::{self, Strategy};
use crate::target::{Emitter, GeneratedFile, GeneratedSources, TargetLanguage};
use ffire_schema::{MessageDecl, PrimitiveKind, Schema, StructDef, TypeRef};
use std::collections::HashSet;

const RUNTIME_HEADER: &str = r#"typedef enum {
    FFIRE_OK = 0,
    FFIRE_ERR_TRUNCATED,
    FFIRE_ERR_TOO_LARGE,
    FFIRE_ERR_INVALID_UTF8,
    FFIRE_ERR_INVALID_BOOL,
    FFIRE_ERR_INVALID_PRESENCE,
    FFIRE_ERR_TRAILING_BYTES,
} ffire_error_t;
"#;

const RUNTIME_SOURCE: &str = r#"typedef struct {
    const uint8_t *buf;
    size_t len;
    size_t pos;
} ffire_reader_t;

typedef struct {
    uint8_t *buf;
    size_t len;
    size_t cap;
} ffire_writer_t;

static void ffire_writer_init(ffire_writer_t *w, size_t reserve) {
    w->buf = (uint8_t *)malloc(reserve > 0 ? reserve : 1);
    w->len = 0;
    w->cap = reserve > 0 ? reserve : 1;
}

static void ffire_writer_grow(ffire_writer_t *w, size_t extra) {
    if (w->len + extra <= w->cap) {
        return;
    }
    size_t new_cap = w->cap * 2;
    while (new_cap < w->len + extra) {
        new_cap *= 2;
    }
    w->buf = (uint8_t *)realloc(w->buf, new_cap);
    w->cap = new_cap;
}

static void ffire_write_bytes(ffire_writer_t *w, const uint8_t *bytes, size_t n) {
    ffire_writer_grow(w, n);
    memcpy(w->buf + w->len, bytes, n);
    w->len += n;
}

static ffire_error_t ffire_write_len_prefix(ffire_writer_t *w, size_t len) {
    if (len > 0xFFFFu) {
        return FFIRE_ERR_TOO_LARGE;
    }
    uint16_t l = (uint16_t)len;
    ffire_write_bytes(w, (const uint8_t *)&l, 2);
    return FFIRE_OK;
}

static ffire_error_t ffire_write_string(ffire_writer_t *w, const char *s, size_t len) {
    ffire_error_t err = ffire_write_len_prefix(w, len);
    if (err != FFIRE_OK) {
        return err;
    }
    ffire_write_bytes(w, (const uint8_t *)s, len);
    return FFIRE_OK;
}

static ffire_error_t ffire_reader_check(const ffire_reader_t *r, size_t needed) {
    if (r->pos + needed > r->len) {
        return FFIRE_ERR_TRUNCATED;
    }
    return FFIRE_OK;
}

static ffire_error_t ffire_read_bytes(ffire_reader_t *r, size_t n, const uint8_t **out) {
    ffire_error_t err = ffire_reader_check(r, n);
    if (err != FFIRE_OK) {
        return err;
    }
    *out = r->buf + r->pos;
    r->pos += n;
    return FFIRE_OK;
}

static ffire_error_t ffire_read_bool(ffire_reader_t *r, bool *out) {
    const uint8_t *b;
    ffire_error_t err = ffire_read_bytes(r, 1, &b);
    if (err != FFIRE_OK) {
        return err;
    }
    if (b[0] == 0x00) {
        *out = false;
    } else if (b[0] == 0x01) {
        *out = true;
    } else {
        return FFIRE_ERR_INVALID_BOOL;
    }
    return FFIRE_OK;
}

static ffire_error_t ffire_read_presence(ffire_reader_t *r, bool *out) {
    const uint8_t *b;
    ffire_error_t err = ffire_read_bytes(r, 1, &b);
    if (err != FFIRE_OK) {
        return err;
    }
    if (b[0] == 0x00) {
        *out = false;
    } else if (b[0] == 0x01) {
        *out = true;
    } else {
        return FFIRE_ERR_INVALID_PRESENCE;
    }
    return FFIRE_OK;
}

static ffire_error_t ffire_read_len_prefix(ffire_reader_t *r, uint16_t *out) {
    const uint8_t *b;
    ffire_error_t err = ffire_read_bytes(r, 2, &b);
    if (err != FFIRE_OK) {
        return err;
    }
    memcpy(out, b, 2);
    return FFIRE_OK;
}

static bool ffire_is_valid_utf8(const uint8_t *bytes, size_t len) {
    size_t i = 0;
    while (i < len) {
        uint8_t b0 = bytes[i];
        size_t extra;
        uint32_t cp;
        if (b0 < 0x80) {
            i += 1;
            continue;
        } else if ((b0 & 0xE0) == 0xC0) {
            extra = 1;
            cp = b0 & 0x1F;
        } else if ((b0 & 0xF0) == 0xE0) {
            extra = 2;
            cp = b0 & 0x0F;
        } else if ((b0 & 0xF8) == 0xF0) {
            extra = 3;
            cp = b0 & 0x07;
        } else {
            return false;
        }
        if (i + extra >= len) {
            return false;
        }
        for (size_t j = 1; j <= extra; j++) {
            uint8_t b = bytes[i + j];
            if ((b & 0xC0) != 0x80) {
                return false;
            }
            cp = (cp << 6) | (b & 0x3F);
        }
        if ((extra == 1 && cp < 0x80) || (extra == 2 && cp < 0x800) || (extra == 3 && cp < 0x10000)) {
            return false;
        }
        if (cp > 0x10FFFF || (cp >= 0xD800 && cp <= 0xDFFF)) {
            return false;
        }
        i += 1 + extra;
    }
    return true;
}

static ffire_error_t ffire_read_string(ffire_reader_t *r, char **out, size_t *out_len) {
    uint16_t len;
    ffire_error_t err = ffire_read_len_prefix(r, &len);
    if (err != FFIRE_OK) {
        return err;
    }
    const uint8_t *bytes;
    err = ffire_read_bytes(r, len, &bytes);
    if (err != FFIRE_OK) {
        return err;
    }
    if (!ffire_is_valid_utf8(bytes, len)) {
        return FFIRE_ERR_INVALID_UTF8;
    }
    char *s = (char *)malloc((size_t)len + 1);
    memcpy(s, bytes, len);
    s[len] = '\0';
    *out = s;
    *out_len = len;
    return FFIRE_OK;
}

static ffire_error_t ffire_expect_exhausted(const ffire_reader_t *r) {
    if (r->pos != r->len) {
        return FFIRE_ERR_TRAILING_BYTES;
    }
    return FFIRE_OK;
}
"#;

/// The C target-language emitter. Emits a `<package>.h` / `<package>.c`
/// pair.
pub struct CEmitter;

impl Emitter for CEmitter {
    fn target(&self) -> TargetLanguage {
        TargetLanguage::C
    }

    fn emit(&self, schema: &Schema) -> Result<GeneratedSources, GenError> {
        let plan = Plan::build(schema);
        let guard = format!("FFIRE_{}_H", schema.package.to_uppercase());

        let mut header = String::new();
        header.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        header.push_str("#include <stdint.h>\n#include <stddef.h>\n#include <stdbool.h>\n\n");
        header.push_str(RUNTIME_HEADER);
        header.push('\n');
        for def in plan.structs_in_order() {
            header.push_str(&emit_struct_decl(def));
        }
        let mut array_roots_declared = HashSet::new();
        for message in &schema.messages {
            if let TypeRef::Array { element, .. } = &message.target {
                let root_ty = message_root_c_type(&message.target);
                if array_roots_declared.insert(root_ty.clone()) {
                    header.push_str(&emit_array_root_typedef(&root_ty, element));
                }
            }
        }
        for message in &schema.messages {
            header.push_str(&emit_message_decl(schema, message));
        }
        header.push_str(&format!("\n#endif /* {guard} */\n"));

        let mut source = String::new();
        source.push_str(&format!("#include \"{}.h\"\n", schema.package));
        source.push_str("#include <string.h>\n#include <stdlib.h>\n\n");
        source.push_str(RUNTIME_SOURCE);
        source.push('\n');
        for def in plan.structs_in_order() {
            source.push_str(&emit_struct_impl(schema, def));
        }
        for message in &schema.messages {
            source.push_str(&emit_message_impl(schema, message));
        }

        Ok(GeneratedSources {
            files: vec![
                GeneratedFile {
                    name: format!("{}.h", schema.package),
                    source: header,
                },
                GeneratedFile {
                    name: format!("{}.c", schema.package),
                    source,
                },
            ],
        })
    }
}

fn c_scalar_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::I8 => "int8_t",
        PrimitiveKind::I16 => "int16_t",
        PrimitiveKind::I32 => "int32_t",
        PrimitiveKind::I64 => "int64_t",
        PrimitiveKind::F32 => "float",
        PrimitiveKind::F64 => "double",
        PrimitiveKind::String => "char*",
    }
}

/// C has no sum-type convenience for "value or string or array"; every
/// field maps onto a concrete C field declaration: scalars inline, an
/// array onto a `T* <field>; size_t <field>_count;` pair, and optional
/// presence onto a sibling `bool <field>_present;` flag.
fn c_field_decls(field: &ffire_schema::Field) -> Vec<String> {
    let mut lines = Vec::new();
    let ty = field.ty.without_optional();
    match &ty {
        TypeRef::Primitive { kind, .. } => {
            lines.push(format!("    {} {};", c_scalar_type(*kind), field.name));
        }
        TypeRef::Array { element, .. } => {
            lines.push(format!("    {} *{};", array_element_c_type(element), field.name));
            lines.push(format!("    size_t {}_count;", field.name));
        }
        TypeRef::StructRef { name, .. } => {
            lines.push(format!("    {} {};", name, field.name));
        }
    }
    if field.is_optional() {
        lines.push(format!("    bool {}_present;", field.name));
    }
    lines
}

fn array_element_c_type(element: &TypeRef) -> String {
    match element {
        TypeRef::Primitive { kind, .. } => c_scalar_type(*kind).to_string(),
        TypeRef::StructRef { name, .. } => name.clone(),
        TypeRef::Array { .. } => {
            unreachable!("nested arrays of arrays are not part of this wire format")
        }
    }
}

fn emit_struct_decl(def: &StructDef) -> String {
    let fields = planner::wire_fields(def);
    let mut out = format!("typedef struct {} {{\n", def.name);
    for field in &fields {
        for line in c_field_decls(field) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(&format!("}} {};\n\n", def.name));
    out.push_str(&format!(
        "ffire_error_t {snake}_encode(const {name} *value, ffire_writer_t *out);\n\
         ffire_error_t {snake}_decode({name} *out, ffire_reader_t *cur);\n\n",
        snake = planner::to_snake_case(&def.name),
        name = def.name
    ));
    out
}

fn emit_struct_impl(schema: &Schema, def: &StructDef) -> String {
    let fields = planner::wire_fields(def);
    let snake = planner::to_snake_case(&def.name);
    let mut out = format!(
        "ffire_error_t {snake}_encode(const {name} *value, ffire_writer_t *out) {{\n    ffire_error_t err;\n",
        name = def.name
    );
    for field in &fields {
        out.push_str(&emit_field_encode(schema, field, "value", "out"));
    }
    out.push_str("    return FFIRE_OK;\n}\n\n");

    out.push_str(&format!(
        "ffire_error_t {snake}_decode({name} *out, ffire_reader_t *cur) {{\n    ffire_error_t err;\n",
        name = def.name
    ));
    for field in &fields {
        out.push_str(&emit_field_decode(schema, field, "out", "cur"));
    }
    out.push_str("    return FFIRE_OK;\n}\n\n");
    out
}

fn emit_field_encode(schema: &Schema, field: &ffire_schema::Field, owner: &str, writer: &str) -> String {
    let path = format!("{owner}->{}", field.name);
    if field.is_optional() {
        let inner = field.ty.without_optional();
        return format!(
            "    if ({path}_present) {{\n        ffire_write_bytes({writer}, (const uint8_t[]){{0x01}}, 1);\n{}    }} else {{\n        ffire_write_bytes({writer}, (const uint8_t[]){{0x00}}, 1);\n    }}\n",
            indent_lines(&encode_expr(schema, &inner, &path, writer), 8)
        );
    }
    encode_expr(schema, &field.ty, &path, writer)
}

fn indent_lines(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines().map(|l| format!("{pad}{l}\n")).collect()
}

/// `writer` is a C expression evaluating to a `ffire_writer_t *` — usually
/// a function parameter named `out`, but the root-level array/primitive
/// encoders hold their writer by value and must pass `&w` instead.
fn encode_expr(schema: &Schema, ty: &TypeRef, path: &str, writer: &str) -> String {
    match ty {
        TypeRef::Primitive { kind: PrimitiveKind::String, .. } => format!(
            "    err = ffire_write_string({writer}, {path}, strlen({path}));\n    if (err != FFIRE_OK) return err;\n"
        ),
        TypeRef::Primitive { kind, .. } => {
            format!("    ffire_write_bytes({writer}, (const uint8_t *)&{path}, sizeof({path}));\n", path = encode_bool_cast(*kind, path))
        }
        TypeRef::Array { element, .. } => match strategy::array_strategy(schema, element) {
            Strategy::BulkCopy => format!(
                "    err = ffire_write_len_prefix({writer}, {path}_count);\n    if (err != FFIRE_OK) return err;\n    ffire_write_bytes({writer}, (const uint8_t *){path}, {path}_count * sizeof(*{path}));\n"
            ),
            _ => {
                let elem_encode = encode_expr(schema, element, "(*item)", writer);
                format!(
                    "    err = ffire_write_len_prefix({writer}, {path}_count);\n    if (err != FFIRE_OK) return err;\n    for (size_t i = 0; i < {path}_count; i++) {{\n        const {elem_ty} *item = &{path}[i];\n{}    }}\n",
                    indent_lines(&elem_encode, 8),
                    elem_ty = array_element_c_type(element)
                )
            }
        },
        TypeRef::StructRef { name, .. } => format!(
            "    err = {snake}_encode(&{path}, {writer});\n    if (err != FFIRE_OK) return err;\n",
            snake = planner::to_snake_case(name)
        ),
    }
}

fn encode_bool_cast(kind: PrimitiveKind, path: &str) -> String {
    // `bool` is 1 byte on every target this emitter supports; no special
    // casing needed beyond the generic byte copy.
    let _ = kind;
    path.to_string()
}

fn emit_field_decode(schema: &Schema, field: &ffire_schema::Field, owner: &str, reader: &str) -> String {
    let path = format!("{owner}->{}", field.name);
    if field.is_optional() {
        let inner = field.ty.without_optional();
        return format!(
            "    {{\n        bool present;\n        err = ffire_read_presence({reader}, &present);\n        if (err != FFIRE_OK) return err;\n        {path}_present = present;\n        if (present) {{\n{}        }}\n    }}\n",
            indent_lines(&decode_expr(schema, &inner, &path, reader), 12)
        );
    }
    decode_expr(schema, &field.ty, &path, reader)
}

/// `reader` is a C expression evaluating to a `ffire_reader_t *` — usually
/// a function parameter named `cur`, but the root-level array/primitive
/// decoders hold their reader by value and must pass `&r` instead.
fn decode_expr(schema: &Schema, ty: &TypeRef, path: &str, reader: &str) -> String {
    match ty {
        TypeRef::Primitive { kind: PrimitiveKind::Bool, .. } => format!(
            "    err = ffire_read_bool({reader}, &{path});\n    if (err != FFIRE_OK) return err;\n"
        ),
        TypeRef::Primitive { kind: PrimitiveKind::String, .. } => format!(
            "    {{\n        size_t len;\n        err = ffire_read_string({reader}, &{path}, &len);\n        if (err != FFIRE_OK) return err;\n    }}\n"
        ),
        TypeRef::Primitive { kind, .. } => {
            let ty_name = c_scalar_type(*kind);
            format!(
                "    {{\n        const uint8_t *bytes;\n        err = ffire_read_bytes({reader}, sizeof({ty_name}), &bytes);\n        if (err != FFIRE_OK) return err;\n        memcpy(&{path}, bytes, sizeof({ty_name}));\n    }}\n"
            )
        }
        TypeRef::Array { element, .. } => {
            let elem_ty = array_element_c_type(element);
            match strategy::array_strategy(schema, element) {
                Strategy::BulkCopy => format!(
                    "    {{\n        uint16_t count;\n        err = ffire_read_len_prefix({reader}, &count);\n        if (err != FFIRE_OK) return err;\n        const uint8_t *bytes;\n        err = ffire_read_bytes({reader}, (size_t)count * sizeof({elem_ty}), &bytes);\n        if (err != FFIRE_OK) return err;\n        {path} = ({elem_ty} *)malloc((size_t)count * sizeof({elem_ty}));\n        memcpy({path}, bytes, (size_t)count * sizeof({elem_ty}));\n        {path}_count = count;\n    }}\n"
                ),
                _ => {
                    let elem_decode = decode_expr(schema, element, "(*slot)", reader);
                    format!(
                        "    {{\n        uint16_t count;\n        err = ffire_read_len_prefix({reader}, &count);\n        if (err != FFIRE_OK) return err;\n        {path} = ({elem_ty} *)malloc((size_t)count * sizeof({elem_ty}));\n        {path}_count = count;\n        for (size_t i = 0; i < (size_t)count; i++) {{\n            {elem_ty} *slot = &{path}[i];\n{}        }}\n    }}\n",
                        indent_lines(&elem_decode, 12)
                    )
                }
            }
        }
        TypeRef::StructRef { name, .. } => format!(
            "    err = {snake}_decode(&{path}, {reader});\n    if (err != FFIRE_OK) return err;\n",
            snake = planner::to_snake_case(name)
        ),
    }
}

fn emit_message_decl(schema: &Schema, message: &MessageDecl) -> String {
    let root_ty = message_root_c_type(&message.target);
    let snake = planner::to_snake_case(&planner::root_name(&message.target));
    let _ = schema;
    format!(
        "ffire_error_t encode_{snake}_message(const {root_ty} *value, uint8_t **out_buf, size_t *out_len);\n\
         ffire_error_t decode_{snake}_message({root_ty} *out, const uint8_t *buf, size_t len);\n\
         ffire_error_t decode_{snake}_message_strict({root_ty} *out, const uint8_t *buf, size_t len);\n\n"
    )
}

/// Names the C type for a message root shape: a struct name directly, or
/// a generated array wrapper `<Element>Array` for an array root (C has
/// no anonymous `Vec<T>` equivalent to alias onto).
fn message_root_c_type(ty: &TypeRef) -> String {
    match ty {
        TypeRef::StructRef { name, .. } => name.clone(),
        TypeRef::Array { .. } => format!("{}Array", planner::root_name(ty)),
        TypeRef::Primitive { kind, .. } => c_scalar_type(*kind).to_string(),
    }
}

/// Emits the wrapper struct backing an array-root message. The field pair
/// is named `Values` / `Values_count` so `encode_expr`/`decode_expr`'s
/// generic array handling (which assumes a `{field}` / `{field}_count`
/// sibling pair) applies unmodified to the root.
fn emit_array_root_typedef(root_ty: &str, element: &TypeRef) -> String {
    format!(
        "typedef struct {{\n    {ty} *Values;\n    size_t Values_count;\n}} {root_ty};\n\n",
        ty = array_element_c_type(element)
    )
}

fn emit_message_impl(schema: &Schema, message: &MessageDecl) -> String {
    let root_ty = message_root_c_type(&message.target);
    let snake = planner::to_snake_case(&planner::root_name(&message.target));
    let reservation = reservation_size(schema, &message.target);

    let mut out = String::new();
    out.push_str(&format!(
        "ffire_error_t encode_{snake}_message(const {root_ty} *value, uint8_t **out_buf, size_t *out_len) {{\n\
         \x20   ffire_writer_t w;\n    ffire_writer_init(&w, {reservation});\n    ffire_error_t err;\n"
    ));
    out.push_str(&encode_root_body(schema, &message.target, "value"));
    out.push_str("    *out_buf = w.buf;\n    *out_len = w.len;\n    return FFIRE_OK;\n}\n\n");

    out.push_str(&format!(
        "ffire_error_t decode_{snake}_message({root_ty} *out, const uint8_t *buf, size_t len) {{\n\
         \x20   ffire_reader_t r = {{ buf, len, 0 }};\n    ffire_error_t err;\n"
    ));
    out.push_str(&decode_root_body(schema, &message.target, "out"));
    out.push_str("    return FFIRE_OK;\n}\n\n");

    out.push_str(&format!(
        "ffire_error_t decode_{snake}_message_strict({root_ty} *out, const uint8_t *buf, size_t len) {{\n\
         \x20   ffire_reader_t r = {{ buf, len, 0 }};\n    ffire_error_t err;\n"
    ));
    out.push_str(&decode_root_body(schema, &message.target, "out"));
    out.push_str("    err = ffire_expect_exhausted(&r);\n    if (err != FFIRE_OK) return err;\n    return FFIRE_OK;\n}\n\n");
    out
}

fn encode_root_body(schema: &Schema, ty: &TypeRef, value_ptr: &str) -> String {
    match ty {
        TypeRef::StructRef { name, .. } => format!(
            "    err = {snake}_encode({value_ptr}, &w);\n    if (err != FFIRE_OK) return err;\n",
            snake = planner::to_snake_case(name)
        ),
        TypeRef::Array { .. } => {
            let path = format!("{value_ptr}->Values");
            encode_expr(schema, ty, &path, "&w")
        }
        TypeRef::Primitive { .. } => {
            let path = format!("(*{value_ptr})");
            encode_expr(schema, ty, &path, "&w")
        }
    }
}

fn decode_root_body(schema: &Schema, ty: &TypeRef, out_ptr: &str) -> String {
    match ty {
        TypeRef::StructRef { name, .. } => format!(
            "    err = {snake}_decode({out_ptr}, &r);\n    if (err != FFIRE_OK) return err;\n",
            snake = planner::to_snake_case(name)
        ),
        TypeRef::Array { .. } => {
            let path = format!("{out_ptr}->Values");
            decode_expr(schema, ty, &path, "&r")
        }
        TypeRef::Primitive { .. } => {
            let path = format!("(*{out_ptr})");
            decode_expr(schema, ty, &path, "&r")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffire_schema::{Field, TypeDef};

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
    fn test_emit_produces_header_and_source() {
        let schema = device_schema();
        let emitter = CEmitter;
        let sources = emitter.emit(&schema).unwrap();
        assert_eq!(sources.files.len(), 2);
        assert!(sources.get("demo.h").unwrap().contains("typedef struct Device"));
        assert!(sources.get("demo.c").unwrap().contains("device_encode"));
    }

    #[test]
    fn test_struct_decl_orders_fields_canonically() {
        let schema = device_schema();
        let TypeDef::Struct(def) = schema.get_type("Device").unwrap();
        let decl = emit_struct_decl(def);
        let channels_pos = decl.find("Channels").unwrap();
        let name_pos = decl.find("char").unwrap();
        assert!(channels_pos < name_pos);
    }

    fn device_list_schema() -> Schema {
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
    fn test_array_root_message_emits_wrapper_typedef_and_valid_calls() {
        let schema = device_list_schema();
        let emitter = CEmitter;
        let sources = emitter.emit(&schema).unwrap();
        let header = sources.get("demo.h").unwrap();
        // The wrapper struct must actually be declared, not merely referenced.
        assert!(header.contains("typedef struct {\n    Device *Values;\n    size_t Values_count;\n} DeviceArray;"));
        assert!(header.contains("encode_device_message(const DeviceArray *value"));

        let source = sources.get("demo.c").unwrap();
        // No dangling `(*value)_count`-style identifiers from the old
        // string-replace approach, and no references to an undefined `out`
        // at the root-function scope (the writer there is `w`).
        assert!(!source.contains("(*value)_count"));
        assert!(source.contains("value->Values_count"));
        assert!(source.contains("device_encode(&(*item), &w)") || source.contains("device_encode(&value->Values[i"));
    }

    #[test]
    fn test_array_root_message_dedupes_wrapper_typedef_across_messages() {
        let mut schema = device_list_schema();
        schema.add_message(MessageDecl::new(
            "DeviceList2",
            TypeRef::array(TypeRef::struct_ref("Device")),
        ));
        let emitter = CEmitter;
        let sources = emitter.emit(&schema).unwrap();
        let header = sources.get("demo.h").unwrap();
        assert_eq!(header.matches("} DeviceArray;").count(), 1);
    }

    #[test]
    fn test_read_string_validates_utf8() {
        let schema = device_schema();
        let emitter = CEmitter;
        let sources = emitter.emit(&schema).unwrap();
        let source = sources.get("demo.c").unwrap();
        assert!(source.contains("ffire_is_valid_utf8"));
        assert!(source.contains("if (!ffire_is_valid_utf8(bytes, len)) {\n        return FFIRE_ERR_INVALID_UTF8;\n    }"));
    }
}
