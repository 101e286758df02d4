//! Go target emitter.
//!
//! Exported functions follow Go's `PascalCase` exported-identifier
//! convention (`EncodeDeviceMessage`, not `encode_device_message`);
//! struct field names pass through unchanged, same as every other
//! target, since Go also treats a capitalized field name as exported
//! and the schema's authored names are already capitalized by
//! convention. A small unexported `ffireBuffer`/`ffireReader` pair
//! plays the role `ffire-wire`'s cursors play for Rust.

use crate::analyzer::reservation_size;
use crate::error::GenError;
use crate::planner::{self, Plan};
use crate::strategy::{self, Strategy};
use crate::target::{Emitter, GeneratedSources, TargetLanguage};
use ffire_schema::{Field, MessageDecl, PrimitiveKind, Schema, StructDef, TypeRef};

const RUNTIME: &str = r#"type ffireReader struct {
	buf []byte
	pos int
}

func (r *ffireReader) checkedTake(n int) ([]byte, error) {
	if r.pos+n > len(r.buf) {
		return nil, fmt.Errorf("ffire: truncated: need %d, have %d", n, len(r.buf)-r.pos)
	}
	b := r.buf[r.pos : r.pos+n]
	r.pos += n
	return b, nil
}

func (r *ffireReader) readBool() (bool, error) {
	b, err := r.checkedTake(1)
	if err != nil {
		return false, err
	}
	switch b[0] {
	case 0x00:
		return false, nil
	case 0x01:
		return true, nil
	default:
		return false, fmt.Errorf("ffire: invalid bool byte 0x%02x", b[0])
	}
}

func (r *ffireReader) readI8() (int8, error) {
	b, err := r.checkedTake(1)
	if err != nil {
		return 0, err
	}
	return int8(b[0]), nil
}

func (r *ffireReader) readI16() (int16, error) {
	b, err := r.checkedTake(2)
	if err != nil {
		return 0, err
	}
	return int16(binary.LittleEndian.Uint16(b)), nil
}

func (r *ffireReader) readI32() (int32, error) {
	b, err := r.checkedTake(4)
	if err != nil {
		return 0, err
	}
	return int32(binary.LittleEndian.Uint32(b)), nil
}

func (r *ffireReader) readI64() (int64, error) {
	b, err := r.checkedTake(8)
	if err != nil {
		return 0, err
	}
	return int64(binary.LittleEndian.Uint64(b)), nil
}

func (r *ffireReader) readF32() (float32, error) {
	b, err := r.checkedTake(4)
	if err != nil {
		return 0, err
	}
	return math.Float32frombits(binary.LittleEndian.Uint32(b)), nil
}

func (r *ffireReader) readF64() (float64, error) {
	b, err := r.checkedTake(8)
	if err != nil {
		return 0, err
	}
	return math.Float64frombits(binary.LittleEndian.Uint64(b)), nil
}

func (r *ffireReader) readPresence() (bool, error) {
	b, err := r.checkedTake(1)
	if err != nil {
		return false, err
	}
	switch b[0] {
	case 0x00:
		return false, nil
	case 0x01:
		return true, nil
	default:
		return false, fmt.Errorf("ffire: invalid presence byte 0x%02x", b[0])
	}
}

func (r *ffireReader) readLenPrefix() (uint16, error) {
	b, err := r.checkedTake(2)
	if err != nil {
		return 0, err
	}
	return binary.LittleEndian.Uint16(b), nil
}

func (r *ffireReader) readString() (string, error) {
	n, err := r.readLenPrefix()
	if err != nil {
		return "", err
	}
	b, err := r.checkedTake(int(n))
	if err != nil {
		return "", err
	}
	if !utf8.Valid(b) {
		return "", fmt.Errorf("ffire: invalid utf-8")
	}
	return string(b), nil
}

func (r *ffireReader) expectExhausted() error {
	if r.pos != len(r.buf) {
		return fmt.Errorf("ffire: %d trailing bytes", len(r.buf)-r.pos)
	}
	return nil
}

type ffireWriter struct {
	buf []byte
}

func newFfireWriter(reserve int) *ffireWriter {
	return &ffireWriter{buf: make([]byte, 0, reserve)}
}

func (w *ffireWriter) writeBool(v bool) {
	if v {
		w.buf = append(w.buf, 0x01)
	} else {
		w.buf = append(w.buf, 0x00)
	}
}

func (w *ffireWriter) writeI8(v int8)   { w.buf = append(w.buf, byte(v)) }
func (w *ffireWriter) writeI16(v int16) { w.buf = binary.LittleEndian.AppendUint16(w.buf, uint16(v)) }
func (w *ffireWriter) writeI32(v int32) { w.buf = binary.LittleEndian.AppendUint32(w.buf, uint32(v)) }
func (w *ffireWriter) writeI64(v int64) { w.buf = binary.LittleEndian.AppendUint64(w.buf, uint64(v)) }
func (w *ffireWriter) writeF32(v float32) {
	w.buf = binary.LittleEndian.AppendUint32(w.buf, math.Float32bits(v))
}
func (w *ffireWriter) writeF64(v float64) {
	w.buf = binary.LittleEndian.AppendUint64(w.buf, math.Float64bits(v))
}

func (w *ffireWriter) writeLenPrefix(n int) error {
	if n > 0xFFFF {
		return fmt.Errorf("ffire: length %d exceeds uint16 cap", n)
	}
	w.buf = binary.LittleEndian.AppendUint16(w.buf, uint16(n))
	return nil
}

func (w *ffireWriter) writeString(s string) error {
	if err := w.writeLenPrefix(len(s)); err != nil {
		return err
	}
	w.buf = append(w.buf, s...)
	return nil
}

func (w *ffireWriter) writeBytes(b []byte) {
	w.buf = append(w.buf, b...)
}
"#;

/// The Go target-language emitter.
pub struct GoEmitter;

impl Emitter for GoEmitter {
    fn target(&self) -> TargetLanguage {
        TargetLanguage::Go
    }

    fn emit(&self, schema: &Schema) -> Result<GeneratedSources, GenError> {
        let plan = Plan::build(schema);
        let mut out = String::new();
        out.push_str(&format!("package {}\n\n", go_package_name(&schema.package)));
        out.push_str("import (\n\t\"encoding/binary\"\n\t\"fmt\"\n\t\"math\"\n\t\"unicode/utf8\"\n)\n\n");
        out.push_str(RUNTIME);
        out.push('\n');

        for def in plan.structs_in_order() {
            out.push_str(&emit_struct(schema, def));
        }
        for message in &schema.messages {
            out.push_str(&emit_message(schema, message));
        }

        Ok(GeneratedSources::single(format!("{}.go", schema.package), out))
    }
}

fn go_package_name(package: &str) -> String {
    planner::to_snake_case(package)
}

fn go_type(ty: &TypeRef) -> String {
    let base = match ty {
        TypeRef::Primitive { kind, .. } => go_scalar_type(*kind).to_string(),
        TypeRef::Array { element, .. } => format!("[]{}", go_type(element)),
        TypeRef::StructRef { name, .. } => name.clone(),
    };
    if ty.is_optional() {
        format!("*{base}")
    } else {
        base
    }
}

fn go_scalar_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Bool => "bool",
        PrimitiveKind::I8 => "int8",
        PrimitiveKind::I16 => "int16",
        PrimitiveKind::I32 => "int32",
        PrimitiveKind::I64 => "int64",
        PrimitiveKind::F32 => "float32",
        PrimitiveKind::F64 => "float64",
        PrimitiveKind::String => "string",
    }
}

fn emit_struct(schema: &Schema, def: &StructDef) -> String {
    let fields = planner::wire_fields(def);
    let mut out = format!("type {} struct {{\n", def.name);
    for field in &fields {
        out.push_str(&format!("\t{} {}\n", field.name, go_type(&field.ty)));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("func (v *{}) encode(w *ffireWriter) error {{\n", def.name));
    for field in &fields {
        out.push_str(&emit_field_encode(schema, field, "v"));
    }
    out.push_str("\treturn nil\n}\n\n");

    out.push_str(&format!("func decode{}(r *ffireReader) (*{name}, error) {{\n\tv := &{name}{{}}\n", def.name, name = def.name));
    for field in &fields {
        out.push_str(&emit_field_decode(schema, field, "v"));
    }
    out.push_str("\treturn v, nil\n}\n\n");
    out
}

fn emit_field_encode(schema: &Schema, field: &Field, owner: &str) -> String {
    let path = format!("{owner}.{}", field.name);
    if field.is_optional() {
        let inner = field.ty.without_optional();
        return format!(
            "\tif {path} != nil {{\n\t\tw.writeBool(true)\n{}\t}} else {{\n\t\tw.writeBool(false)\n\t}}\n",
            indent(&encode_expr(schema, &inner, &format!("(*{path})")), 2)
        );
    }
    encode_expr(schema, &field.ty, &path)
}

fn indent(text: &str, tabs: usize) -> String {
    let pad = "\t".repeat(tabs);
    text.lines().map(|l| format!("{pad}{l}\n")).collect()
}

fn encode_expr(schema: &Schema, ty: &TypeRef, path: &str) -> String {
    match ty {
        TypeRef::Primitive { kind, .. } => match kind {
            PrimitiveKind::Bool => format!("\tw.writeBool({path})\n"),
            PrimitiveKind::I8 => format!("\tw.writeI8({path})\n"),
            PrimitiveKind::I16 => format!("\tw.writeI16({path})\n"),
            PrimitiveKind::I32 => format!("\tw.writeI32({path})\n"),
            PrimitiveKind::I64 => format!("\tw.writeI64({path})\n"),
            PrimitiveKind::F32 => format!("\tw.writeF32({path})\n"),
            PrimitiveKind::F64 => format!("\tw.writeF64({path})\n"),
            PrimitiveKind::String => format!("\tif err := w.writeString({path}); err != nil {{\n\t\treturn err\n\t}}\n"),
        },
        TypeRef::Array { element, .. } => match strategy::array_strategy(schema, element) {
            Strategy::BulkCopy => {
                let size = bulk_size(element);
                format!(
                    "\tif err := w.writeLenPrefix(len({path})); err != nil {{\n\t\treturn err\n\t}}\n\traw := make([]byte, 0, len({path})*{size})\n\tfor _, item := range {path} {{\n\t\tbuf := make([]byte, {size})\n{}\t\traw = append(raw, buf...)\n\t}}\n\tw.writeBytes(raw)\n",
                    indent(&bulk_encode_element(element, "item"), 2)
                )
            }
            _ => {
                let elem_encode = encode_expr(schema, element, "item");
                format!(
                    "\tif err := w.writeLenPrefix(len({path})); err != nil {{\n\t\treturn err\n\t}}\n\tfor _, item := range {path} {{\n{}\t}}\n",
                    indent(&elem_encode, 2)
                )
            }
        },
        TypeRef::StructRef { .. } => format!(
            "\tif err := {path}.encode(w); err != nil {{\n\t\treturn err\n\t}}\n"
        ),
    }
}

fn bulk_size(element: &TypeRef) -> usize {
    let TypeRef::Primitive { kind, .. } = element else {
        unreachable!("bulk-copy precondition: fixed-size primitive element")
    };
    kind.fixed_size().expect("non-string primitive has a fixed size")
}

fn bulk_encode_element(element: &TypeRef, var: &str) -> String {
    let TypeRef::Primitive { kind, .. } = element else {
        unreachable!("bulk-copy precondition: fixed-size primitive element")
    };
    match kind {
        PrimitiveKind::I16 => format!("binary.LittleEndian.PutUint16(buf, uint16({var}))\n"),
        PrimitiveKind::I32 => format!("binary.LittleEndian.PutUint32(buf, uint32({var}))\n"),
        PrimitiveKind::I64 => format!("binary.LittleEndian.PutUint64(buf, uint64({var}))\n"),
        PrimitiveKind::F32 => format!("binary.LittleEndian.PutUint32(buf, math.Float32bits({var}))\n"),
        PrimitiveKind::F64 => format!("binary.LittleEndian.PutUint64(buf, math.Float64bits({var}))\n"),
        PrimitiveKind::I8 => format!("buf[0] = byte({var})\n"),
        _ => unreachable!("bool/string never reach bulk copy"),
    }
}

fn emit_field_decode(schema: &Schema, field: &Field, owner: &str) -> String {
    let path = format!("{owner}.{}", field.name);
    if field.is_optional() {
        let inner = field.ty.without_optional();
        return format!(
            "\t{{\n\t\tpresent, err := r.readPresence()\n\t\tif err != nil {{\n\t\t\treturn nil, err\n\t\t}}\n\t\tif present {{\n{}\t\t}}\n\t}}\n",
            indent(&decode_expr_assign(schema, &inner, &path), 3)
        );
    }
    format!(
        "\t{{\n{}\t}}\n",
        indent(&decode_expr_assign(schema, &field.ty, &path), 2)
    )
}

fn decode_expr_assign(schema: &Schema, ty: &TypeRef, path: &str) -> String {
    let (decl, expr) = decode_expr(schema, ty);
    format!("{decl}val, err := {expr}\nif err != nil {{\n\treturn nil, err\n}}\n{path} = val\n")
}

/// Returns (any prelude statements, an expression yielding the decoded
/// value).
fn decode_expr(schema: &Schema, ty: &TypeRef) -> (String, String) {
    match ty {
        TypeRef::Primitive { kind, .. } => {
            let call = match kind {
                PrimitiveKind::Bool => "r.readBool()",
                PrimitiveKind::I8 => "r.readI8()",
                PrimitiveKind::I16 => "r.readI16()",
                PrimitiveKind::I32 => "r.readI32()",
                PrimitiveKind::I64 => "r.readI64()",
                PrimitiveKind::F32 => "r.readF32()",
                PrimitiveKind::F64 => "r.readF64()",
                PrimitiveKind::String => "r.readString()",
            };
            (String::new(), call.to_string())
        }
        TypeRef::Array { element, .. } => {
            let elem_ty = go_type(element);
            let loop_body = match strategy::array_strategy(schema, element) {
                Strategy::BulkCopy => {
                    format!(
                        "count, err := r.readLenPrefix()\nif err != nil {{\n\treturn nil, err\n}}\nitems := make([]{elem_ty}, 0, count)\nfor i := 0; i < int(count); i++ {{\n\t_ = i\n\tv, err := {}\n\tif err != nil {{\n\t\treturn nil, err\n\t}}\n\titems = append(items, v)\n}}\n",
                        bulk_decode_element(element)
                    )
                }
                _ => {
                    let (prelude, call) = decode_expr(schema, element);
                    format!(
                        "count, err := r.readLenPrefix()\nif err != nil {{\n\treturn nil, err\n}}\nitems := make([]{elem_ty}, 0, count)\nfor i := 0; i < int(count); i++ {{\n\t_ = i\n{prelude}v, err := {call}\n\tif err != nil {{\n\t\treturn nil, err\n\t}}\n\titems = append(items, v)\n}}\n"
                    )
                }
            };
            (
                format!("{loop_body}"),
                "items, error(nil)".to_string(),
            )
        }
        TypeRef::StructRef { name, .. } => (String::new(), format!("decode{name}(r)")),
    }
}

fn bulk_decode_element(element: &TypeRef) -> String {
    let TypeRef::Primitive { kind, .. } = element else {
        unreachable!("bulk-copy precondition: fixed-size primitive element")
    };
    let call = match kind {
        PrimitiveKind::I8 => "r.readI8()",
        PrimitiveKind::I16 => "r.readI16()",
        PrimitiveKind::I32 => "r.readI32()",
        PrimitiveKind::I64 => "r.readI64()",
        PrimitiveKind::F32 => "r.readF32()",
        PrimitiveKind::F64 => "r.readF64()",
        _ => unreachable!("bool/string never reach bulk copy"),
    };
    call.to_string()
}

fn message_go_type(ty: &TypeRef) -> String {
    match ty {
        TypeRef::StructRef { name, .. } => name.clone(),
        TypeRef::Array { .. } => go_type(ty),
        TypeRef::Primitive { kind, .. } => go_scalar_type(*kind).to_string(),
    }
}

fn emit_message(schema: &Schema, message: &MessageDecl) -> String {
    let root_ty = message_go_type(&message.target);
    let pascal = planner::to_pascal_case(&planner::to_snake_case(&planner::root_name(&message.target)));
    let reservation = reservation_size(schema, &message.target);

    let mut out = String::new();
    out.push_str(&format!(
        "// Encode{pascal}Message encodes a {root_ty} value with no envelope.\n\
         func Encode{pascal}Message(value {root_ty}) ([]byte, error) {{\n\
         \tw := newFfireWriter({reservation})\n"
    ));
    out.push_str(&encode_message_body(schema, &message.target, "value"));
    out.push_str("\treturn w.buf, nil\n}\n\n");

    out.push_str(&format!(
        "// Decode{pascal}Message decodes a {root_ty} value leniently.\n\
         func Decode{pascal}Message(data []byte) ({root_ty}, error) {{\n\
         \tr := &ffireReader{{buf: data}}\n"
    ));
    out.push_str(&decode_message_body(schema, &message.target));
    out.push_str("\treturn value, nil\n}\n\n");

    out.push_str(&format!(
        "// Decode{pascal}MessageStrict decodes a {root_ty} value and rejects\n\
         // trailing bytes.\n\
         func Decode{pascal}MessageStrict(data []byte) ({root_ty}, error) {{\n\
         \tr := &ffireReader{{buf: data}}\n"
    ));
    out.push_str(&decode_message_body(schema, &message.target));
    out.push_str("\tif err := r.expectExhausted(); err != nil {\n\t\tvar zero ");
    out.push_str(&root_ty);
    out.push_str("\n\t\treturn zero, err\n\t}\n\treturn value, nil\n}\n\n");
    out
}

fn encode_message_body(schema: &Schema, ty: &TypeRef, var: &str) -> String {
    match ty {
        TypeRef::StructRef { .. } => format!("\tif err := {var}.encode(w); err != nil {{\n\t\treturn nil, err\n\t}}\n"),
        _ => {
            let body = encode_expr(schema, ty, var);
            body.lines().map(|l| format!("\t{l}\n")).collect::<String>().replace("return err", "return nil, err")
        }
    }
}

fn decode_message_body(schema: &Schema, ty: &TypeRef) -> String {
    match ty {
        TypeRef::StructRef { name, .. } => format!(
            "\tvalue, err := decode{name}(r)\n\tif err != nil {{\n\t\tvar zero {name}\n\t\treturn zero, err\n\t}}\n"
        ),
        _ => {
            let go_ty = go_type(ty);
            let (prelude, call) = decode_expr(schema, ty);
            format!(
                "\tvar value {go_ty}\n{prelude_indented}\tvalue, err := {call}\n\tif err != nil {{\n\t\tvar zero {go_ty}\n\t\treturn zero, err\n\t}}\n",
                prelude_indented = indent(&prelude, 1)
            )
        }
    }
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
    fn test_emit_produces_go_package() {
        let schema = device_schema();
        let emitter = GoEmitter;
        let sources = emitter.emit(&schema).unwrap();
        assert_eq!(sources.files.len(), 1);
        let text = &sources.files[0].source;
        assert!(text.starts_with("package demo"));
        assert!(text.contains("type Device struct"));
        assert!(text.contains("func EncodeDeviceMessage"));
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
        assert!(text.contains("r.readPresence()"));
        assert!(!text.contains("r.readBool()"));
    }

    #[test]
    fn test_runtime_defines_distinct_presence_error() {
        assert!(RUNTIME.contains("func (r *ffireReader) readPresence()"));
        assert!(RUNTIME.contains("invalid presence byte"));
    }
}
