#![no_main]

use arbitrary::Arbitrary;
use ffire_codegen::{generate, TargetLanguage};
use ffire_schema::{Field, MessageDecl, PrimitiveKind, Schema, StructDef, TypeDef, TypeRef};
use libfuzzer_sys::fuzz_target;

/// A bounded, structured stand-in for a schema author's input: arbitrary
/// field counts, kinds, and optionality, assembled into one struct plus
/// an array-of-that-struct message.
///
/// `validate` is expected to reject malformed shapes (duplicate names,
/// empty identifiers) cleanly; `generate` must never panic on whatever
/// `validate` lets through, for any of the four targets.
#[derive(Debug, Arbitrary)]
struct SchemaSpec {
    struct_name: String,
    fields: Vec<FieldSpec>,
}

#[derive(Debug, Arbitrary)]
struct FieldSpec {
    name: String,
    kind: FieldKind,
    optional: bool,
}

#[derive(Debug, Arbitrary)]
enum FieldKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
}

fn primitive_kind(kind: &FieldKind) -> PrimitiveKind {
    match kind {
        FieldKind::Bool => PrimitiveKind::Bool,
        FieldKind::I8 => PrimitiveKind::I8,
        FieldKind::I16 => PrimitiveKind::I16,
        FieldKind::I32 => PrimitiveKind::I32,
        FieldKind::I64 => PrimitiveKind::I64,
        FieldKind::F32 => PrimitiveKind::F32,
        FieldKind::F64 => PrimitiveKind::F64,
        FieldKind::String => PrimitiveKind::String,
    }
}

fn build_schema(spec: &SchemaSpec) -> Schema {
    let mut schema = Schema::new("fuzz");
    let mut def = StructDef::new(spec.struct_name.clone());
    // Cap at 32 fields: the point is shape diversity, not raw size.
    for field in spec.fields.iter().take(32) {
        let kind = primitive_kind(&field.kind);
        let ty = if field.optional {
            TypeRef::optional_primitive(kind)
        } else {
            TypeRef::primitive(kind)
        };
        def.add_field(Field::new(field.name.clone(), ty));
    }
    schema.add_type(TypeDef::Struct(def));
    schema.add_message(MessageDecl::new(
        "Root",
        TypeRef::array(TypeRef::struct_ref(spec.struct_name.clone())),
    ));
    schema
}

fuzz_target!(|spec: SchemaSpec| {
    let schema = build_schema(&spec);
    for target in [
        TargetLanguage::Rust,
        TargetLanguage::C,
        TargetLanguage::Go,
        TargetLanguage::Python,
    ] {
        // Either a schema error (malformed input was correctly rejected)
        // or generated source; never a panic.
        let _ = generate(&schema, target);
    }
});
