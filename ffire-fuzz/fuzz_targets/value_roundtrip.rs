#![no_main]

use arbitrary::Arbitrary;
use ffire_schema::{Field, MessageDecl, PrimitiveKind, Schema, StructDef, TypeDef, TypeRef};
use ffire_wire::codec::{decode_message, encode_message, Value};
use libfuzzer_sys::fuzz_target;

/// A fixed schema — one struct covering every primitive kind, an
/// optional field, and a nested primitive array — paired with an
/// [`Arbitrary`]-derived generator that only ever produces `Value`
/// trees shaped to match it.
///
/// `encode_value` panics on a shape mismatch by contract (see its
/// doc comment), so round-tripping only arbitrary *values*, never
/// arbitrary *shapes*, is what actually exercises the encoder: any
/// input should either produce bytes that `decode_message` reads back
/// to the same value, or fail with `WireError::TooLarge` for an
/// oversized string or array. Neither path should ever panic.
fn sample_schema() -> (Schema, MessageDecl) {
    let mut schema = Schema::new("fuzz");
    let mut sample = StructDef::new("Sample");
    sample.add_field(Field::new("Flag", TypeRef::primitive(PrimitiveKind::Bool)));
    sample.add_field(Field::new("Small", TypeRef::primitive(PrimitiveKind::I8)));
    sample.add_field(Field::new("Medium", TypeRef::primitive(PrimitiveKind::I16)));
    sample.add_field(Field::new("Count", TypeRef::primitive(PrimitiveKind::I32)));
    sample.add_field(Field::new("Id", TypeRef::primitive(PrimitiveKind::I64)));
    sample.add_field(Field::new("Ratio", TypeRef::primitive(PrimitiveKind::F32)));
    sample.add_field(Field::new("Precise", TypeRef::primitive(PrimitiveKind::F64)));
    sample.add_field(Field::new("Name", TypeRef::primitive(PrimitiveKind::String)));
    sample.add_field(Field::new(
        "Nick",
        TypeRef::optional_primitive(PrimitiveKind::String),
    ));
    sample.add_field(Field::new(
        "Samples",
        TypeRef::array(TypeRef::primitive(PrimitiveKind::I32)),
    ));
    schema.add_type(TypeDef::Struct(sample));

    let message = MessageDecl::new("SampleList", TypeRef::array(TypeRef::struct_ref("Sample")));
    schema.add_message(message.clone());
    (schema, message)
}

#[derive(Debug, Arbitrary)]
struct SampleSpec {
    flag: bool,
    small: i8,
    medium: i16,
    count: i32,
    id: i64,
    ratio: f32,
    precise: f64,
    name: String,
    nick: Option<String>,
    samples: Vec<i32>,
}

#[derive(Debug, Arbitrary)]
struct SampleListSpec {
    items: Vec<SampleSpec>,
}

fn to_value(spec: &SampleListSpec) -> Value {
    // Caps mirror the length limits `schema_generate`'s field count cap
    // serves: shape diversity over raw corpus size.
    let items = spec
        .items
        .iter()
        .take(16)
        .map(|s| {
            Value::Struct(vec![
                ("Flag".to_string(), Value::Bool(s.flag)),
                ("Small".to_string(), Value::I8(s.small)),
                ("Medium".to_string(), Value::I16(s.medium)),
                ("Count".to_string(), Value::I32(s.count)),
                ("Id".to_string(), Value::I64(s.id)),
                ("Ratio".to_string(), Value::F32(s.ratio)),
                ("Precise".to_string(), Value::F64(s.precise)),
                ("Name".to_string(), Value::Str(s.name.chars().take(64).collect())),
                (
                    "Nick".to_string(),
                    Value::Optional(
                        s.nick
                            .as_ref()
                            .map(|n| Box::new(Value::Str(n.chars().take(64).collect()))),
                    ),
                ),
                (
                    "Samples".to_string(),
                    Value::Array(s.samples.iter().take(64).map(|v| Value::I32(*v)).collect()),
                ),
            ])
        })
        .collect();
    Value::Array(items)
}

/// Structural equality that ignores struct field order: `decode_message`
/// returns fields in canonical wire order, while `value` above is built
/// in declaration order, and the two are only required to agree on
/// content, never on vector position.
fn values_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equivalent(x, y))
        }
        (Value::Struct(a), Value::Struct(b)) => {
            a.len() == b.len()
                && a.iter().all(|(name, av)| {
                    b.iter().any(|(bname, bv)| bname == name && values_equivalent(av, bv))
                })
        }
        (Value::Optional(a), Value::Optional(b)) => match (a, b) {
            (Some(a), Some(b)) => values_equivalent(a, b),
            (None, None) => true,
            _ => false,
        },
        // Bitwise comparison: NaN round-trips bit-for-bit through the
        // wire format, but NaN != NaN under IEEE 754 equality.
        (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
        (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
        _ => a == b,
    }
}

fuzz_target!(|spec: SampleListSpec| {
    let (schema, message) = sample_schema();
    let value = to_value(&spec);
    match encode_message(&schema, &message, &value) {
        Ok(bytes) => {
            let decoded = decode_message(&schema, &message, &bytes).expect("round-trip decode");
            assert!(
                values_equivalent(&decoded, &value),
                "decoded value diverged from encoded value"
            );
        }
        Err(err) => {
            // Only an oversized string/array length prefix is expected
            // to fail encoding; every other error variant means the
            // encoder rejected a shape it should have accepted.
            assert!(
                matches!(err, ffire_wire::error::WireError::TooLarge { .. }),
                "unexpected encode error: {err:?}"
            );
        }
    }
});
