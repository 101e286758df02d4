//! Encoding/decoding benchmarks for the reference codec.

use criterion::{criterion_group, criterion_main, Criterion};
use ffire_schema::{Field, MessageDecl, PrimitiveKind, Schema, StructDef, TypeDef, TypeRef};
use ffire_wire::codec::{decode_message, encode_message, Value};
use std::hint::black_box;

fn device_list_schema() -> (Schema, MessageDecl) {
    let mut schema = Schema::new("bench");
    let mut device = StructDef::new("Device");
    device.add_field(Field::new("Name", TypeRef::primitive(PrimitiveKind::String)));
    device.add_field(Field::new("Channels", TypeRef::primitive(PrimitiveKind::I32)));
    schema.add_type(TypeDef::Struct(device));
    let message = MessageDecl::new("DeviceList", TypeRef::array(TypeRef::struct_ref("Device")));
    schema.add_message(message.clone());
    (schema, message)
}

fn device_list_value(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| {
                Value::Struct(vec![
                    ("Name".to_string(), Value::Str(format!("Speaker-{i}"))),
                    ("Channels".to_string(), Value::I32(2)),
                ])
            })
            .collect(),
    )
}

fn benchmark_encode_device_list(c: &mut Criterion) {
    let (schema, message) = device_list_schema();
    let value = device_list_value(64);

    c.bench_function("encode_device_list_64", |b| {
        b.iter(|| encode_message(black_box(&schema), black_box(&message), black_box(&value)).unwrap())
    });
}

fn benchmark_decode_device_list(c: &mut Criterion) {
    let (schema, message) = device_list_schema();
    let value = device_list_value(64);
    let bytes = encode_message(&schema, &message, &value).unwrap();

    c.bench_function("decode_device_list_64", |b| {
        b.iter(|| decode_message(black_box(&schema), black_box(&message), black_box(&bytes)).unwrap())
    });
}

fn benchmark_encode_scalar_message(c: &mut Criterion) {
    let mut schema = Schema::new("bench");
    let message = MessageDecl::new("Count", TypeRef::primitive(PrimitiveKind::I32));
    schema.add_message(message.clone());

    c.bench_function("encode_scalar_i32", |b| {
        b.iter(|| encode_message(black_box(&schema), black_box(&message), black_box(&Value::I32(42))).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_encode_device_list,
    benchmark_decode_device_list,
    benchmark_encode_scalar_message,
);
criterion_main!(benches);
