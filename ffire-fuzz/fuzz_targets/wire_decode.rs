#![no_main]

use ffire_schema::{Field, MessageDecl, PrimitiveKind, Schema, StructDef, TypeDef, TypeRef};
use ffire_wire::codec::{decode_message, decode_message_strict};
use libfuzzer_sys::fuzz_target;

/// A fixed, representative schema (one struct with every primitive
/// kind, an optional field, and a nested array) exercised against
/// arbitrary input bytes.
///
/// Only `decode_message`/`decode_message_strict`'s contract is under
/// test here: every input either decodes to a `Value` or returns a
/// `WireError`. A panic on any byte sequence is the bug this target
/// hunts for.
fn device_list_schema() -> (Schema, MessageDecl) {
    let mut schema = Schema::new("fuzz");
    let mut device = StructDef::new("Device");
    device.add_field(Field::new("Id", TypeRef::primitive(PrimitiveKind::I64)));
    device.add_field(Field::new("Age", TypeRef::primitive(PrimitiveKind::I8)));
    device.add_field(Field::new("Name", TypeRef::primitive(PrimitiveKind::String)));
    device.add_field(Field::new(
        "Nick",
        TypeRef::optional_primitive(PrimitiveKind::String),
    ));
    device.add_field(Field::new(
        "Samples",
        TypeRef::array(TypeRef::primitive(PrimitiveKind::I32)),
    ));
    schema.add_type(TypeDef::Struct(device));

    let message = MessageDecl::new("DeviceList", TypeRef::array(TypeRef::struct_ref("Device")));
    schema.add_message(message.clone());
    (schema, message)
}

fuzz_target!(|data: &[u8]| {
    let (schema, message) = device_list_schema();
    let _ = decode_message(&schema, &message, data);
    let _ = decode_message_strict(&schema, &message, data);
});
