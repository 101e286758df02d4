//! Top-level `generate` entry point and the [`Generator`] facade that
//! validates a schema once and emits multiple targets from it.

use crate::emit::{c::CEmitter, go::GoEmitter, python::PythonEmitter, rust::RustEmitter};
use crate::error::GenError;
use crate::target::{Emitter, GeneratedSources, TargetLanguage};
use ffire_schema::{validate, Schema};

fn emitter_for(target: TargetLanguage) -> Box<dyn Emitter> {
    match target {
        TargetLanguage::Rust => Box::new(RustEmitter),
        TargetLanguage::C => Box::new(CEmitter),
        TargetLanguage::Go => Box::new(GoEmitter),
        TargetLanguage::Python => Box::new(PythonEmitter),
    }
}

/// Generates target-language codec source for `schema`.
///
/// Validates the schema first, so schema errors surface before any
/// emission work begins, then dispatches to `target`'s emitter.
///
/// # Errors
/// Returns [`GenError::Schema`] if `schema` fails validation, or
/// [`GenError::EmitFailure`] if the emitter itself fails.
pub fn generate(schema: &Schema, target: TargetLanguage) -> Result<GeneratedSources, GenError> {
    validate(schema)?;
    emitter_for(target).emit(schema)
}

/// Validates a schema once and emits one or more targets from it
/// without re-validating on each call.
pub struct Generator<'a> {
    schema: &'a Schema,
}

impl<'a> Generator<'a> {
    /// Validates `schema` and returns a `Generator` that can emit any
    /// number of targets from it without re-validating each time.
    ///
    /// # Errors
    /// Returns [`GenError::Schema`] if `schema` fails validation.
    pub fn new(schema: &'a Schema) -> Result<Self, GenError> {
        validate(schema)?;
        Ok(Self { schema })
    }

    /// Emits source for `target`.
    ///
    /// # Errors
    /// Returns [`GenError::EmitFailure`] if the emitter fails.
    pub fn generate(&self, target: TargetLanguage) -> Result<GeneratedSources, GenError> {
        emitter_for(target).emit(self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffire_schema::{Field, MessageDecl, PrimitiveKind, StructDef, TypeDef, TypeRef};

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
    fn test_generate_rejects_invalid_schema() {
        let schema = Schema::new("empty"); // no messages
        let err = generate(&schema, TargetLanguage::Rust).unwrap_err();
        assert!(matches!(err, GenError::Schema(_)));
    }

    #[test]
    fn test_generate_dispatches_to_every_target() {
        let schema = device_schema();
        for target in [
            TargetLanguage::Rust,
            TargetLanguage::C,
            TargetLanguage::Go,
            TargetLanguage::Python,
        ] {
            let sources = generate(&schema, target).unwrap();
            assert!(!sources.files.is_empty());
        }
    }

    #[test]
    fn test_generator_reuses_validation_across_targets() {
        let schema = device_schema();
        let generator = Generator::new(&schema).unwrap();
        let rust = generator.generate(TargetLanguage::Rust).unwrap();
        let python = generator.generate(TargetLanguage::Python).unwrap();
        assert!(!rust.files.is_empty());
        assert!(!python.files.is_empty());
    }

    #[test]
    fn test_generator_new_rejects_invalid_schema() {
        let schema = Schema::new("empty");
        assert!(Generator::new(&schema).is_err());
    }
}
