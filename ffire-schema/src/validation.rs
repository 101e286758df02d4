//! Schema validation.
//!
//! Enforces invariants I1-I5: bounded nesting depth, printable-ASCII
//! identifiers, well-formed message targets, and at least one message.
//! Short-circuits on the first failure — this is not a multi-error
//! collector.

use crate::error::SchemaError;
use crate::path::TypePath;
use crate::queries;
use crate::types::{Schema, StructDef, TypeDef, TypeRef};

/// Maximum structural nesting depth permitted by invariant I1.
pub const MAX_DEPTH: usize = 32;

/// Validates a parsed schema for correctness.
///
/// # Errors
/// Returns [`SchemaError`] describing the first violation found: an
/// unknown type reference, a duplicate struct/field/message name, a
/// struct-reference cycle, a type exceeding [`MAX_DEPTH`], zero messages,
/// or an empty identifier.
pub fn validate(schema: &Schema) -> Result<(), SchemaError> {
    validate_identifiers(schema)?;
    validate_types(schema)?;
    validate_messages(schema)?;
    Ok(())
}

/// An identifier satisfies I2 if every character is printable ASCII
/// (`0x20`..=`0x7E`); case is preserved, not normalized.
fn is_printable_ascii(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii() && !c.is_ascii_control())
}

fn check_identifier(name: &str, path: impl Into<String>) -> Result<(), SchemaError> {
    if name.is_empty() {
        return Err(SchemaError::EmptyIdentifier { path: path.into() });
    }
    if !is_printable_ascii(name) {
        return Err(SchemaError::InvalidIdentifier {
            name: name.to_string(),
            path: path.into(),
        });
    }
    Ok(())
}

fn validate_identifiers(schema: &Schema) -> Result<(), SchemaError> {
    check_identifier(&schema.package, "<package>")?;
    for type_def in &schema.types {
        let TypeDef::Struct(s) = type_def;
        check_identifier(&s.name, "<struct>")?;
        for field in &s.fields {
            check_identifier(&field.name, TypePath::new(&s.name).to_string())?;
        }
    }
    for message in &schema.messages {
        check_identifier(&message.name, "<message>")?;
    }
    Ok(())
}

fn validate_types(schema: &Schema) -> Result<(), SchemaError> {
    let mut seen_struct_names = std::collections::HashSet::new();
    for type_def in &schema.types {
        let TypeDef::Struct(s) = type_def;
        if !seen_struct_names.insert(s.name.as_str()) {
            return Err(SchemaError::DuplicateType { name: s.name.clone() });
        }
        validate_struct_fields(schema, s)?;
        validate_no_cycle(schema, &s.name)?;
        let depth = queries::max_depth(schema, &TypeRef::struct_ref(&s.name));
        if depth > MAX_DEPTH {
            return Err(SchemaError::DepthExceeded {
                path: s.name.clone(),
                max: MAX_DEPTH,
                actual: depth,
            });
        }
    }
    Ok(())
}

fn validate_struct_fields(schema: &Schema, s: &StructDef) -> Result<(), SchemaError> {
    let mut seen_fields = std::collections::HashSet::new();
    for field in &s.fields {
        if !seen_fields.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                struct_name: s.name.clone(),
                field: field.name.clone(),
            });
        }
        validate_type_ref(schema, &field.ty, &TypePath::new(&s.name).field(&field.name))?;
    }
    Ok(())
}

fn validate_type_ref(schema: &Schema, ty: &TypeRef, path: &TypePath) -> Result<(), SchemaError> {
    match ty {
        TypeRef::Primitive { .. } => Ok(()),
        TypeRef::Array { element, .. } => validate_type_ref(schema, element, &path.field("[]")),
        TypeRef::StructRef { name, .. } => {
            if !schema.has_type(name) {
                return Err(SchemaError::UnknownType {
                    type_name: name.clone(),
                    path: path.to_string(),
                });
            }
            Ok(())
        }
    }
}

/// Walks the struct-reference graph from `start` looking for a cycle.
///
/// A cycle is only possible through `StructRef` edges (arrays and
/// primitives can't reintroduce a struct), so this only needs to track
/// the chain of struct names currently being visited.
fn validate_no_cycle(schema: &Schema, start: &str) -> Result<(), SchemaError> {
    let mut chain = vec![start.to_string()];
    walk_struct_refs(schema, start, &mut chain)
}

fn walk_struct_refs(schema: &Schema, name: &str, chain: &mut Vec<String>) -> Result<(), SchemaError> {
    let Some(def) = schema.get_type(name).and_then(TypeDef::as_struct) else {
        return Ok(());
    };
    for field in &def.fields {
        if let Some(referenced) = struct_ref_name(&field.ty) {
            if chain.iter().any(|n| n == referenced) {
                chain.push(referenced.to_string());
                return Err(SchemaError::CyclicReference {
                    path: chain.join(" -> "),
                });
            }
            chain.push(referenced.to_string());
            walk_struct_refs(schema, referenced, chain)?;
            chain.pop();
        }
    }
    Ok(())
}

/// Returns the struct name referenced by `ty`, looking through any number
/// of array wrappers (an array of structs can still cycle back).
fn struct_ref_name(ty: &TypeRef) -> Option<&str> {
    match ty {
        TypeRef::StructRef { name, .. } => Some(name),
        TypeRef::Array { element, .. } => struct_ref_name(element),
        TypeRef::Primitive { .. } => None,
    }
}

fn validate_messages(schema: &Schema) -> Result<(), SchemaError> {
    if schema.messages.is_empty() {
        return Err(SchemaError::NoMessages);
    }
    let mut seen_names = std::collections::HashSet::new();
    for message in &schema.messages {
        if !seen_names.insert(message.name.as_str()) {
            return Err(SchemaError::DuplicateMessage {
                name: message.name.clone(),
            });
        }
        validate_type_ref(schema, &message.target, &TypePath::new(&message.name))?;
        let depth = queries::max_depth(schema, &message.target);
        if depth > MAX_DEPTH {
            return Err(SchemaError::DepthExceeded {
                path: message.name.clone(),
                max: MAX_DEPTH,
                actual: depth,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, MessageDecl, PrimitiveKind, StructDef};

    #[test]
    fn test_valid_schema() {
        let mut schema = Schema::new("test");
        schema.add_message(MessageDecl::new("Count", TypeRef::primitive(PrimitiveKind::I32)));
        assert!(validate(&schema).is_ok());
    }

    #[test]
    fn test_no_messages() {
        let schema = Schema::new("test");
        assert!(matches!(validate(&schema), Err(SchemaError::NoMessages)));
    }

    #[test]
    fn test_empty_package() {
        let mut schema = Schema::new("");
        schema.add_message(MessageDecl::new("Count", TypeRef::primitive(PrimitiveKind::I32)));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::EmptyIdentifier { .. })
        ));
    }

    #[test]
    fn test_non_ascii_package_name() {
        let mut schema = Schema::new("caf\u{e9}");
        schema.add_message(MessageDecl::new("Count", TypeRef::primitive(PrimitiveKind::I32)));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_non_ascii_field_name() {
        let mut schema = Schema::new("test");
        let mut s = StructDef::new("Device");
        s.fields.push(Field::new("na\u{e4}me", TypeRef::primitive(PrimitiveKind::I32)));
        schema.add_type(TypeDef::Struct(s));
        schema.add_message(MessageDecl::new("M", TypeRef::struct_ref("Device")));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_control_character_in_message_name() {
        let mut schema = Schema::new("test");
        schema.add_message(MessageDecl::new("M\u{7}", TypeRef::primitive(PrimitiveKind::I32)));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_unknown_type_reference() {
        let mut schema = Schema::new("test");
        schema.add_message(MessageDecl::new("M", TypeRef::struct_ref("Missing")));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_duplicate_struct_name() {
        let mut schema = Schema::new("test");
        schema.types.push(TypeDef::Struct(StructDef::new("Device")));
        schema.types.push(TypeDef::Struct(StructDef::new("Device")));
        schema.build_type_map();
        schema.add_message(MessageDecl::new("M", TypeRef::struct_ref("Device")));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::DuplicateType { .. })
        ));
    }

    #[test]
    fn test_duplicate_field_name() {
        let mut schema = Schema::new("test");
        let mut s = StructDef::new("Device");
        s.fields.push(Field::new("Name", TypeRef::primitive(PrimitiveKind::String)));
        s.fields.push(Field::new("Name", TypeRef::primitive(PrimitiveKind::I32)));
        schema.add_type(TypeDef::Struct(s));
        schema.add_message(MessageDecl::new("M", TypeRef::struct_ref("Device")));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_duplicate_message_name() {
        let mut schema = Schema::new("test");
        schema.add_message(MessageDecl::new("M", TypeRef::primitive(PrimitiveKind::I32)));
        schema.add_message(MessageDecl::new("M", TypeRef::primitive(PrimitiveKind::I64)));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::DuplicateMessage { .. })
        ));
    }

    #[test]
    fn test_cyclic_reference() {
        let mut schema = Schema::new("test");
        let mut a = StructDef::new("A");
        a.add_field(Field::new("b", TypeRef::struct_ref("B")));
        let mut b = StructDef::new("B");
        b.add_field(Field::new("a", TypeRef::struct_ref("A")));
        schema.add_type(TypeDef::Struct(a));
        schema.add_type(TypeDef::Struct(b));
        schema.add_message(MessageDecl::new("M", TypeRef::struct_ref("A")));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::CyclicReference { .. })
        ));
    }

    #[test]
    fn test_cyclic_reference_through_array() {
        let mut schema = Schema::new("test");
        let mut a = StructDef::new("A");
        a.add_field(Field::new("children", TypeRef::array(TypeRef::struct_ref("A"))));
        schema.add_type(TypeDef::Struct(a));
        schema.add_message(MessageDecl::new("M", TypeRef::struct_ref("A")));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::CyclicReference { .. })
        ));
    }

    #[test]
    fn test_depth_exceeded() {
        let mut schema = Schema::new("test");
        let mut ty = TypeRef::primitive(PrimitiveKind::I32);
        for _ in 0..40 {
            ty = TypeRef::array(ty);
        }
        schema.add_message(MessageDecl::new("Deep", ty));
        assert!(matches!(
            validate(&schema),
            Err(SchemaError::DepthExceeded { .. })
        ));
    }
}
