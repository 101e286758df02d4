//! Emission-strategy selection (E1-E4).
//!
//! Centralizes the "which approach does this array/struct shape get"
//! decision so every emitter shares one answer instead of re-deriving
//! it. All four strategies must produce identical bytes on the wire —
//! they are optimizations of the same contract, never semantic
//! variants.

use ffire_schema::{PrimitiveKind, Schema, TypeDef, TypeRef};

/// The emission strategy chosen for one array or struct shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// E1: a single bulk memory copy of `count * sizeof(element)` bytes,
    /// after the length prefix. Only for arrays of fixed-size primitives
    /// other than `bool` (whose 0x00/0x01 wire encoding isn't guaranteed
    /// to match its in-memory representation on every target platform).
    BulkCopy,
    /// E2: two passes over the elements — the first computes the exact
    /// byte count, then a single allocation is made, then a second pass
    /// fills it at known offsets. For arrays of strings and arrays of
    /// "simple" structs (primitives/strings only; no nested arrays,
    /// structs, or optionals).
    TwoPassSizing,
    /// E3: a struct whose entire field set is primitive (no strings,
    /// arrays, nested structs, or optionals) is read/written as a single
    /// fixed-size block.
    InlineFixedBlock,
    /// E4: the general case — element-by-element encode/decode through
    /// the shared per-type helpers. Always correct; the fallback every
    /// other strategy reduces to when its precondition doesn't hold.
    General,
}

/// Picks the strategy for an array whose element type is `element`.
#[must_use]
pub fn array_strategy(schema: &Schema, element: &TypeRef) -> Strategy {
    if is_bulk_copyable_primitive(element) {
        Strategy::BulkCopy
    } else if is_two_pass_eligible(schema, element) {
        Strategy::TwoPassSizing
    } else {
        Strategy::General
    }
}

/// Picks the strategy for a named struct's own field layout.
#[must_use]
pub fn struct_strategy(schema: &Schema, struct_name: &str) -> Strategy {
    if is_all_primitive_struct(schema, struct_name) {
        Strategy::InlineFixedBlock
    } else {
        Strategy::General
    }
}

fn is_bulk_copyable_primitive(ty: &TypeRef) -> bool {
    matches!(
        ty,
        TypeRef::Primitive { kind, optional: false }
            if !matches!(kind, PrimitiveKind::Bool | PrimitiveKind::String)
    )
}

fn is_two_pass_eligible(schema: &Schema, ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Primitive { kind: PrimitiveKind::String, optional: false } => true,
        TypeRef::StructRef { name, optional: false } => is_simple_struct(schema, name),
        _ => false,
    }
}

/// A "simple" struct per E2: every field is a non-optional primitive or
/// string — no nested arrays, structs, or optionals of its own. Exposed
/// for emitters that need to know whether to generate a struct's
/// `encoded_len`-style helper for two-pass array sizing.
#[must_use]
pub fn is_simple_struct(schema: &Schema, name: &str) -> bool {
    let Some(TypeDef::Struct(def)) = schema.get_type(name) else {
        return false;
    };
    def.fields
        .iter()
        .all(|f| !f.is_optional() && matches!(f.ty, TypeRef::Primitive { .. }))
}

fn is_all_primitive_struct(schema: &Schema, name: &str) -> bool {
    let Some(TypeDef::Struct(def)) = schema.get_type(name) else {
        return false;
    };
    def.fields
        .iter()
        .all(|f| matches!(f.ty, TypeRef::Primitive { optional: false, .. }))
}
