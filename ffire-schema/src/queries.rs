//! Pure query predicates over schema types.
//!
//! These compose through `StructRef` by resolving the referenced struct
//! in the owning `Schema`, so callers never need to walk `StructDef`
//! fields by hand. All functions here are pure: they never mutate the
//! schema and never fail — a `StructRef` to an unknown name is treated as
//! "no further contribution" since validation's job (not this module's)
//! is to reject those schemas before anything else inspects them.

use crate::types::{PrimitiveKind, Schema, TypeRef};

/// A sentinel depth returned for a self-referential (cyclic) struct chain,
/// guaranteed to exceed any real invariant bound so callers that only
/// check `depth > 32` still reject the schema without looping forever.
const CYCLIC_DEPTH: usize = usize::MAX;

/// Returns true if `ty` transitively includes a `string` primitive.
#[must_use]
pub fn contains_string(schema: &Schema, ty: &TypeRef) -> bool {
    contains_string_visiting(schema, ty, &mut Vec::new())
}

fn contains_string_visiting(schema: &Schema, ty: &TypeRef, visiting: &mut Vec<String>) -> bool {
    match ty {
        TypeRef::Primitive { kind, .. } => matches!(kind, PrimitiveKind::String),
        TypeRef::Array { element, .. } => contains_string_visiting(schema, element, visiting),
        TypeRef::StructRef { name, .. } => {
            if visiting.contains(name) {
                return false;
            }
            let Some(def) = schema.get_type(name).and_then(|t| t.as_struct()) else {
                return false;
            };
            visiting.push(name.clone());
            let result = def
                .fields
                .iter()
                .any(|f| contains_string_visiting(schema, &f.ty, visiting));
            visiting.pop();
            result
        }
    }
}

/// Returns true if `ty` transitively includes an `f32` or `f64` primitive.
#[must_use]
pub fn contains_float(schema: &Schema, ty: &TypeRef) -> bool {
    contains_float_visiting(schema, ty, &mut Vec::new())
}

fn contains_float_visiting(schema: &Schema, ty: &TypeRef, visiting: &mut Vec<String>) -> bool {
    match ty {
        TypeRef::Primitive { kind, .. } => kind.is_float(),
        TypeRef::Array { element, .. } => contains_float_visiting(schema, element, visiting),
        TypeRef::StructRef { name, .. } => {
            if visiting.contains(name) {
                return false;
            }
            let Some(def) = schema.get_type(name).and_then(|t| t.as_struct()) else {
                return false;
            };
            visiting.push(name.clone());
            let result = def
                .fields
                .iter()
                .any(|f| contains_float_visiting(schema, &f.ty, visiting));
            visiting.pop();
            result
        }
    }
}

/// Returns true if `ty` transitively includes an array whose element is a
/// non-optional, non-string, non-bool primitive — the shape eligible for
/// bulk-copy emission.
#[must_use]
pub fn contains_primitive_array(schema: &Schema, ty: &TypeRef) -> bool {
    contains_primitive_array_visiting(schema, ty, &mut Vec::new())
}

fn contains_primitive_array_visiting(
    schema: &Schema,
    ty: &TypeRef,
    visiting: &mut Vec<String>,
) -> bool {
    match ty {
        TypeRef::Primitive { .. } => false,
        TypeRef::Array { element, .. } => {
            let is_bulk_copyable = matches!(
                element.as_ref(),
                TypeRef::Primitive { kind, optional: false }
                    if !matches!(kind, PrimitiveKind::String | PrimitiveKind::Bool)
            );
            is_bulk_copyable || contains_primitive_array_visiting(schema, element, visiting)
        }
        TypeRef::StructRef { name, .. } => {
            if visiting.contains(name) {
                return false;
            }
            let Some(def) = schema.get_type(name).and_then(|t| t.as_struct()) else {
                return false;
            };
            visiting.push(name.clone());
            let result = def
                .fields
                .iter()
                .any(|f| contains_primitive_array_visiting(schema, &f.ty, visiting));
            visiting.pop();
            result
        }
    }
}

/// Returns `Some(n)` iff `ty` encodes to a fixed byte count: all
/// primitives, non-optional, no strings, no arrays anywhere — composing
/// through structs by summing field sizes.
#[must_use]
pub fn fixed_size(schema: &Schema, ty: &TypeRef) -> Option<usize> {
    fixed_size_visiting(schema, ty, &mut Vec::new())
}

fn fixed_size_visiting(
    schema: &Schema,
    ty: &TypeRef,
    visiting: &mut Vec<String>,
) -> Option<usize> {
    match ty {
        TypeRef::Primitive {
            kind,
            optional: false,
        } => kind.fixed_size(),
        TypeRef::Primitive { optional: true, .. } => None,
        TypeRef::Array { .. } => None,
        TypeRef::StructRef {
            name,
            optional: false,
        } => {
            if visiting.contains(name) {
                return None;
            }
            let def = schema.get_type(name).and_then(|t| t.as_struct())?;
            visiting.push(name.clone());
            let mut total = Some(0usize);
            for field in &def.fields {
                let field_size = fixed_size_visiting(schema, &field.ty, visiting);
                total = match (total, field_size) {
                    (Some(acc), Some(n)) => Some(acc + n),
                    _ => None,
                };
                if total.is_none() {
                    break;
                }
            }
            visiting.pop();
            total
        }
        TypeRef::StructRef { optional: true, .. } => None,
    }
}

/// Returns the structural composition depth of `ty`: 1 for a leaf
/// primitive, `1 + max(element depth)` for an array, `1 + max(field
/// depth)` for a struct (0 fields depths to `0`). A self-referential
/// struct chain returns [`CYCLIC_DEPTH`] so callers enforcing the
/// `depth <= 32` invariant reject it without an unbounded recursion.
#[must_use]
pub fn max_depth(schema: &Schema, ty: &TypeRef) -> usize {
    max_depth_visiting(schema, ty, &mut Vec::new())
}

fn max_depth_visiting(schema: &Schema, ty: &TypeRef, visiting: &mut Vec<String>) -> usize {
    match ty {
        TypeRef::Primitive { .. } => 1,
        TypeRef::Array { element, .. } => 1 + max_depth_visiting(schema, element, visiting),
        TypeRef::StructRef { name, .. } => {
            if visiting.contains(name) {
                return CYCLIC_DEPTH;
            }
            let Some(def) = schema.get_type(name).and_then(|t| t.as_struct()) else {
                return 1;
            };
            visiting.push(name.clone());
            let deepest = def
                .fields
                .iter()
                .map(|f| max_depth_visiting(schema, &f.ty, visiting))
                .max()
                .unwrap_or(0);
            visiting.pop();
            if deepest == CYCLIC_DEPTH {
                CYCLIC_DEPTH
            } else {
                1 + deepest
            }
        }
    }
}
