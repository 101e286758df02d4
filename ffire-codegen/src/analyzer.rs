//! Per-type analysis shared by the planner and every target emitter.
//!
//! Flattens the AST into a lookup-by-name map of derived facts, sourced
//! from [`ffire_schema::queries`]: a schema has no compile-time-fixed
//! byte layout, so every fact here is computed, not read off a header.

use ffire_schema::{queries, PrimitiveKind, Schema, TypeDef, TypeRef};
use std::collections::HashMap;

/// Derived facts about one encodable type, used by the planner to pick
/// an emission strategy and by emitters to size output buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// `Some(n)` if every instance of this type encodes to exactly `n`
    /// bytes regardless of value; `None` if size varies (strings, arrays,
    /// or anything optional).
    pub fixed_size: Option<usize>,
    /// Whether this type contains a string anywhere in its structure.
    pub contains_string: bool,
    /// Whether this type contains an `f32`/`f64` anywhere in its structure.
    pub contains_float: bool,
    /// Whether this type contains an array of non-optional, non-string,
    /// non-bool primitives anywhere in its structure (the shape [`E1`][e1]
    /// bulk-copy applies to).
    ///
    /// [e1]: crate::strategy::Strategy::BulkCopy
    pub contains_primitive_array: bool,
    /// Structural nesting depth (`usize::MAX` if the schema is cyclic;
    /// `validate` rejects cyclic schemas before this is ever observed by
    /// an emitter).
    pub max_depth: usize,
    /// Estimated output buffer size in bytes. A hint only — wire output
    /// never depends on it.
    pub reservation_size: usize,
}

impl TypeInfo {
    fn compute(schema: &Schema, ty: &TypeRef) -> Self {
        Self {
            fixed_size: queries::fixed_size(schema, ty),
            contains_string: queries::contains_string(schema, ty),
            contains_float: queries::contains_float(schema, ty),
            contains_primitive_array: queries::contains_primitive_array(schema, ty),
            max_depth: queries::max_depth(schema, ty),
            reservation_size: reservation_size(schema, ty),
        }
    }
}

/// A lookup table of [`TypeInfo`] for every named struct type in a schema,
/// computed once and shared read-only by the planner and emitters.
#[derive(Debug, Clone, Default)]
pub struct TypeInfoMap {
    structs: HashMap<String, TypeInfo>,
}

impl TypeInfoMap {
    /// Computes [`TypeInfo`] for every struct type declared in `schema`.
    #[must_use]
    pub fn build(schema: &Schema) -> Self {
        let mut structs = HashMap::new();
        for ty in &schema.types {
            let TypeDef::Struct(def) = ty;
            let ty_ref = TypeRef::struct_ref(def.name.clone());
            structs.insert(def.name.clone(), TypeInfo::compute(schema, &ty_ref));
        }
        Self { structs }
    }

    /// Looks up the cached [`TypeInfo`] for a named struct type.
    #[must_use]
    pub fn get(&self, struct_name: &str) -> Option<&TypeInfo> {
        self.structs.get(struct_name)
    }

    /// Computes [`TypeInfo`] for an arbitrary `TypeRef`, serving cached
    /// facts for a bare `StructRef` and computing fresh ones otherwise
    /// (primitives, arrays, and message root types that aren't themselves
    /// a named struct).
    #[must_use]
    pub fn info_for(&self, schema: &Schema, ty: &TypeRef) -> TypeInfo {
        if let TypeRef::StructRef { name, optional: false } = ty {
            if let Some(info) = self.structs.get(name) {
                return info.clone();
            }
        }
        TypeInfo::compute(schema, ty)
    }
}

/// Estimated buffer reservation for `ty`, per the formula: sum of fixed
/// field sizes, plus 16 bytes per string field, plus 2 bytes per length
/// prefix, plus 1 byte per optional flag; arrays contribute
/// `2 + 5 × element estimate`. Never below 1024 bytes.
#[must_use]
pub fn reservation_size(schema: &Schema, ty: &TypeRef) -> usize {
    estimate(schema, ty).max(1024)
}

fn estimate(schema: &Schema, ty: &TypeRef) -> usize {
    let base = match ty {
        TypeRef::Primitive { kind: PrimitiveKind::String, .. } => 16 + 2,
        TypeRef::Primitive { kind, .. } => kind.fixed_size().unwrap_or(0),
        TypeRef::Array { element, .. } => 2 + 5 * estimate(schema, element),
        TypeRef::StructRef { name, .. } => schema
            .get_type(name)
            .map(|TypeDef::Struct(def)| def.fields.iter().map(|f| estimate(schema, &f.ty)).sum())
            .unwrap_or(0),
    };
    base + if ty.is_optional() { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffire_schema::{Field, StructDef};

    fn device_schema() -> Schema {
        let mut schema = Schema::new("pkg");
        let mut device = StructDef::new("Device");
        device.add_field(Field::new("Name", TypeRef::primitive(PrimitiveKind::String)));
        device.add_field(Field::new("Channels", TypeRef::primitive(PrimitiveKind::I32)));
        schema.add_type(TypeDef::Struct(device));
        schema
    }

    #[test]
    fn test_fixed_primitive_has_fixed_size() {
        let schema = Schema::new("pkg");
        let ty = TypeRef::primitive(PrimitiveKind::I64);
        let info = TypeInfo::compute(&schema, &ty);
        assert_eq!(info.fixed_size, Some(8));
        assert_eq!(info.reservation_size, 1024);
    }

    #[test]
    fn test_struct_with_string_is_not_fixed_size() {
        let schema = device_schema();
        let map = TypeInfoMap::build(&schema);
        let info = map.get("Device").unwrap();
        assert_eq!(info.fixed_size, None);
        assert!(info.contains_string);
        assert!(!info.contains_float);
    }

    #[test]
    fn test_reservation_size_minimum() {
        let schema = Schema::new("pkg");
        let ty = TypeRef::primitive(PrimitiveKind::Bool);
        assert_eq!(reservation_size(&schema, &ty), 1024);
    }

    #[test]
    fn test_reservation_size_array_formula() {
        let schema = Schema::new("pkg");
        let ty = TypeRef::array(TypeRef::primitive(PrimitiveKind::I64));
        // 2 + 5 * 8 = 42, below the 1024 floor.
        assert_eq!(estimate(&schema, &ty), 42);
        assert_eq!(reservation_size(&schema, &ty), 1024);
    }

    #[test]
    fn test_contains_primitive_array_detected() {
        let mut schema = Schema::new("pkg");
        let mut s = StructDef::new("Samples");
        s.add_field(Field::new("Values", TypeRef::array(TypeRef::primitive(PrimitiveKind::I32))));
        schema.add_type(TypeDef::Struct(s));
        let map = TypeInfoMap::build(&schema);
        assert!(map.get("Samples").unwrap().contains_primitive_array);
    }

    #[test]
    fn test_info_for_struct_ref_uses_cache() {
        let schema = device_schema();
        let map = TypeInfoMap::build(&schema);
        let info = map.info_for(&schema, &TypeRef::struct_ref("Device"));
        assert_eq!(info, map.get("Device").unwrap().clone());
    }
}
