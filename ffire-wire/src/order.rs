//! The canonical struct field order.
//!
//! Both the reference codec ([`crate::codec`]) and the code generator's
//! planner call this single comparator, so wire layout can never drift
//! between the two: a field's position on the wire depends only on its
//! type shape and name, never on authoring order or which backend is
//! emitting it.

use ffire_schema::{Field, PrimitiveKind, TypeRef};
use std::cmp::Ordering;

/// The six ordering buckets from the canonical field order table.
/// Lower buckets sort first; within a bucket, fields compare by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    Fixed8,
    Fixed4,
    Fixed2,
    Fixed1,
    Variable,
    Optional,
}

fn bucket_of(ty: &TypeRef) -> Bucket {
    if ty.is_optional() {
        return Bucket::Optional;
    }
    match ty {
        TypeRef::Primitive { kind, .. } => match kind {
            PrimitiveKind::I64 | PrimitiveKind::F64 => Bucket::Fixed8,
            PrimitiveKind::I32 | PrimitiveKind::F32 => Bucket::Fixed4,
            PrimitiveKind::I16 => Bucket::Fixed2,
            PrimitiveKind::Bool | PrimitiveKind::I8 => Bucket::Fixed1,
            PrimitiveKind::String => Bucket::Variable,
        },
        TypeRef::Array { .. } | TypeRef::StructRef { .. } => Bucket::Variable,
    }
}

/// The sort key a field occupies in canonical wire order.
fn sort_key(field: &Field) -> (Bucket, &str) {
    (bucket_of(&field.ty), field.name.as_str())
}

/// Compares two fields by canonical wire order.
#[must_use]
pub fn compare_fields(a: &Field, b: &Field) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Returns the indices of `fields` in canonical wire order.
///
/// Stable: fields already comparing equal (same bucket and name — never
/// true for sibling fields in a valid schema, since names are unique
/// within a struct) retain their relative authored order.
#[must_use]
pub fn canonical_order(fields: &[Field]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..fields.len()).collect();
    indices.sort_by(|&i, &j| compare_fields(&fields[i], &fields[j]));
    indices
}

/// Returns `fields` reordered into canonical wire order.
#[must_use]
pub fn reorder_fields(fields: &[Field]) -> Vec<&Field> {
    canonical_order(fields).into_iter().map(|i| &fields[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffire_schema::TypeRef;

    fn field(name: &str, ty: TypeRef) -> Field {
        Field::new(name, ty)
    }

    #[test]
    fn test_canonical_order_matches_spec_example() {
        // struct P { Name: string; Age: i32; Id: i64; Nick: *string }
        // expected wire order: Id, Age, Name, Nick
        let fields = vec![
            field("Name", TypeRef::primitive(PrimitiveKind::String)),
            field("Age", TypeRef::primitive(PrimitiveKind::I32)),
            field("Id", TypeRef::primitive(PrimitiveKind::I64)),
            field("Nick", TypeRef::optional_primitive(PrimitiveKind::String)),
        ];
        let ordered = reorder_fields(&fields);
        let names: Vec<&str> = ordered.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Age", "Name", "Nick"]);
    }

    #[test]
    fn test_lexicographic_tie_break_within_bucket() {
        let fields = vec![
            field("Zebra", TypeRef::primitive(PrimitiveKind::I32)),
            field("Apple", TypeRef::primitive(PrimitiveKind::I32)),
        ];
        let ordered = reorder_fields(&fields);
        let names: Vec<&str> = ordered.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Zebra"]);
    }

    #[test]
    fn test_struct_and_array_fields_are_variable_bucket() {
        let fields = vec![
            field("Flag", TypeRef::primitive(PrimitiveKind::Bool)),
            field("Items", TypeRef::array(TypeRef::primitive(PrimitiveKind::I32))),
            field("Nested", TypeRef::struct_ref("Inner")),
        ];
        let ordered = reorder_fields(&fields);
        let names: Vec<&str> = ordered.iter().map(|f| f.name.as_str()).collect();
        // Bool is Fixed1 (bucket 4), Items/Nested are Variable (bucket 5),
        // sorted lexicographically within their bucket.
        assert_eq!(names, vec!["Flag", "Items", "Nested"]);
    }

    #[test]
    fn test_optional_always_sorts_last() {
        let fields = vec![
            field("OptBool", TypeRef::optional_primitive(PrimitiveKind::Bool)),
            field("Blob", TypeRef::array(TypeRef::primitive(PrimitiveKind::I8))),
        ];
        let ordered = reorder_fields(&fields);
        let names: Vec<&str> = ordered.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Blob", "OptBool"]);
    }
}
