//! Turns a validated schema into the concrete plan every emitter
//! consumes: canonical wire field order (delegated to
//! [`ffire_wire::order`], never duplicated here), root naming, and the
//! struct declare-before-use order required by targets whose syntax
//! demands types appear before they're referenced.

use ffire_schema::{Field, MessageDecl, PrimitiveKind, Schema, StructDef, TypeDef, TypeRef};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Converts an identifier to `snake_case`, for targets whose function
/// naming idiom wants it (Rust, the C ABI, Python).
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            result.push('_');
        }
        result.push(c.to_ascii_lowercase());
    }
    result
}

/// Converts an identifier to `PascalCase`, for targets whose exported
/// naming idiom wants it (Go).
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' || c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

/// The root name a message's target resolves to: a struct name as
/// authored, the capitalized primitive kind name, or (recursively) the
/// element's root name for an array.
#[must_use]
pub fn root_name(ty: &TypeRef) -> String {
    match ty {
        TypeRef::StructRef { name, .. } => name.clone(),
        TypeRef::Array { element, .. } => root_name(element),
        TypeRef::Primitive { kind, .. } => capitalize(kind.name()),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    }
}

/// The emitted root wrapper type name for a message: the root name with
/// `Message` appended, so the generated public entry type never
/// collides with a same-named schema struct (`Config` -> `ConfigMessage`).
#[must_use]
pub fn root_message_type_name(message: &MessageDecl) -> String {
    format!("{}Message", root_name(&message.target))
}

/// Fields of `def`, reordered into canonical wire order. A thin
/// re-export of [`ffire_wire::order::reorder_fields`] so every emitter
/// reaches the single comparator through the planner rather than
/// importing `ffire-wire` ordering logic directly.
#[must_use]
pub fn wire_fields(def: &StructDef) -> Vec<&Field> {
    ffire_wire::order::reorder_fields(&def.fields)
}

/// Collects the names of every named struct type referenced (directly or
/// through arrays) by `def`'s fields, in field order with duplicates
/// kept (callers that need a set can dedupe).
fn struct_dependencies(def: &StructDef) -> Vec<String> {
    let mut deps = Vec::new();
    for field in &def.fields {
        collect_struct_refs(&field.ty, &mut deps);
    }
    deps
}

fn collect_struct_refs(ty: &TypeRef, out: &mut Vec<String>) {
    match ty {
        TypeRef::StructRef { name, .. } => out.push(name.clone()),
        TypeRef::Array { element, .. } => collect_struct_refs(element, out),
        TypeRef::Primitive { .. } => {}
    }
}

/// Topologically sorts `schema`'s named struct types into
/// declare-before-use order: a struct referenced by another struct's
/// field always appears earlier in the returned order. Ties (structs
/// with no ordering constraint between them) break lexicographically by
/// name, so the result is deterministic across runs.
///
/// Cycles are impossible in a validated schema, but defensively: any
/// entry Kahn's algorithm can't reach is appended in lexicographic
/// order rather than panicking.
#[must_use]
pub fn topological_struct_order(schema: &Schema) -> Vec<String> {
    let mut names: Vec<String> = schema
        .types
        .iter()
        .map(|t| {
            let TypeDef::Struct(def) = t;
            def.name.clone()
        })
        .collect();
    names.sort();

    let mut in_degree: HashMap<String, usize> = names.iter().cloned().map(|n| (n, 0)).collect();
    let mut dependents: HashMap<String, Vec<String>> =
        names.iter().cloned().map(|n| (n, Vec::new())).collect();

    for ty in &schema.types {
        let TypeDef::Struct(def) = ty;
        for dep in struct_dependencies(def) {
            // `dep` must be declared before `def.name`: an edge dep -> def.
            if let Some(list) = dependents.get_mut(&dep) {
                list.push(def.name.clone());
                *in_degree.get_mut(&def.name).expect("name collected above") += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<String>> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(name, _)| Reverse(name.clone()))
        .collect();

    let mut order = Vec::with_capacity(names.len());
    let mut visited = HashSet::new();

    while let Some(Reverse(name)) = ready.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        order.push(name.clone());
        if let Some(next) = dependents.get(&name) {
            let mut next_sorted = next.clone();
            next_sorted.sort();
            for dependent in next_sorted {
                let degree = in_degree.get_mut(&dependent).expect("known name");
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }
    }

    for name in &names {
        if !visited.contains(name) {
            order.push(name.clone());
        }
    }

    order
}

/// The full emission plan for one schema: struct declaration order plus
/// the lookup helpers every emitter shares.
#[derive(Debug, Clone)]
pub struct Plan<'a> {
    schema: &'a Schema,
    struct_order: Vec<String>,
}

impl<'a> Plan<'a> {
    /// Builds a plan for `schema`.
    #[must_use]
    pub fn build(schema: &'a Schema) -> Self {
        Self {
            schema,
            struct_order: topological_struct_order(schema),
        }
    }

    /// The schema this plan was built from.
    #[must_use]
    pub const fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Named struct types in declare-before-use order.
    #[must_use]
    pub fn structs_in_order(&self) -> Vec<&'a StructDef> {
        self.struct_order
            .iter()
            .filter_map(|name| self.schema.get_type(name))
            .map(|t| {
                let TypeDef::Struct(def) = t;
                def
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffire_schema::{Field, MessageDecl, PrimitiveKind, TypeDef};

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_snake_case("ChannelCount"), "channel_count");
        assert_eq!(to_snake_case("name"), "name");
        assert_eq!(to_pascal_case("device_list"), "DeviceList");
    }

    #[test]
    fn test_root_name_struct() {
        let message = MessageDecl::new("M", TypeRef::struct_ref("Device"));
        assert_eq!(root_name(&message.target), "Device");
    }

    #[test]
    fn test_root_name_array_of_struct() {
        let message = MessageDecl::new("DeviceList", TypeRef::array(TypeRef::struct_ref("Device")));
        assert_eq!(root_name(&message.target), "Device");
    }

    #[test]
    fn test_root_name_primitive() {
        let message = MessageDecl::new("Count", TypeRef::primitive(PrimitiveKind::I32));
        assert_eq!(root_name(&message.target), "I32");
    }

    #[test]
    fn test_root_message_type_name_avoids_collision() {
        let message = MessageDecl::new("M", TypeRef::struct_ref("Config"));
        assert_eq!(root_message_type_name(&message), "ConfigMessage");
    }

    #[test]
    fn test_topological_order_respects_dependency() {
        let mut schema = Schema::new("pkg");
        let mut outer = StructDef::new("Outer");
        outer.add_field(Field::new("Inner", TypeRef::struct_ref("Inner")));
        let inner = StructDef::new("Inner");
        // Authored out of dependency order on purpose.
        schema.add_type(TypeDef::Struct(outer));
        schema.add_type(TypeDef::Struct(inner));

        let order = topological_struct_order(&schema);
        let inner_pos = order.iter().position(|n| n == "Inner").unwrap();
        let outer_pos = order.iter().position(|n| n == "Outer").unwrap();
        assert!(inner_pos < outer_pos);
    }

    #[test]
    fn test_topological_order_ties_break_lexicographically() {
        let mut schema = Schema::new("pkg");
        schema.add_type(TypeDef::Struct(StructDef::new("Zebra")));
        schema.add_type(TypeDef::Struct(StructDef::new("Apple")));
        assert_eq!(topological_struct_order(&schema), vec!["Apple", "Zebra"]);
    }

    #[test]
    fn test_plan_structs_in_order_matches_topological_order() {
        let mut schema = Schema::new("pkg");
        let mut outer = StructDef::new("Outer");
        outer.add_field(Field::new("Inner", TypeRef::struct_ref("Inner")));
        schema.add_type(TypeDef::Struct(outer));
        schema.add_type(TypeDef::Struct(StructDef::new("Inner")));

        let plan = Plan::build(&schema);
        let names: Vec<&str> = plan.structs_in_order().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Inner", "Outer"]);
    }
}
