//! Schema AST definitions.
//!
//! This module contains the data structures representing a parsed schema:
//! named struct types, their fields, and the root message declarations that
//! make a subset of those types publicly encodable.

use std::collections::HashMap;

/// A complete, parsed schema.
///
/// A `Schema` is built once by an external parser (see the crate-level
/// docs) and is read-only from that point on: the codegen engine and the
/// reference wire codec only ever borrow it.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Package name (namespace) the schema belongs to.
    pub package: String,
    /// Named type definitions, in authored order.
    pub types: Vec<TypeDef>,
    /// Root message declarations, in authored order.
    pub messages: Vec<MessageDecl>,
    /// Type lookup map (name -> index into `types`), built during parsing.
    type_map: HashMap<String, usize>,
}

impl Schema {
    /// Creates a new, empty schema for the given package.
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            types: Vec::new(),
            messages: Vec::new(),
            type_map: HashMap::new(),
        }
    }

    /// Adds a type definition to the schema.
    pub fn add_type(&mut self, type_def: TypeDef) {
        let name = type_def.name().to_string();
        let index = self.types.len();
        self.types.push(type_def);
        self.type_map.insert(name, index);
    }

    /// Adds a message declaration to the schema.
    pub fn add_message(&mut self, message: MessageDecl) {
        self.messages.push(message);
    }

    /// Looks up a named type definition.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.type_map.get(name).map(|&idx| &self.types[idx])
    }

    /// Returns true if a named type with the given name exists.
    #[must_use]
    pub fn has_type(&self, name: &str) -> bool {
        self.type_map.contains_key(name)
    }

    /// Looks up a message declaration by name.
    #[must_use]
    pub fn get_message(&self, name: &str) -> Option<&MessageDecl> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// Rebuilds the type lookup map from the `types` vector.
    ///
    /// Needed when `types` is mutated directly (e.g. by a parser building
    /// the vector first and the map second).
    pub fn build_type_map(&mut self) {
        self.type_map.clear();
        for (idx, type_def) in self.types.iter().enumerate() {
            self.type_map.insert(type_def.name().to_string(), idx);
        }
    }
}

/// A named type definition.
///
/// Only struct types are named in this model: arrays and primitives appear
/// only inline, as `TypeRef` variants.
#[derive(Debug, Clone)]
pub enum TypeDef {
    /// Named struct type.
    Struct(StructDef),
}

impl TypeDef {
    /// Returns the name of the type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(s) => &s.name,
        }
    }

    /// Returns the struct definition, if this is one (always true today,
    /// but keeps call sites future-proof against additional `TypeDef`
    /// variants).
    #[must_use]
    pub fn as_struct(&self) -> Option<&StructDef> {
        match self {
            Self::Struct(s) => Some(s),
        }
    }
}

/// A named struct type: an ordered list of fields.
#[derive(Debug, Clone)]
pub struct StructDef {
    /// Struct name.
    pub name: String,
    /// Fields, in authored order (see `Field` docs on canonical wire order).
    pub fields: Vec<Field>,
}

impl StructDef {
    /// Creates a new, empty struct definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the struct.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A field within a struct.
///
/// The `optional` flag lives on the field's `TypeRef`, not on the field
/// itself: this lets a schema distinguish "optional array of T" from
/// "array of optional T".
#[derive(Debug, Clone)]
pub struct Field {
    /// Field name, unique within its struct.
    pub name: String,
    /// Field type.
    pub ty: TypeRef,
    /// Opaque source-tag text, preserved verbatim and passed through to
    /// emitters. The core never parses its contents beyond what the
    /// JSON/binary fixture collaborator extracts from it; treat it as an
    /// uninterpreted string everywhere else.
    pub tag: Option<String>,
}

impl Field {
    /// Creates a new required field with no tag.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: None,
        }
    }

    /// Creates a new field with a source tag attached.
    #[must_use]
    pub fn with_tag(name: impl Into<String>, ty: TypeRef, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: Some(tag.into()),
        }
    }

    /// Returns true if this field's type is marked optional.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.ty.is_optional()
    }
}

/// Primitive scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Boolean, 1 byte (0x00 / 0x01).
    Bool,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// IEEE-754 single precision float.
    F32,
    /// IEEE-754 double precision float.
    F64,
    /// UTF-8 string, length-prefixed on the wire.
    String,
}

impl PrimitiveKind {
    /// Returns the fixed encoded size in bytes, or `None` for variable-size
    /// kinds (currently only `String`).
    #[must_use]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Bool | Self::I8 => Some(1),
            Self::I16 => Some(2),
            Self::I32 | Self::F32 => Some(4),
            Self::I64 | Self::F64 => Some(8),
            Self::String => None,
        }
    }

    /// Returns true if this kind is a floating-point primitive.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Returns true if this kind is the string primitive.
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self, Self::String)
    }

    /// Returns the schema source-syntax name for this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
        }
    }

    /// Parses a kind from its schema source-syntax name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Bool),
            "i8" => Some(Self::I8),
            "i16" => Some(Self::I16),
            "i32" => Some(Self::I32),
            "i64" => Some(Self::I64),
            "f32" => Some(Self::F32),
            "f64" => Some(Self::F64),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

/// A reference to a primitive, array, or named struct type, optionally
/// marked as present-or-absent on the wire.
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// A primitive scalar.
    Primitive {
        /// Underlying primitive kind.
        kind: PrimitiveKind,
        /// Whether the value may be absent on the wire (presence byte).
        optional: bool,
    },
    /// An array of elements of a uniform type.
    Array {
        /// Element type.
        element: Box<TypeRef>,
        /// Whether the whole array may be absent on the wire.
        optional: bool,
    },
    /// A reference to a named struct type.
    StructRef {
        /// Referenced struct name.
        name: String,
        /// Whether the struct may be absent on the wire.
        optional: bool,
    },
}

impl TypeRef {
    /// Creates a required primitive type reference.
    #[must_use]
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive {
            kind,
            optional: false,
        }
    }

    /// Creates an optional primitive type reference.
    #[must_use]
    pub fn optional_primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive {
            kind,
            optional: true,
        }
    }

    /// Creates a required array type reference.
    #[must_use]
    pub fn array(element: TypeRef) -> Self {
        Self::Array {
            element: Box::new(element),
            optional: false,
        }
    }

    /// Creates an optional array type reference.
    #[must_use]
    pub fn optional_array(element: TypeRef) -> Self {
        Self::Array {
            element: Box::new(element),
            optional: true,
        }
    }

    /// Creates a required reference to a named struct.
    #[must_use]
    pub fn struct_ref(name: impl Into<String>) -> Self {
        Self::StructRef {
            name: name.into(),
            optional: false,
        }
    }

    /// Creates an optional reference to a named struct.
    #[must_use]
    pub fn optional_struct_ref(name: impl Into<String>) -> Self {
        Self::StructRef {
            name: name.into(),
            optional: true,
        }
    }

    /// Returns true if this reference is marked optional.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        match self {
            Self::Primitive { optional, .. }
            | Self::Array { optional, .. }
            | Self::StructRef { optional, .. } => *optional,
        }
    }

    /// Returns a clone of this reference with `optional` forced to `false`.
    /// Used by analysis code that needs to reason about the underlying
    /// shape regardless of presence.
    #[must_use]
    pub fn without_optional(&self) -> Self {
        match self {
            Self::Primitive { kind, .. } => Self::Primitive {
                kind: *kind,
                optional: false,
            },
            Self::Array { element, .. } => Self::Array {
                element: element.clone(),
                optional: false,
            },
            Self::StructRef { name, .. } => Self::StructRef {
                name: name.clone(),
                optional: false,
            },
        }
    }
}

/// A named root type for which public encode/decode functions are
/// generated.
#[derive(Debug, Clone)]
pub struct MessageDecl {
    /// Message name, unique within the schema.
    pub name: String,
    /// The root encodable type.
    pub target: TypeRef,
}

impl MessageDecl {
    /// Creates a new message declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, target: TypeRef) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_kind_fixed_size() {
        assert_eq!(PrimitiveKind::Bool.fixed_size(), Some(1));
        assert_eq!(PrimitiveKind::I64.fixed_size(), Some(8));
        assert_eq!(PrimitiveKind::String.fixed_size(), None);
    }

    #[test]
    fn test_primitive_kind_name_roundtrip() {
        for kind in [
            PrimitiveKind::Bool,
            PrimitiveKind::I8,
            PrimitiveKind::I16,
            PrimitiveKind::I32,
            PrimitiveKind::I64,
            PrimitiveKind::F32,
            PrimitiveKind::F64,
            PrimitiveKind::String,
        ] {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_name("nonsense"), None);
    }

    #[test]
    fn test_schema_type_lookup() {
        let mut schema = Schema::new("test");
        schema.add_type(TypeDef::Struct(StructDef::new("Device")));
        assert!(schema.has_type("Device"));
        assert!(!schema.has_type("Unknown"));
        assert!(schema.get_type("Device").is_some());
    }

    #[test]
    fn test_schema_build_type_map() {
        let mut schema = Schema::new("test");
        schema.types.push(TypeDef::Struct(StructDef::new("A")));
        schema.types.push(TypeDef::Struct(StructDef::new("B")));
        schema.build_type_map();
        assert!(schema.has_type("A"));
        assert!(schema.has_type("B"));
    }

    #[test]
    fn test_type_ref_optional() {
        let required = TypeRef::primitive(PrimitiveKind::I32);
        assert!(!required.is_optional());

        let optional = TypeRef::optional_primitive(PrimitiveKind::I32);
        assert!(optional.is_optional());

        let arr = TypeRef::optional_array(TypeRef::primitive(PrimitiveKind::I32));
        assert!(arr.is_optional());
    }

    #[test]
    fn test_without_optional() {
        let opt = TypeRef::optional_struct_ref("Device");
        let stripped = opt.without_optional();
        assert!(!stripped.is_optional());
    }

    #[test]
    fn test_struct_def_field_lookup() {
        let mut s = StructDef::new("Device");
        s.add_field(Field::new("name", TypeRef::primitive(PrimitiveKind::String)));
        assert!(s.get_field("name").is_some());
        assert!(s.get_field("missing").is_none());
    }

    #[test]
    fn test_message_decl() {
        let msg = MessageDecl::new("Count", TypeRef::primitive(PrimitiveKind::I32));
        assert_eq!(msg.name, "Count");
    }
}
