//! # ffire
//!
//! A schema model, a byte-exact little-endian wire format, and a
//! multi-language code generator, bundled behind one crate.
//!
//! ## Quick Start
//!
//! ```
//! use ffire::prelude::*;
//!
//! let mut schema = Schema::new("demo");
//! let mut device = StructDef::new("Device");
//! device.add_field(Field::new("Name", TypeRef::primitive(PrimitiveKind::String)));
//! device.add_field(Field::new("Channels", TypeRef::primitive(PrimitiveKind::I32)));
//! schema.add_type(TypeDef::Struct(device));
//! schema.add_message(MessageDecl::new("Device", TypeRef::struct_ref("Device")));
//!
//! validate(&schema).unwrap();
//! let sources = generate(&schema, TargetLanguage::Rust).unwrap();
//! assert!(sources.get("demo.rs").unwrap().contains("pub struct Device"));
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - the AST, validation, and query predicates
//! - [`wire`] - the bounds-checked cursor pair, the reference codec, and
//!   canonical field ordering
//! - [`codegen`] - the analyzer, planner, strategy selection, and the
//!   per-target emitters

pub mod prelude;

/// Schema AST, validation, and query predicates.
pub mod schema {
    pub use ffire_schema::*;
}

/// Bounds-checked wire-format cursors and the reference codec.
pub mod wire {
    pub use ffire_wire::*;
}

/// Target-language code generation.
pub mod codegen {
    pub use ffire_codegen::*;
}

pub use ffire_codegen::{generate, GenError, Generator, TargetLanguage};
pub use ffire_schema::{validate, Schema, SchemaError};
pub use ffire_wire::{ReadCursor, WireError, WriteCursor};
