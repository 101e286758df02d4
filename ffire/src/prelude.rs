//! Prelude module for convenient imports.
//!
//! ```
//! use ffire::prelude::*;
//! ```

// Schema AST and validation
pub use ffire_schema::{
    validate, Field, MessageDecl, PrimitiveKind, Schema, SchemaError, StructDef, TypeDef, TypeRef,
};

// Wire-format cursors, the reference codec, and canonical ordering
pub use ffire_wire::buffer::{AlignedBuffer, BufferPool, ReadCursor, WriteCursor};
pub use ffire_wire::codec::{decode_message, decode_message_strict, encode_message, Value};
pub use ffire_wire::error::WireError;
pub use ffire_wire::order::{canonical_order, reorder_fields};

// Code generation
pub use ffire_codegen::{
    generate, Emitter, GenError, GeneratedFile, GeneratedSources, Generator, TargetLanguage,
};
