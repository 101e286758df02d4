//! # ffire-schema
//!
//! The schema AST for ffire: the named-type registry, field model, and
//! query/validation logic shared by the reference wire codec and the
//! code generator.
//!
//! This crate provides:
//! - AST types for struct/array/primitive schemas ([`types`])
//! - Pure structural query predicates ([`queries`])
//! - Schema validation ([`validation`])
//! - Location-path formatting for diagnostics ([`path`])
//!
//! A [`Schema`] is built once — by an external schema-source parser that
//! is out of this crate's scope — and is read-only afterward: both
//! [`validation::validate`] and the codegen engine only ever borrow it.

pub mod error;
pub mod path;
pub mod queries;
pub mod types;
pub mod validation;

pub use error::SchemaError;
pub use path::TypePath;
pub use types::{Field, MessageDecl, PrimitiveKind, Schema, StructDef, TypeDef, TypeRef};
pub use validation::{validate, MAX_DEPTH};
