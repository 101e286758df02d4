//! # ffire-codegen
//!
//! Turns a validated [`ffire_schema::Schema`] into target-language codec
//! source: structs (or their nearest target-language equivalent) plus an
//! encode/decode function triad per declared message.
//!
//! The pipeline mirrors the source engine's three stages:
//! - [`analyzer`] computes per-type facts (fixed size, nesting depth,
//!   whether a string/float/primitive-array appears anywhere inside).
//! - [`planner`] derives the concrete plan every emitter shares: struct
//!   declare-before-use order and root-type naming.
//! - [`strategy`] picks one of four emission strategies (E1-E4) for each
//!   array and struct shape, also shared across emitters.
//! - [`emit`] holds one backend per [`target::TargetLanguage`], each
//!   implementing [`target::Emitter`].
//!
//! [`generate`] and [`generator::Generator`] are the public entry points.

pub mod analyzer;
pub mod emit;
pub mod error;
pub mod generator;
pub mod planner;
pub mod strategy;
pub mod target;

pub use error::GenError;
pub use generator::{generate, Generator};
pub use target::{Emitter, GeneratedFile, GeneratedSources, TargetLanguage};
