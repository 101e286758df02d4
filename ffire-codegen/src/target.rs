//! The per-language dispatch surface: the [`TargetLanguage`] tag and the
//! [`Emitter`] trait every backend implements.
//!
//! A new target is added by implementing `Emitter`; the analyzer
//! ([`crate::analyzer`]) and planner ([`crate::planner`]) stay shared
//! across every target rather than being re-derived per backend.

use crate::error::GenError;
use ffire_schema::Schema;

/// A code-generation target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLanguage {
    /// Rust, emitting source that depends on `ffire-wire`'s cursor types.
    Rust,
    /// C, emitting a self-contained header + source pair.
    C,
    /// Go, emitting exported `Encode*Message`/`Decode*Message` functions.
    Go,
    /// Python, emitting a module built on the standard `struct` module.
    Python,
}

impl TargetLanguage {
    /// The lowercase name used in diagnostics and file naming.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::C => "c",
            Self::Go => "go",
            Self::Python => "python",
        }
    }
}

/// One emitted source file: a relative file name and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name, e.g. `"schema.rs"` or `"schema.h"`.
    pub name: String,
    /// Full file contents.
    pub source: String,
}

/// The complete output of one [`crate::generate`] call.
///
/// Most targets emit a single file; a target that needs a
/// declaration/definition split (C's header + source) emits two.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedSources {
    /// Emitted files, in the order the emitter produced them.
    pub files: Vec<GeneratedFile>,
}

impl GeneratedSources {
    /// Wraps a single emitted file.
    #[must_use]
    pub fn single(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            files: vec![GeneratedFile {
                name: name.into(),
                source: source.into(),
            }],
        }
    }

    /// Looks up an emitted file's source by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.iter().find(|f| f.name == name).map(|f| f.source.as_str())
    }
}

/// A target-language-specific back-end.
///
/// An emitter is responsible only for language-surface mapping — type
/// names, control-flow syntax, the error model, module/namespace
/// wrapping, buffer type — while consuming the shared plan from
/// [`crate::analyzer`] and [`crate::planner`]. The wire-format contract
/// itself ([`ffire_wire`]) and the E1-E4 strategy decision
/// ([`crate::strategy`]) are never re-derived per emitter.
pub trait Emitter {
    /// The target this emitter implements.
    fn target(&self) -> TargetLanguage;

    /// Emits source for `schema`: type definitions, one encode/decode
    /// function pair per [`ffire_schema::MessageDecl`], and per-struct
    /// helper encoders/decoders for non-root struct references.
    ///
    /// # Errors
    /// Returns [`GenError::EmitFailure`] if an emitter invariant is
    /// violated — in practice only reachable for a schema shape
    /// `ffire_schema::validate` should already have rejected.
    fn emit(&self, schema: &Schema) -> Result<GeneratedSources, GenError>;
}
