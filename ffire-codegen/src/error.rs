//! Error types for code generation.

use thiserror::Error;

/// Errors produced by [`crate::generate`] and the per-target emitters.
#[derive(Debug, Error)]
pub enum GenError {
    /// The schema failed validation before any emission work began.
    #[error("schema error: {0}")]
    Schema(#[from] ffire_schema::SchemaError),

    /// No emitter is registered for the requested target. Unreachable
    /// today (all four targets in [`crate::target::TargetLanguage`] are
    /// always built in); kept so adding a target behind a feature flag
    /// later has somewhere to report its absence.
    #[error("no emitter built for target '{target}'")]
    UnsupportedTarget {
        /// The requested target's name.
        target: String,
    },

    /// An emitter invariant was violated — a schema shape the emitter
    /// didn't expect reached it, despite `validate` having run first.
    #[error("emitter invariant violated: {message}")]
    EmitFailure {
        /// Description of what went wrong.
        message: String,
    },
}

impl GenError {
    /// Builds an [`GenError::UnsupportedTarget`] for a target name.
    #[must_use]
    pub fn unsupported_target(target: impl Into<String>) -> Self {
        Self::UnsupportedTarget { target: target.into() }
    }

    /// Builds an [`GenError::EmitFailure`] with a message.
    #[must_use]
    pub fn emit_failure(message: impl Into<String>) -> Self {
        Self::EmitFailure { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_target_display() {
        let err = GenError::unsupported_target("cobol");
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn test_emit_failure_display() {
        let err = GenError::emit_failure("root type has no known rust mapping");
        assert!(err.to_string().contains("rust mapping"));
    }

    #[test]
    fn test_schema_error_conversion() {
        let schema_err = ffire_schema::SchemaError::NoMessages;
        let err: GenError = schema_err.into();
        assert!(matches!(err, GenError::Schema(_)));
    }
}
