//! Error types for schema validation.

use thiserror::Error;

/// Errors produced by [`crate::validation::validate`].
///
/// Each variant carries a human-readable location (a type/field/message
/// path, rendered via [`crate::path::TypePath`] where the failure is
/// nested) so a caller can report precisely where the schema is invalid.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A `StructRef` names a type that isn't defined anywhere in the schema.
    #[error("unknown type '{type_name}' referenced at '{path}'")]
    UnknownType {
        /// The undefined type name.
        type_name: String,
        /// Location of the dangling reference.
        path: String,
    },

    /// Two fields in the same struct share a name.
    #[error("duplicate field '{field}' in struct '{struct_name}'")]
    DuplicateField {
        /// The struct containing the duplicate.
        struct_name: String,
        /// The duplicated field name.
        field: String,
    },

    /// Two named types share a name.
    #[error("duplicate type name '{name}'")]
    DuplicateType {
        /// The duplicated type name.
        name: String,
    },

    /// Two messages share a name.
    #[error("duplicate message name '{name}'")]
    DuplicateMessage {
        /// The duplicated message name.
        name: String,
    },

    /// A type's structural nesting exceeds the maximum allowed depth.
    #[error("type '{path}' exceeds maximum nesting depth of {max}: got {actual}")]
    DepthExceeded {
        /// Location of the over-deep type.
        path: String,
        /// The configured maximum.
        max: usize,
        /// The measured depth.
        actual: usize,
    },

    /// The schema declares no messages at all.
    #[error("schema declares no messages")]
    NoMessages,

    /// A name (package, type, field, or message) is empty.
    #[error("empty identifier at '{path}'")]
    EmptyIdentifier {
        /// Location of the empty name.
        path: String,
    },

    /// A name (package, type, field, or message) contains characters
    /// outside printable ASCII.
    #[error("identifier '{name}' at '{path}' is not printable ASCII")]
    InvalidIdentifier {
        /// The offending name.
        name: String,
        /// Location of the invalid name.
        path: String,
    },

    /// A struct's fields transitively reference back to itself with no
    /// way to bottom out.
    #[error("cyclic struct reference detected: {path}")]
    CyclicReference {
        /// The cycle, rendered as a `.`-joined chain of struct names.
        path: String,
    },

    /// A schema source attempted to declare a struct type inline, rather
    /// than as a named top-level type referenced via `StructRef`.
    ///
    /// This AST has no representation for an embedded/anonymous struct
    /// (see [`crate::types::TypeRef`]), so `validate` never produces this
    /// variant itself; it exists as a stable error a schema-source parser
    /// can report when it encounters that syntax.
    #[error("embedded (anonymous) struct types are not supported: {path}")]
    EmbeddedStructNotSupported {
        /// Location of the offending inline declaration.
        path: String,
    },
}

impl SchemaError {
    /// Returns the location path carried by this error, if any.
    ///
    /// [`SchemaError::NoMessages`] has no associated location since the
    /// failure is about the schema as a whole.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::UnknownType { path, .. }
            | Self::DepthExceeded { path, .. }
            | Self::EmptyIdentifier { path }
            | Self::InvalidIdentifier { path, .. }
            | Self::CyclicReference { path }
            | Self::EmbeddedStructNotSupported { path } => Some(path),
            Self::DuplicateField { struct_name, .. } => Some(struct_name),
            Self::DuplicateType { name } | Self::DuplicateMessage { name } => Some(name),
            Self::NoMessages => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_path() {
        let err = SchemaError::UnknownType {
            type_name: "Missing".into(),
            path: "Device.Sensor".into(),
        };
        assert_eq!(err.path(), Some("Device.Sensor"));
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_no_messages_has_no_path() {
        let err = SchemaError::NoMessages;
        assert_eq!(err.path(), None);
    }

    #[test]
    fn test_duplicate_field_display() {
        let err = SchemaError::DuplicateField {
            struct_name: "Device".into(),
            field: "Name".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Device"));
        assert!(msg.contains("Name"));
    }
}
