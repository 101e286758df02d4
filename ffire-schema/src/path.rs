//! Human-readable location paths for schema diagnostics.
//!
//! Validation and the analyzer both need to report exactly where, inside
//! a possibly deeply nested type, something went wrong. `TypePath` centralizes
//! the `"Config.Options[2].Name"` formatting so no call site builds its own
//! ad-hoc `format!` string.

use std::fmt;

/// A single step in a type path.
#[derive(Debug, Clone)]
enum Segment {
    /// A named field or type, rendered as `.name` (or bare `name` at the
    /// start of a path).
    Field(String),
    /// An array index, rendered as `[n]`.
    Index(usize),
}

/// A builder for dotted/indexed location paths, e.g. `Config.Options[2].Name`.
#[derive(Debug, Clone)]
pub struct TypePath {
    segments: Vec<Segment>,
}

impl TypePath {
    /// Starts a new path rooted at the given name (a type or message name).
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Field(root.into())],
        }
    }

    /// Returns a new path with a field segment appended.
    #[must_use]
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.into()));
        Self { segments }
    }

    /// Returns a new path with an array index segment appended.
    #[must_use]
    pub fn index(&self, idx: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(idx));
        Self { segments }
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{name}")?;
                }
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let path = TypePath::new("Config");
        assert_eq!(path.to_string(), "Config");
    }

    #[test]
    fn test_nested_path() {
        let path = TypePath::new("Config")
            .field("Options")
            .index(2)
            .field("Name");
        assert_eq!(path.to_string(), "Config.Options[2].Name");
    }

    #[test]
    fn test_index_at_root() {
        let path = TypePath::new("Items").index(0);
        assert_eq!(path.to_string(), "Items[0]");
    }
}
