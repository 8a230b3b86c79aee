//! Error types for upcweight

use thiserror::Error;

/// upcweight error type
#[derive(Error, Debug)]
pub enum Error {
    /// Two distributions expected to share a grid do not.
    #[error("shape mismatch: {left} vs {right}")]
    ShapeMismatch {
        /// Shape of the first operand.
        left: String,
        /// Shape of the second operand.
        right: String,
    },

    /// A persisted container lacks a required named component.
    #[error("missing artifact '{name}' in {source_path}")]
    MissingArtifact {
        /// Requested component name.
        name: String,
        /// Container the component was looked up in.
        source_path: String,
    },

    /// Normalization requested on an empty distribution.
    #[error("zero integral: cannot normalize '{0}'")]
    ZeroIntegral(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl Error {
    /// Build a [`Error::ShapeMismatch`] from two displayable shapes.
    pub fn shape_mismatch(left: impl ToString, right: impl ToString) -> Self {
        Error::ShapeMismatch { left: left.to_string(), right: right.to_string() }
    }

    /// Build a [`Error::MissingArtifact`].
    pub fn missing_artifact(name: impl Into<String>, source_path: impl Into<String>) -> Self {
        Error::MissingArtifact { name: name.into(), source_path: source_path.into() }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_reports_both_shapes() {
        let e = Error::shape_mismatch("[4 x 0..4]", "[3 x 0..3]");
        let msg = e.to_string();
        assert!(msg.contains("[4 x 0..4]"));
        assert!(msg.contains("[3 x 0..3]"));
    }

    #[test]
    fn missing_artifact_names_source() {
        let e = Error::missing_artifact("h_ratio", "weights.json");
        assert_eq!(e.to_string(), "missing artifact 'h_ratio' in weights.json");
    }
}
