/// Convenience result type used across the crate.
pub type XflResult<T> = Result<T, XflError>;

/// Top-level error taxonomy.
///
/// Only [`XflError::Parse`] escapes a document load. Broken references found while evaluating are
/// degraded locally (logged, not returned); see the evaluator.
#[derive(thiserror::Error, Debug)]
pub enum XflError {
    /// Malformed or missing XML, an unresolvable `Include`, or a vector shape element.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid caller-provided data (options, names, override values).
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal invariant broken while walking the document graph.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl XflError {
    /// Build a [`XflError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`XflError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`XflError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`XflError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
