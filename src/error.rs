//! Error types for the retrieval engine

use std::fmt;

/// Errors that can occur while fitting, projecting, or ranking
///
/// Structural problems (shapes, empty required inputs, bad parameters) are
/// reported here. Numeric degeneracies such as zero variance or zero vector
/// magnitude are absorbed locally with a documented fallback and never
/// surface as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalError {
    /// Invalid input parameters
    InvalidInput(String),

    /// A required input was empty (e.g. fitting on zero images)
    EmptyInput(String),

    /// Input arrays disagree in dimension
    ShapeMismatch {
        /// What was being compared
        context: String,
        /// Expected dimensions
        expected: Vec<usize>,
        /// Dimensions actually received
        found: Vec<usize>,
    },

    /// Image decoding error
    DecodingError(String),

    /// Record serialization or deserialization error
    SerializationError(String),

    /// Record not present in a store
    NotFound(String),
}

impl RetrievalError {
    /// Shorthand for a [`RetrievalError::ShapeMismatch`]
    pub fn shape_mismatch(context: impl Into<String>, expected: &[usize], found: &[usize]) -> Self {
        RetrievalError::ShapeMismatch {
            context: context.into(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            RetrievalError::EmptyInput(msg) => write!(f, "Empty input: {}", msg),
            RetrievalError::ShapeMismatch {
                context,
                expected,
                found,
            } => write!(
                f,
                "Shape mismatch in {}: expected {:?}, found {:?}",
                context, expected, found
            ),
            RetrievalError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            RetrievalError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            RetrievalError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for RetrievalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = RetrievalError::shape_mismatch("image 3", &[10, 10], &[20, 10]);
        assert_eq!(
            err.to_string(),
            "Shape mismatch in image 3: expected [10, 10], found [20, 10]"
        );
    }
}
