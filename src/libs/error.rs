use std::fmt;

/// Failure taxonomy of the contact-profiling pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum U4cError {
    /// Invalid user-supplied settings: enzyme model, grouping key, overrides
    Config(String),
    /// Inputs violating the data contracts: coordinates, counts, identifiers
    Integrity(String),
    /// A filter left nothing to operate on
    Empty(String),
}

impl fmt::Display for U4cError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            U4cError::Config(msg) => write!(f, "configuration error: {}", msg),
            U4cError::Integrity(msg) => write!(f, "data integrity error: {}", msg),
            U4cError::Empty(msg) => write!(f, "empty result: {}", msg),
        }
    }
}

impl std::error::Error for U4cError {}
