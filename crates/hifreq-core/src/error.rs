//! Error types for the hifreq workspace.
use thiserror::Error;

use crate::units::Dimension;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("empty quantity")] Empty,
    #[error("invalid number in quantity '{0}'")] InvalidNumber(String),
    #[error("missing explicit unit in quantity '{0}'")] MissingUnit(String),
    #[error("unknown unit symbol: {0}")] UnknownUnit(String),
    #[error("wrong dimension: expected {expected}, got {got}")] WrongDimension { expected: Dimension, got: Dimension },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    #[error("missing '{0}' property")] Missing(String),
    #[error("property '{key}' is not a {expected}")] WrongType { key: String, expected: &'static str },
    #[error("property '{key}': {source}")] Unit { key: String, source: UnitError },
    #[error("invalid '{key}' property: {reason}")] Invalid { key: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RandomError {
    #[error("random source is not initialized")] NotInitialized,
    #[error("random source is already initialized")] AlreadyInitialized,
    #[error("invalid distribution parameter: {0}")] InvalidParameter(String),
}

/// Failures reported by collaborator generators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("generator '{0}' is not initialized")] NotInitialized(String),
    #[error("generator '{0}' is already initialized")] AlreadyInitialized(String),
    #[error("generator '{0}' has no more available vertex")] Exhausted(String),
    #[error("generator '{name}': {reason}")] Invalid { name: String, reason: String },
    #[error(transparent)] Property(#[from] PropertyError),
    #[error(transparent)] Random(#[from] RandomError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no generator named '{0}'")] Unknown(String),
    #[error("cannot initialize generator '{name}': {source}")] Initialization { name: String, source: GeneratorError },
}

/// Broad failure classes of the stream engine and vertex provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing, invalid or mis-dimensioned configuration; unresolved names.
    Configuration,
    /// Operation attempted in the wrong lifecycle state.
    Logic,
    /// A collaborator could not deliver (e.g. vertex generator ran dry).
    Exhaustion,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("invalid configuration for '{name}': {reason}")] InvalidConfig { name: String, reason: String },
    #[error(transparent)] Property(#[from] PropertyError),
    #[error(transparent)] Registry(#[from] RegistryError),
    #[error("operation prohibited: '{name}' is locked/initialized ({operation})")] Locked { name: String, operation: &'static str },
    #[error("'{0}' is already initialized")] AlreadyInitialized(String),
    #[error("'{0}' is not initialized")] NotInitialized(String),
    #[error("vertex generator '{0}' has no more available vertex")] Exhausted(String),
    #[error(transparent)] Generator(#[from] GeneratorError),
    #[error(transparent)] Random(#[from] RandomError),
}

impl StreamError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig { .. } | Self::Property(_) | Self::Registry(_) => {
                ErrorKind::Configuration
            }
            Self::Locked { .. } | Self::AlreadyInitialized(_) | Self::NotInitialized(_) => {
                ErrorKind::Logic
            }
            Self::Random(_) => ErrorKind::Logic,
            Self::Exhausted(_) | Self::Generator(_) => ErrorKind::Exhaustion,
        }
    }
}
