//! Error types for variant resolution
//!
//! All modules use `ResolveResult<T>` as their return type. Errors are
//! `Clone` so a failure recorded once by the single-flight cache can be
//! handed to every waiter unchanged.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// All errors that can occur while selecting and resolving artifacts
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    // Artifact errors
    #[error("Artifact not found: {artifact} (searched: {searched})")]
    ArtifactNotFound { artifact: String, searched: String },

    #[error("Could not resolve artifact {artifact}: {reason}")]
    ArtifactResolution { artifact: String, reason: String },

    #[error("Computation for {key} was abandoned before it completed")]
    ComputationAbandoned { key: String },

    // Model errors
    #[error("Invalid value for attribute '{attribute}': {reason}")]
    InvalidAttributeValue { attribute: String, reason: String },

    #[error("Configuration '{name}' not found in component {component}")]
    UnknownConfiguration { component: String, name: String },

    #[error("Invalid exclude rule '{0}': expected group[:module[:artifact[:ext[:classifier]]]]")]
    InvalidExclude(String),

    #[error("Invalid component descriptor at {path}: {reason}")]
    DescriptorInvalid { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(Arc<serde_json::Error>),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),

    // General errors
    #[error("{0}")]
    User(String),
}

impl ResolveError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source: Arc::new(source),
        }
    }

    /// Create an artifact resolution error
    pub fn resolution(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArtifactResolution {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    ///
    /// Nothing in this crate retries on its own; the flag is for callers
    /// that own a retry policy around their resolver.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ArtifactResolution { .. } | Self::Io { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ArtifactNotFound { .. } => {
                Some("Check the repository root with: vres config show")
            }
            Self::UnknownConfiguration { .. } => {
                Some("Configuration names are case-sensitive, check the descriptor")
            }
            Self::InvalidExclude(_) => Some("Example: --exclude com.example:lib:lib-sources"),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

impl From<toml::ser::Error> for ResolveError {
    fn from(err: toml::ser::Error) -> Self {
        Self::TomlSerialize(err.to_string())
    }
}
