use thiserror::Error;

/// Malformed version input. Aborts a resolution call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("version may not be empty")]
    Empty,

    #[error("Invalid version string {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Metadata not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid repository url: {0}")]
    InvalidUrl(String),
}

/// Hard failures of a resolution call.
///
/// "Nothing applicable" is not an error; see [`crate::version::types::Resolution`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
