//! Error types shared by the meshkit crates.

use thiserror::Error;

/// Errors raised by the geometry and batching pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// The caller passed a value the operation cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Something could not be rendered faithfully and was replaced with
    /// placeholder geometry. Mesh operations log this and carry on; it is only
    /// returned by external collaborators such as texture providers.
    #[error("degraded render: {0}")]
    DegradedRender(String),
    /// A fixed-size resource would have to grow past its configured ceiling.
    #[error("{what} capacity exceeded: requested {requested}, limit {limit}")]
    CapacityExceeded {
        what: &'static str,
        requested: usize,
        limit: usize,
    },
}

impl MeshError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result alias used throughout meshkit.
pub type Result<T> = std::result::Result<T, MeshError>;
