// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for mesh kernel operations.

use crate::keys::{EdgeKey, FaceKey, VertexKey};

/// Result type alias for kernel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during mesh operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operation would produce zero or negative area geometry.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Two loops passed to a bridge have different vertex counts.
    #[error("loop mismatch: {left} vertices vs {right} vertices")]
    LoopMismatch { left: usize, right: usize },

    /// Vertex key not found in the mesh.
    #[error("vertex not found: {0:?}")]
    VertexNotFound(VertexKey),

    /// Edge key not found in the mesh.
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeKey),

    /// Face key not found in the mesh.
    #[error("face not found: {0:?}")]
    FaceNotFound(FaceKey),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn degenerate(msg: impl Into<String>) -> Self {
        Error::DegenerateGeometry(msg.into())
    }
}
