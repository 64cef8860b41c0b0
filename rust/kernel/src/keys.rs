// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh element key types for arena-based storage.
//!
//! Each element gets a unique, type-safe key for O(1) lookup in the mesh.
//! Keys are created by `slotmap::SlotMap` and are generational: once an
//! element is removed its key stops resolving, even if the slot is reused.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a vertex (point in 3D space).
    pub struct VertexKey;

    /// Key for an edge (unordered pair of vertices).
    pub struct EdgeKey;

    /// Key for a face (ordered vertex loop, winding gives the outward normal).
    pub struct FaceKey;
}

/// A key that can reference any mesh element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKey {
    Vertex(VertexKey),
    Edge(EdgeKey),
    Face(FaceKey),
}

impl From<VertexKey> for MeshKey {
    fn from(k: VertexKey) -> Self {
        MeshKey::Vertex(k)
    }
}

impl From<EdgeKey> for MeshKey {
    fn from(k: EdgeKey) -> Self {
        MeshKey::Edge(k)
    }
}

impl From<FaceKey> for MeshKey {
    fn from(k: FaceKey) -> Self {
        MeshKey::Face(k)
    }
}
