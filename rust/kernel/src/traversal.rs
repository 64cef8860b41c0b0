// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adjacency traversal over the mesh.
//!
//! Downward queries read the face loops directly; upward queries go through
//! the adjacency index. Results that come from hash sets are sorted by key
//! so that callers iterating them stay deterministic.

use rustc_hash::FxHashSet;

use crate::keys::*;
use crate::mesh::Mesh;

impl Mesh {
    /// Iterates over all live face keys in storage order.
    pub fn face_keys(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.faces.keys()
    }

    /// Returns the loop vertices of a face.
    pub fn face_vertices(&self, face: FaceKey) -> Option<&[VertexKey]> {
        self.faces.get(face).map(|f| f.vertices.as_slice())
    }

    /// Returns the boundary edges of a face, in loop order.
    pub fn face_edges(&self, face: FaceKey) -> Option<&[EdgeKey]> {
        self.faces.get(face).map(|f| f.edges.as_slice())
    }

    /// Returns the faces using an edge, sorted by key.
    pub fn edge_faces(&self, edge: EdgeKey) -> Vec<FaceKey> {
        let mut faces: Vec<FaceKey> = self
            .edge_to_faces
            .get(&edge)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        faces.sort();
        faces
    }

    /// Returns the edges using a vertex, sorted by key.
    pub fn vertex_edges(&self, vertex: VertexKey) -> Vec<EdgeKey> {
        let mut edges: Vec<EdgeKey> = self
            .vertex_to_edges
            .get(&vertex)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        edges.sort();
        edges
    }

    /// Returns the faces touching a vertex, sorted by key.
    pub fn vertex_faces(&self, vertex: VertexKey) -> Vec<FaceKey> {
        let mut faces: FxHashSet<FaceKey> = FxHashSet::default();
        for ek in self.vertex_edges(vertex) {
            faces.extend(self.edge_faces(ek));
        }
        let mut faces: Vec<FaceKey> = faces.into_iter().collect();
        faces.sort();
        faces
    }

    /// Faces sharing at least one edge with `face`, sorted by key.
    pub fn face_neighbours(&self, face: FaceKey) -> Vec<FaceKey> {
        let mut out: FxHashSet<FaceKey> = FxHashSet::default();
        if let Some(edges) = self.face_edges(face) {
            for &ek in edges {
                out.extend(self.edge_faces(ek).into_iter().filter(|&f| f != face));
            }
        }
        let mut out: Vec<FaceKey> = out.into_iter().collect();
        out.sort();
        out
    }

    /// Directed boundary of a face region.
    ///
    /// Returns each `(a, b)` loop step of the region's faces whose reverse
    /// step `(b, a)` does not occur in another region face, in face then
    /// loop order. The pairs keep the winding of the owning face.
    pub fn region_boundary(&self, faces: &[FaceKey]) -> Vec<(VertexKey, VertexKey, FaceKey)> {
        let mut steps: FxHashSet<(VertexKey, VertexKey)> = FxHashSet::default();
        for &fk in faces {
            if let Some(verts) = self.face_vertices(fk) {
                for i in 0..verts.len() {
                    steps.insert((verts[i], verts[(i + 1) % verts.len()]));
                }
            }
        }

        let mut boundary = Vec::new();
        for &fk in faces {
            if let Some(verts) = self.face_vertices(fk) {
                for i in 0..verts.len() {
                    let (a, b) = (verts[i], verts[(i + 1) % verts.len()]);
                    if !steps.contains(&(b, a)) {
                        boundary.push((a, b, fk));
                    }
                }
            }
        }
        boundary
    }

    /// Edges used by exactly one face (open boundary of the whole mesh).
    pub fn open_edges(&self) -> Vec<EdgeKey> {
        self.edges
            .keys()
            .filter(|ek| self.edge_faces(*ek).len() == 1)
            .collect()
    }

    /// Edges used by more than two faces.
    pub fn non_manifold_edges(&self) -> Vec<EdgeKey> {
        self.edges
            .keys()
            .filter(|ek| self.edge_faces(*ek).len() > 2)
            .collect()
    }

    /// Returns `true` if every edge of the mesh borders exactly two faces.
    pub fn is_closed(&self) -> bool {
        self.edges
            .keys()
            .all(|ek| self.edge_faces(ek).len() == 2)
    }
}
