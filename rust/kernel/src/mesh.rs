// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for editable polygon meshes.
//!
//! The [`Mesh`] is the central owner of all mesh data. Vertices, edges and
//! faces live inside slot maps with stable, generational keys. Upward
//! adjacency indices (vertex → edges, edge → faces) make neighbourhood
//! queries cheap, and an undirected edge lookup guarantees that two faces
//! touching the same vertex pair share one edge.
//!
//! ## Manifold regions
//!
//! Generators only ever produce regions in which every edge borders at most
//! two faces. The mesh itself does not refuse other configurations (the host
//! may hand over arbitrary input), but [`Mesh::non_manifold_edges`] reports
//! any violation.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::keys::*;

/// Name of the material slot every mesh starts with.
pub const DEFAULT_MATERIAL: &str = "default";

/// Data stored for a vertex: a point in 3D space.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Data stored for an edge: an unordered vertex pair.
///
/// `start`/`end` record the order in which the edge was first created; face
/// loops may traverse it either way.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub start: VertexKey,
    pub end: VertexKey,
}

/// Data stored for a face: an ordered vertex loop and the edges between
/// consecutive loop vertices.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// Loop vertices. Counter-clockwise when viewed against the normal.
    pub vertices: Vec<VertexKey>,
    /// `edges[i]` joins `vertices[i]` and `vertices[(i + 1) % n]`.
    pub edges: Vec<EdgeKey>,
    /// Material slot index on the owning mesh.
    pub material: usize,
}

/// An editable polygon mesh.
///
/// # Example
///
/// ```
/// use storey_kernel::Mesh;
///
/// let mut mesh = Mesh::new();
/// let v0 = mesh.add_vertex(0.0, 0.0, 0.0);
/// let v1 = mesh.add_vertex(1.0, 0.0, 0.0);
/// let v2 = mesh.add_vertex(1.0, 1.0, 0.0);
/// let face = mesh.add_face(&[v0, v1, v2], 0).unwrap();
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.edge_count(), 3);
/// assert!(mesh.contains(face.into()));
/// ```
#[derive(Debug, Clone)]
pub struct Mesh {
    // Element storage
    pub(crate) vertices: SlotMap<VertexKey, VertexData>,
    pub(crate) edges: SlotMap<EdgeKey, EdgeData>,
    pub(crate) faces: SlotMap<FaceKey, FaceData>,

    // Upward adjacency: child → parents
    pub(crate) vertex_to_edges: FxHashMap<VertexKey, FxHashSet<EdgeKey>>,
    pub(crate) edge_to_faces: FxHashMap<EdgeKey, FxHashSet<FaceKey>>,

    // Undirected (min, max) vertex pair → edge
    pub(crate) edge_lookup: FxHashMap<(VertexKey, VertexKey), EdgeKey>,

    // Material slot names, indexed by slot
    pub(crate) materials: Vec<String>,
}

impl Mesh {
    /// Creates a new, empty mesh with a single default material slot.
    pub fn new() -> Self {
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            faces: SlotMap::with_key(),

            vertex_to_edges: FxHashMap::default(),
            edge_to_faces: FxHashMap::default(),

            edge_lookup: FxHashMap::default(),

            materials: vec![DEFAULT_MATERIAL.to_string()],
        }
    }

    // --- Vertex operations ---

    /// Adds a vertex at the given 3D coordinates.
    pub fn add_vertex(&mut self, x: f64, y: f64, z: f64) -> VertexKey {
        self.vertices.insert(VertexData { x, y, z })
    }

    /// Returns the vertex data for the given key, or `None` if not found.
    pub fn vertex(&self, key: VertexKey) -> Option<&VertexData> {
        self.vertices.get(key)
    }

    /// Returns the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    // --- Edge operations ---

    /// Returns the edge data for the given key, or `None` if not found.
    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeData> {
        self.edges.get(key)
    }

    /// Returns the number of edges in the mesh.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Looks up the edge joining two vertices, in either direction.
    pub fn find_edge(&self, a: VertexKey, b: VertexKey) -> Option<EdgeKey> {
        self.edge_lookup.get(&edge_pair(a, b)).copied()
    }

    // --- Face operations ---

    /// Returns the face data for the given key, or `None` if not found.
    pub fn face(&self, key: FaceKey) -> Option<&FaceData> {
        self.faces.get(key)
    }

    /// Returns the number of faces in the mesh.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    // --- Element existence checks ---

    /// Returns `true` if the given key references a live element.
    pub fn contains(&self, key: MeshKey) -> bool {
        match key {
            MeshKey::Vertex(k) => self.vertices.contains_key(k),
            MeshKey::Edge(k) => self.edges.contains_key(k),
            MeshKey::Face(k) => self.faces.contains_key(k),
        }
    }

    // --- Adjacency index helpers ---

    /// Register that an edge uses a vertex (upward adjacency).
    pub(crate) fn link_vertex_edge(&mut self, vertex: VertexKey, edge: EdgeKey) {
        self.vertex_to_edges
            .entry(vertex)
            .or_default()
            .insert(edge);
    }

    /// Register that a face uses an edge (upward adjacency).
    pub(crate) fn link_edge_face(&mut self, edge: EdgeKey, face: FaceKey) {
        self.edge_to_faces.entry(edge).or_default().insert(face);
    }

    pub(crate) fn unlink_edge_face(&mut self, edge: EdgeKey, face: FaceKey) {
        if let Some(set) = self.edge_to_faces.get_mut(&edge) {
            set.remove(&face);
            if set.is_empty() {
                self.edge_to_faces.remove(&edge);
            }
        }
    }

    pub(crate) fn unlink_vertex_edge(&mut self, vertex: VertexKey, edge: EdgeKey) {
        if let Some(set) = self.vertex_to_edges.get_mut(&vertex) {
            set.remove(&edge);
            if set.is_empty() {
                self.vertex_to_edges.remove(&vertex);
            }
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical key for an undirected vertex pair.
pub(crate) fn edge_pair(a: VertexKey, b: VertexKey) -> (VertexKey, VertexKey) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
