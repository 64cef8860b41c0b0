// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Construction and removal of mesh elements.
//!
//! Every element is created through the mesh, which ensures referential
//! integrity (all referenced sub-elements must exist) and keeps the
//! adjacency index and edge lookup in sync.

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::geometry::{newell_vector, EPSILON};
use crate::keys::*;
use crate::mesh::*;

impl Mesh {
    /// Adds a vertex at a nalgebra point.
    pub fn add_vertex_at(&mut self, p: &Point3<f64>) -> VertexKey {
        self.add_vertex(p.x, p.y, p.z)
    }

    /// Moves an existing vertex.
    pub fn set_vertex_position(&mut self, key: VertexKey, p: &Point3<f64>) -> Result<()> {
        let v = self
            .vertices
            .get_mut(key)
            .ok_or(Error::VertexNotFound(key))?;
        v.x = p.x;
        v.y = p.y;
        v.z = p.z;
        Ok(())
    }

    /// Returns the edge joining two vertices, creating it if needed.
    pub fn ensure_edge(&mut self, a: VertexKey, b: VertexKey) -> Result<EdgeKey> {
        if !self.vertices.contains_key(a) {
            return Err(Error::VertexNotFound(a));
        }
        if !self.vertices.contains_key(b) {
            return Err(Error::VertexNotFound(b));
        }
        if a == b {
            return Err(Error::degenerate("edge endpoints are the same vertex"));
        }
        if let Some(existing) = self.find_edge(a, b) {
            return Ok(existing);
        }

        let key = self.edges.insert(EdgeData { start: a, end: b });
        self.link_vertex_edge(a, key);
        self.link_vertex_edge(b, key);
        self.edge_lookup.insert(edge_pair(a, b), key);
        Ok(key)
    }

    /// Creates a face from an ordered vertex loop.
    ///
    /// The loop must have at least three distinct vertices and enclose a
    /// non-zero area. Edges between consecutive vertices are created or
    /// reused.
    pub fn add_face(&mut self, vertices: &[VertexKey], material: usize) -> Result<FaceKey> {
        self.validate_loop(vertices)?;

        let mut edges = Vec::with_capacity(vertices.len());
        for i in 0..vertices.len() {
            let next = vertices[(i + 1) % vertices.len()];
            edges.push(self.ensure_edge(vertices[i], next)?);
        }

        let key = self.faces.insert(FaceData {
            vertices: vertices.to_vec(),
            edges: edges.clone(),
            material,
        });
        for ek in edges {
            self.link_edge_face(ek, key);
        }
        Ok(key)
    }

    /// Detaches a face from the mesh and returns its data.
    ///
    /// Edges and vertices are kept even if nothing else uses them; see
    /// [`Mesh::delete_face`] for the pruning variant.
    pub fn remove_face(&mut self, face: FaceKey) -> Result<FaceData> {
        let data = self.faces.remove(face).ok_or(Error::FaceNotFound(face))?;
        for &ek in &data.edges {
            self.unlink_edge_face(ek, face);
        }
        Ok(data)
    }

    /// Deletes a face together with any edges and vertices left unused.
    ///
    /// Keys of the removed elements stop resolving.
    pub fn delete_face(&mut self, face: FaceKey) -> Result<()> {
        let data = self.remove_face(face)?;
        self.prune_edges(&data.edges);
        Ok(())
    }

    /// Deletes several faces, pruning shared leftovers once.
    pub fn delete_faces(&mut self, faces: &[FaceKey]) -> Result<()> {
        if let Some(&missing) = faces.iter().find(|&&f| !self.faces.contains_key(f)) {
            return Err(Error::FaceNotFound(missing));
        }
        let mut touched = Vec::new();
        for &fk in faces {
            if let Ok(data) = self.remove_face(fk) {
                touched.extend(data.edges);
            }
        }
        self.prune_edges(&touched);
        Ok(())
    }

    /// Removes edges (from the candidates) that no face uses anymore, and
    /// any vertex left without edges by that removal.
    pub(crate) fn prune_edges(&mut self, candidates: &[EdgeKey]) {
        for &ek in candidates {
            if self.edge_to_faces.contains_key(&ek) {
                continue;
            }
            let Some(edge) = self.edges.remove(ek) else {
                continue;
            };
            self.edge_lookup.remove(&edge_pair(edge.start, edge.end));
            self.unlink_vertex_edge(edge.start, ek);
            self.unlink_vertex_edge(edge.end, ek);
            for vk in [edge.start, edge.end] {
                if !self.vertex_to_edges.contains_key(&vk) {
                    self.vertices.remove(vk);
                }
            }
        }
    }

    /// Removes vertices that no edge references.
    pub fn prune_isolated_vertices(&mut self) -> usize {
        let isolated: Vec<VertexKey> = self
            .vertices
            .keys()
            .filter(|vk| !self.vertex_to_edges.contains_key(vk))
            .collect();
        for &vk in &isolated {
            self.vertices.remove(vk);
        }
        isolated.len()
    }

    /// Replaces the vertex loop of an existing face, keeping its key and
    /// material. Edges that lose their last face are left in place.
    pub fn set_face_loop(&mut self, face: FaceKey, vertices: &[VertexKey]) -> Result<()> {
        if !self.faces.contains_key(face) {
            return Err(Error::FaceNotFound(face));
        }
        self.validate_loop(vertices)?;

        let mut edges = Vec::with_capacity(vertices.len());
        for i in 0..vertices.len() {
            let next = vertices[(i + 1) % vertices.len()];
            edges.push(self.ensure_edge(vertices[i], next)?);
        }

        let old_edges = std::mem::take(&mut self.faces[face].edges);
        for ek in old_edges {
            self.unlink_edge_face(ek, face);
        }
        for &ek in &edges {
            self.link_edge_face(ek, face);
        }
        let data = &mut self.faces[face];
        data.vertices = vertices.to_vec();
        data.edges = edges;
        Ok(())
    }

    /// Inserts new vertices along the edge `a`–`b`.
    ///
    /// `points` are ordered from `a` towards `b`. Every face using the edge
    /// gets the new vertices spliced into its loop in the matching direction,
    /// so neighbours stay watertight. The original edge is removed.
    pub fn split_edge(
        &mut self,
        a: VertexKey,
        b: VertexKey,
        points: &[Point3<f64>],
    ) -> Result<Vec<VertexKey>> {
        let edge = self
            .find_edge(a, b)
            .ok_or_else(|| Error::degenerate("split_edge: vertices are not joined by an edge"))?;
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let inserted: Vec<VertexKey> = points.iter().map(|p| self.add_vertex_at(p)).collect();

        let mut users: Vec<FaceKey> = self.edge_faces(edge);
        users.sort();
        for fk in users {
            let loop_vertices = self.faces[fk].vertices.clone();
            let n = loop_vertices.len();
            let mut spliced = Vec::with_capacity(n + inserted.len());
            for i in 0..n {
                let cur = loop_vertices[i];
                let next = loop_vertices[(i + 1) % n];
                spliced.push(cur);
                if cur == a && next == b {
                    spliced.extend(inserted.iter().copied());
                } else if cur == b && next == a {
                    spliced.extend(inserted.iter().rev().copied());
                }
            }
            self.set_face_loop(fk, &spliced)?;
        }

        // Faceless edges still need the chain so the polyline stays connected
        let mut chain = Vec::with_capacity(inserted.len() + 2);
        chain.push(a);
        chain.extend(inserted.iter().copied());
        chain.push(b);
        for pair in chain.windows(2) {
            self.ensure_edge(pair[0], pair[1])?;
        }
        self.remove_edge(edge);

        Ok(inserted)
    }

    /// Removes an edge that no face uses anymore. Vertices are kept.
    fn remove_edge(&mut self, edge: EdgeKey) {
        if self.edge_to_faces.contains_key(&edge) {
            return;
        }
        if let Some(data) = self.edges.remove(edge) {
            self.edge_lookup.remove(&edge_pair(data.start, data.end));
            self.unlink_vertex_edge(data.start, edge);
            self.unlink_vertex_edge(data.end, edge);
        }
    }

    fn validate_loop(&self, vertices: &[VertexKey]) -> Result<()> {
        if vertices.len() < 3 {
            return Err(Error::degenerate("face loop needs at least 3 vertices"));
        }
        for &vk in vertices {
            if !self.vertices.contains_key(vk) {
                return Err(Error::VertexNotFound(vk));
            }
        }
        for (i, &vk) in vertices.iter().enumerate() {
            if vertices[i + 1..].contains(&vk) {
                return Err(Error::degenerate("face loop repeats a vertex"));
            }
        }

        let points: Vec<Point3<f64>> = vertices
            .iter()
            .filter_map(|&vk| self.vertex_point(vk))
            .collect();
        if newell_vector(&points).norm() > EPSILON {
            Ok(())
        } else {
            Err(Error::degenerate("face loop encloses no area"))
        }
    }
}

/// Creates a quad face from four vertices.
///
/// Convenience helper used throughout the crate's tests and by generators
/// building boxes.
pub fn make_quad(
    mesh: &mut Mesh,
    v0: VertexKey,
    v1: VertexKey,
    v2: VertexKey,
    v3: VertexKey,
) -> Result<FaceKey> {
    mesh.add_face(&[v0, v1, v2, v3], 0)
}
