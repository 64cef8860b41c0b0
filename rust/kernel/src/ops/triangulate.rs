// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::{Error, Result};
use crate::geometry::{newell_vector, EPSILON};
use crate::keys::*;
use crate::mesh::Mesh;

impl Mesh {
    /// Replaces a face by triangles with the same material.
    ///
    /// Triangles are returned in earcut order. A triangle is returned as-is.
    pub fn triangulate(&mut self, face: FaceKey) -> Result<Vec<FaceKey>> {
        let data = self.faces.get(face).ok_or(Error::FaceNotFound(face))?;
        if data.vertices.len() == 3 {
            return Ok(vec![face]);
        }
        let material = data.material;
        let triangles = self
            .triangulate_face(face)
            .ok_or_else(|| Error::degenerate("face cannot be triangulated"))?;

        // Earcut may emit slivers over collinear runs; they carry no area.
        let mut keep = Vec::with_capacity(triangles.len());
        for (a, b, c) in triangles {
            let pts = [a, b, c]
                .iter()
                .map(|&v| self.vertex_point(v).ok_or(Error::VertexNotFound(v)))
                .collect::<Result<Vec<_>>>()?;
            if newell_vector(&pts).norm() > EPSILON {
                keep.push([a, b, c]);
            }
        }
        if keep.is_empty() {
            return Err(Error::degenerate("face triangulates to nothing"));
        }

        let old = self.remove_face(face)?;
        let mut out = Vec::with_capacity(keep.len());
        for tri in keep {
            out.push(self.add_face(&tri, material)?);
        }
        self.prune_edges(&old.edges);
        Ok(out)
    }
}
