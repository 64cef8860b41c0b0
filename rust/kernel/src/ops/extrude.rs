// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Region extrusion.

use nalgebra::Vector3;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::EPSILON;
use crate::keys::*;
use crate::mesh::Mesh;

/// Faces produced by an extrusion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extrusion {
    /// One quad per boundary edge of the region, in boundary order.
    pub sides: Vec<FaceKey>,
    /// The moved region faces. Keys are unchanged from the input.
    pub caps: Vec<FaceKey>,
}

impl Mesh {
    /// Extrudes a connected face region along `vector`.
    ///
    /// The region's vertices are duplicated and offset; the region faces are
    /// moved onto the copies (keeping their keys and materials) and a quad is
    /// stitched along every boundary edge. Side quads take the material of
    /// the region face they border and face away from the region. Interior
    /// edges of the old region are removed.
    ///
    /// A zero vector is a no-op that returns the region as its own caps.
    pub fn extrude_region(&mut self, faces: &[FaceKey], vector: &Vector3<f64>) -> Result<Extrusion> {
        if let Some(&missing) = faces.iter().find(|&&f| !self.faces.contains_key(f)) {
            return Err(Error::FaceNotFound(missing));
        }
        if vector.norm() < EPSILON {
            return Ok(Extrusion {
                sides: Vec::new(),
                caps: faces.to_vec(),
            });
        }

        let boundary = self.region_boundary(faces);

        let mut moved: FxHashMap<VertexKey, VertexKey> = FxHashMap::default();
        let mut old_edges: FxHashSet<EdgeKey> = FxHashSet::default();
        for &fk in faces {
            let data = &self.faces[fk];
            old_edges.extend(data.edges.iter().copied());
            for vk in data.vertices.clone() {
                if moved.contains_key(&vk) {
                    continue;
                }
                let p = self.vertex_point(vk).ok_or(Error::VertexNotFound(vk))?;
                let copy = self.add_vertex_at(&(p + vector));
                moved.insert(vk, copy);
            }
        }

        let mut sides = Vec::with_capacity(boundary.len());
        for &(a, b, owner) in &boundary {
            let material = self.faces[owner].material;
            let side = self.add_face(&[a, b, moved[&b], moved[&a]], material)?;
            sides.push(side);
        }

        for &fk in faces {
            let lifted: Vec<VertexKey> = self.faces[fk].vertices.iter().map(|v| moved[v]).collect();
            self.set_face_loop(fk, &lifted)?;
        }

        let mut old_edges: Vec<EdgeKey> = old_edges.into_iter().collect();
        old_edges.sort();
        self.prune_edges(&old_edges);

        debug!(
            faces = faces.len(),
            sides = sides.len(),
            "extruded region"
        );

        Ok(Extrusion {
            sides,
            caps: faces.to_vec(),
        })
    }

    /// Extrudes a single face. Returns the side quads and the moved face.
    pub fn extrude_face(&mut self, face: FaceKey, vector: &Vector3<f64>) -> Result<(Vec<FaceKey>, FaceKey)> {
        let extrusion = self.extrude_region(&[face], vector)?;
        Ok((extrusion.sides, face))
    }
}
