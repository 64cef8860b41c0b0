// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Moving mesh elements.
//!
//! Translation modifies vertex coordinates in place. Since edges and faces
//! reference vertices through keys, moving vertices moves everything that
//! references them. A vertex shared by several selected faces moves once.

use nalgebra::Vector3;
use rustc_hash::FxHashSet;

use crate::keys::*;
use crate::mesh::Mesh;

impl Mesh {
    /// Translates all vertices referenced by the given elements.
    pub fn translate(&mut self, keys: &[MeshKey], offset: &Vector3<f64>) {
        for vk in self.collect_vertices(keys) {
            if let Some(v) = self.vertices.get_mut(vk) {
                v.x += offset.x;
                v.y += offset.y;
                v.z += offset.z;
            }
        }
    }

    /// Distinct vertex keys referenced by the elements, in first-seen order.
    pub fn collect_vertices(&self, keys: &[MeshKey]) -> Vec<VertexKey> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut push = |vk: VertexKey| {
            if seen.insert(vk) {
                out.push(vk);
            }
        };
        for &key in keys {
            match key {
                MeshKey::Vertex(vk) => push(vk),
                MeshKey::Edge(ek) => {
                    if let Some(e) = self.edges.get(ek) {
                        push(e.start);
                        push(e.end);
                    }
                }
                MeshKey::Face(fk) => {
                    if let Some(f) = self.faces.get(fk) {
                        f.vertices.iter().for_each(|&vk| push(vk));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::make_quad;
    use approx::assert_relative_eq;

    #[test]
    fn translate_vertex() {
        let mut mesh = Mesh::new();
        let vk = mesh.add_vertex(1.0, 2.0, 3.0);

        mesh.translate(&[vk.into()], &Vector3::new(10.0, 20.0, 30.0));

        let v = mesh.vertex(vk).unwrap();
        assert_relative_eq!(v.x, 11.0);
        assert_relative_eq!(v.y, 22.0);
        assert_relative_eq!(v.z, 33.0);
    }

    #[test]
    fn shared_vertices_move_once() {
        let mut mesh = Mesh::new();
        let v0 = mesh.add_vertex(0.0, 0.0, 0.0);
        let v1 = mesh.add_vertex(1.0, 0.0, 0.0);
        let v2 = mesh.add_vertex(1.0, 1.0, 0.0);
        let v3 = mesh.add_vertex(0.0, 1.0, 0.0);
        let v4 = mesh.add_vertex(2.0, 0.0, 0.0);
        let v5 = mesh.add_vertex(2.0, 1.0, 0.0);
        let a = make_quad(&mut mesh, v0, v1, v2, v3).unwrap();
        let b = make_quad(&mut mesh, v1, v4, v5, v2).unwrap();

        mesh.translate(&[a.into(), b.into()], &Vector3::new(0.0, 0.0, 1.0));

        assert_relative_eq!(mesh.vertex(v1).unwrap().z, 1.0);
        assert_relative_eq!(mesh.vertex(v5).unwrap().z, 1.0);
    }
}
