// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Merging adjacent faces across shared edges.

use tracing::debug;

use crate::error::{Error, Result};
use crate::keys::*;
use crate::mesh::Mesh;

impl Mesh {
    /// Merges face `b` into face `a` across their single shared edge.
    ///
    /// `a` keeps its key and material; `b` and the shared edge are removed.
    pub fn join_faces(&mut self, a: FaceKey, b: FaceKey) -> Result<FaceKey> {
        if a == b {
            return Err(Error::degenerate("cannot join a face with itself"));
        }
        let fa = self.faces.get(a).ok_or(Error::FaceNotFound(a))?;
        let fb = self.faces.get(b).ok_or(Error::FaceNotFound(b))?;

        let shared: Vec<EdgeKey> = fa
            .edges
            .iter()
            .filter(|e| fb.edges.contains(e))
            .copied()
            .collect();
        if shared.len() != 1 {
            return Err(Error::DegenerateGeometry(format!(
                "faces share {} edges, expected exactly one",
                shared.len()
            )));
        }
        let edge = shared[0];

        let loop_a = fa.vertices.clone();
        let mut loop_b = fb.vertices.clone();
        let na = loop_a.len();
        let ia = fa
            .edges
            .iter()
            .position(|&e| e == edge)
            .ok_or(Error::EdgeNotFound(edge))?;
        let (x, y) = (loop_a[ia], loop_a[(ia + 1) % na]);

        // `b` must cross the edge as y -> x; flip it if it was wound the
        // other way.
        let nb = loop_b.len();
        let crosses = |l: &[VertexKey]| (0..nb).find(|&j| l[j] == y && l[(j + 1) % nb] == x);
        let j = match crosses(&loop_b) {
            Some(j) => j,
            None => {
                loop_b.reverse();
                crosses(&loop_b).ok_or_else(|| Error::degenerate("shared edge missing from face loop"))?
            }
        };

        let mut merged = Vec::with_capacity(na + nb - 2);
        for k in 0..na {
            merged.push(loop_a[(ia + 1 + k) % na]);
        }
        for k in 2..nb {
            merged.push(loop_b[(j + k) % nb]);
        }

        self.set_face_loop(a, &merged)?;
        self.remove_face(b)?;
        self.prune_edges(&[edge]);
        Ok(a)
    }

    /// Repeatedly joins neighbouring faces of the set whose normals differ
    /// by at most `max_angle` radians. Returns the surviving faces, sorted.
    pub fn dissolve_coplanar(&mut self, faces: &[FaceKey], max_angle: f64) -> Result<Vec<FaceKey>> {
        let mut live: Vec<FaceKey> = faces.to_vec();
        live.sort();
        live.dedup();
        let min_cos = max_angle.cos();
        let mut joins = 0usize;

        loop {
            let mut pairs = Vec::new();
            for &a in &live {
                let Some(na) = self.face_normal(a) else {
                    continue;
                };
                for b in self.face_neighbours(a) {
                    if !live.contains(&b) {
                        continue;
                    }
                    match self.face_normal(b) {
                        Some(nb) if na.dot(&nb) >= min_cos => pairs.push((a, b)),
                        _ => {}
                    }
                }
            }

            let mut joined = None;
            for (a, b) in pairs {
                if self.join_faces(a, b).is_ok() {
                    joined = Some(b);
                    break;
                }
            }
            match joined {
                Some(b) => {
                    live.retain(|&f| f != b);
                    joins += 1;
                }
                None => break,
            }
        }

        debug!(joins, remaining = live.len(), "dissolved coplanar faces");
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::make_quad;
    use approx::assert_relative_eq;

    fn strip(mesh: &mut Mesh, z_right: f64) -> (FaceKey, FaceKey) {
        let v0 = mesh.add_vertex(0.0, 0.0, 0.0);
        let v1 = mesh.add_vertex(1.0, 0.0, 0.0);
        let v2 = mesh.add_vertex(2.0, 0.0, z_right);
        let v3 = mesh.add_vertex(2.0, 1.0, z_right);
        let v4 = mesh.add_vertex(1.0, 1.0, 0.0);
        let v5 = mesh.add_vertex(0.0, 1.0, 0.0);
        let a = make_quad(mesh, v0, v1, v4, v5).unwrap();
        let b = make_quad(mesh, v1, v2, v3, v4).unwrap();
        (a, b)
    }

    #[test]
    fn join_two_quads() {
        let mut mesh = Mesh::new();
        let (a, b) = strip(&mut mesh, 0.0);
        let merged = mesh.join_faces(a, b).unwrap();

        assert_eq!(merged, a);
        assert!(!mesh.contains(b.into()));
        assert_eq!(mesh.face(a).unwrap().vertices.len(), 6);
        assert_relative_eq!(mesh.face_area(a).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.face_normal(a).unwrap().z, 1.0, epsilon = 1e-12);
        assert_eq!(mesh.edge_count(), 6);
    }

    #[test]
    fn join_requires_shared_edge() {
        let mut mesh = Mesh::new();
        let (a, _) = strip(&mut mesh, 0.0);
        let v0 = mesh.add_vertex(5.0, 0.0, 0.0);
        let v1 = mesh.add_vertex(6.0, 0.0, 0.0);
        let v2 = mesh.add_vertex(6.0, 1.0, 0.0);
        let far = mesh.add_face(&[v0, v1, v2], 0).unwrap();
        assert!(mesh.join_faces(a, far).is_err());
    }

    #[test]
    fn dissolve_respects_angle() {
        let mut mesh = Mesh::new();
        let (a, b) = strip(&mut mesh, 1.0);
        // 45 degree fold stays.
        let kept = mesh.dissolve_coplanar(&[a, b], 0.1).unwrap();
        assert_eq!(kept.len(), 2);

        let mut flat = Mesh::new();
        let (a, b) = strip(&mut flat, 0.0);
        let kept = flat.dissolve_coplanar(&[a, b], 0.1).unwrap();
        assert_eq!(kept, vec![a]);
    }
}
