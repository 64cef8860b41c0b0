// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridging two vertex loops with a ring of quads.

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::geometry::{newell_vector, EPSILON};
use crate::keys::*;
use crate::mesh::Mesh;

impl Mesh {
    /// Connects two closed loops of equal length with quads.
    ///
    /// Loop `b` is matched to loop `a` by trying every rotation in both
    /// directions and keeping the pairing with the smallest summed squared
    /// distance; ties keep the earliest candidate, so unrotated and
    /// unreversed wins. Quads follow the direction of loop `a` and use the
    /// default material.
    ///
    /// Nothing is added when any quad would have zero area.
    pub fn bridge_loops(&mut self, a: &[VertexKey], b: &[VertexKey]) -> Result<Vec<FaceKey>> {
        if a.len() != b.len() {
            return Err(Error::LoopMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        let n = a.len();
        if n < 3 {
            return Err(Error::degenerate("bridged loops need at least 3 vertices"));
        }

        let point = |vk: VertexKey| self.vertex_point(vk).ok_or(Error::VertexNotFound(vk));
        let pa: Vec<Point3<f64>> = a.iter().map(|&v| point(v)).collect::<Result<_>>()?;
        let pb: Vec<Point3<f64>> = b.iter().map(|&v| point(v)).collect::<Result<_>>()?;

        let mut best: Option<(f64, bool, usize)> = None;
        for reversed in [false, true] {
            for shift in 0..n {
                let cost: f64 = (0..n)
                    .map(|i| (pa[i] - pb[matched(i, shift, n, reversed)]).norm_squared())
                    .sum();
                if best.map_or(true, |(c, _, _)| cost < c - 1e-12) {
                    best = Some((cost, reversed, shift));
                }
            }
        }
        let Some((_, reversed, shift)) = best else {
            return Err(Error::degenerate("no loop pairing found"));
        };

        let quads: Vec<[VertexKey; 4]> = (0..n)
            .map(|i| {
                let j = (i + 1) % n;
                [
                    a[i],
                    a[j],
                    b[matched(j, shift, n, reversed)],
                    b[matched(i, shift, n, reversed)],
                ]
            })
            .collect();

        for quad in &quads {
            let pts: Vec<Point3<f64>> = quad.iter().map(|&v| point(v)).collect::<Result<_>>()?;
            if newell_vector(&pts).norm() <= EPSILON {
                return Err(Error::degenerate("bridge quad has zero area"));
            }
        }

        let mut faces = Vec::with_capacity(n);
        for quad in quads {
            faces.push(self.add_face(&quad, 0)?);
        }
        Ok(faces)
    }
}

/// Index into loop `b` paired with index `i` of loop `a`.
fn matched(i: usize, shift: usize, n: usize, reversed: bool) -> usize {
    if reversed {
        (shift + n - i % n) % n
    } else {
        (i + shift) % n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ring(mesh: &mut Mesh, size: f64, z: f64) -> Vec<VertexKey> {
        let h = size / 2.0;
        vec![
            mesh.add_vertex(-h, -h, z),
            mesh.add_vertex(h, -h, z),
            mesh.add_vertex(h, h, z),
            mesh.add_vertex(-h, h, z),
        ]
    }

    #[test]
    fn bridge_aligned_loops() {
        let mut mesh = Mesh::new();
        let a = ring(&mut mesh, 2.0, 0.0);
        let b = ring(&mut mesh, 2.0, 1.0);
        let quads = mesh.bridge_loops(&a, &b).unwrap();

        assert_eq!(quads.len(), 4);
        assert_eq!(mesh.face(quads[0]).unwrap().vertices, vec![a[0], a[1], b[1], b[0]]);
        for &q in &quads {
            assert_relative_eq!(mesh.face_area(q).unwrap(), 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn bridge_finds_rotation_and_direction() {
        let mut mesh = Mesh::new();
        let a = ring(&mut mesh, 2.0, 0.0);
        let mut b = ring(&mut mesh, 2.0, 1.0);
        b.reverse();
        b.rotate_left(1);

        let quads = mesh.bridge_loops(&a, &b).unwrap();
        for (i, &q) in quads.iter().enumerate() {
            let verts = &mesh.face(q).unwrap().vertices;
            let pa = mesh.vertex_point(a[i]).unwrap();
            let pb = mesh.vertex_point(verts[3]).unwrap();
            assert_relative_eq!(pa.x, pb.x, epsilon = 1e-12);
            assert_relative_eq!(pa.y, pb.y, epsilon = 1e-12);
        }
    }

    #[test]
    fn bridge_rejects_mismatched_loops() {
        let mut mesh = Mesh::new();
        let a = ring(&mut mesh, 2.0, 0.0);
        let b = ring(&mut mesh, 2.0, 1.0);
        let err = mesh.bridge_loops(&a, &b[..3]).unwrap_err();
        assert!(matches!(err, Error::LoopMismatch { left: 4, right: 3 }));
    }

    #[test]
    fn bridge_coincident_loops_fails_cleanly() {
        let mut mesh = Mesh::new();
        let a = ring(&mut mesh, 2.0, 0.0);
        let b = ring(&mut mesh, 2.0, 0.0);
        assert!(mesh.bridge_loops(&a, &b).is_err());
        assert_eq!(mesh.face_count(), 0);
    }
}
