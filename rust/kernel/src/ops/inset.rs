// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face inset: shrink a face inside its own plane and ring it with quads.

use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};
use crate::geometry::{newell_vector, EPSILON};
use crate::keys::*;
use crate::mesh::Mesh;

/// Offsets a planar loop inside its plane by `amount` (positive = inward).
///
/// Every edge moves by exactly `amount` along its inward normal; vertices
/// follow the mitre of their two edges. Returns `None` when an edge has
/// zero length or two consecutive edges fold back onto each other.
pub fn offset_polygon(points: &[Point3<f64>], normal: &Vector3<f64>, amount: f64) -> Option<Vec<Point3<f64>>> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mut inward = Vec::with_capacity(n);
    for i in 0..n {
        let d = points[(i + 1) % n] - points[i];
        let len = d.norm();
        if len < EPSILON {
            return None;
        }
        inward.push(normal.cross(&(d / len)));
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let m0 = inward[(i + n - 1) % n];
        let m1 = inward[i];
        let denom = 1.0 + m0.dot(&m1);
        if denom < 1e-6 {
            return None;
        }
        out.push(points[i] + (m0 + m1) * (amount / denom));
    }
    Some(out)
}

impl Mesh {
    /// Insets a face by `amount`.
    ///
    /// The face keeps its key and material and is moved onto a smaller copy
    /// of its loop; one border quad per original edge fills the gap. Returns
    /// the inner face and the border quads in loop order.
    ///
    /// Fails with [`Error::DegenerateGeometry`] without touching the mesh when
    /// the amount is not positive, reaches half the face's smaller extent, or
    /// would invert or collapse any resulting face.
    pub fn inset_face(&mut self, face: FaceKey, amount: f64) -> Result<(FaceKey, Vec<FaceKey>)> {
        let data = self.faces.get(face).ok_or(Error::FaceNotFound(face))?;
        let outer = data.vertices.clone();
        let material = data.material;

        if amount <= 0.0 {
            return Err(Error::DegenerateGeometry(format!("inset amount {amount} must be positive")));
        }
        let (width, height) = self
            .face_extents(face)
            .ok_or_else(|| Error::degenerate("face has no normal"))?;
        if amount >= width.min(height) / 2.0 {
            return Err(Error::DegenerateGeometry(format!(
                "inset amount {amount} too large for a {width:.4} x {height:.4} face"
            )));
        }

        let points = self
            .face_points(face)
            .ok_or_else(|| Error::degenerate("face points unavailable"))?;
        let normal = self
            .face_normal(face)
            .ok_or_else(|| Error::degenerate("face has no normal"))?;
        let inner = offset_polygon(&points, &normal, amount)
            .ok_or_else(|| Error::degenerate("inset loop folds over itself"))?;

        if newell_vector(&inner).dot(&normal) <= EPSILON {
            return Err(Error::degenerate("inset loop is inverted"));
        }
        let n = points.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let quad = [points[i], points[j], inner[j], inner[i]];
            if newell_vector(&quad).dot(&normal) <= EPSILON {
                return Err(Error::degenerate("inset border collapses"));
            }
        }

        let inner_keys: Vec<VertexKey> = inner.iter().map(|p| self.add_vertex_at(p)).collect();
        let mut borders = Vec::with_capacity(n);
        for i in 0..n {
            let j = (i + 1) % n;
            borders.push(self.add_face(&[outer[i], outer[j], inner_keys[j], inner_keys[i]], material)?);
        }
        self.set_face_loop(face, &inner_keys)?;

        Ok((face, borders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::make_quad;
    use approx::assert_relative_eq;

    fn wall(mesh: &mut Mesh, width: f64, height: f64) -> FaceKey {
        let v0 = mesh.add_vertex(0.0, 0.0, 0.0);
        let v1 = mesh.add_vertex(width, 0.0, 0.0);
        let v2 = mesh.add_vertex(width, 0.0, height);
        let v3 = mesh.add_vertex(0.0, 0.0, height);
        make_quad(mesh, v0, v1, v2, v3).unwrap()
    }

    #[test]
    fn offset_square_moves_edges_evenly() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let inner = offset_polygon(&points, &Vector3::z(), 0.25).unwrap();
        assert_relative_eq!(inner[0].x, 0.25, epsilon = 1e-12);
        assert_relative_eq!(inner[0].y, 0.25, epsilon = 1e-12);
        assert_relative_eq!(inner[2].x, 1.75, epsilon = 1e-12);
        assert_relative_eq!(inner[2].y, 1.75, epsilon = 1e-12);
    }

    #[test]
    fn inset_keeps_face_and_adds_ring() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 2.0, 1.0);
        let (inner, borders) = mesh.inset_face(face, 0.1).unwrap();

        assert_eq!(inner, face);
        assert_eq!(borders.len(), 4);
        assert_relative_eq!(mesh.face_area(inner).unwrap(), 1.8 * 0.8, epsilon = 1e-10);
        let ring: f64 = borders.iter().map(|&b| mesh.face_area(b).unwrap()).sum();
        assert_relative_eq!(ring + 1.8 * 0.8, 2.0, epsilon = 1e-10);
        for &b in &borders {
            assert_relative_eq!(mesh.face_normal(b).unwrap().y, -1.0, epsilon = 1e-10);
        }
        assert_eq!(mesh.open_edges().len(), 4);
    }

    #[test]
    fn inset_too_large_leaves_mesh_unchanged() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 2.0, 1.0);
        let before = mesh.signature();

        let err = mesh.inset_face(face, 0.5).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry(_)));
        assert_eq!(mesh.signature(), before);
        assert!(mesh.inset_face(face, 0.0).is_err());
    }

    #[test]
    fn inset_triangle() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(0.0, 0.0, 0.0);
        let b = mesh.add_vertex(4.0, 0.0, 0.0);
        let c = mesh.add_vertex(0.0, 4.0, 0.0);
        let face = mesh.add_face(&[a, b, c], 0).unwrap();

        let (inner, borders) = mesh.inset_face(face, 0.2).unwrap();
        assert_eq!(borders.len(), 3);
        assert!(mesh.face_area(inner).unwrap() < 8.0);
        assert!(mesh.face_normal(inner).unwrap().z > 0.99);
    }
}
