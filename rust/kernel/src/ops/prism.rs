// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closed prisms and boxes, the building blocks of posts, rails and steps.

use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};
use crate::geometry::{newell_vector, EPSILON};
use crate::keys::*;
use crate::mesh::Mesh;

/// Faces of a closed prism.
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    pub bottom: FaceKey,
    pub top: FaceKey,
    pub sides: Vec<FaceKey>,
}

impl Prism {
    /// All faces, bottom first and top last.
    pub fn faces(&self) -> Vec<FaceKey> {
        let mut out = Vec::with_capacity(self.sides.len() + 2);
        out.push(self.bottom);
        out.extend(self.sides.iter().copied());
        out.push(self.top);
        out
    }
}

/// Sweeps a planar base polygon along `vector` into a closed prism.
///
/// The base may be wound either way; all faces end up pointing outward.
pub fn build_prism(mesh: &mut Mesh, base: &[Point3<f64>], vector: &Vector3<f64>, material: usize) -> Result<Prism> {
    if base.len() < 3 {
        return Err(Error::degenerate("prism base needs at least 3 points"));
    }
    if vector.norm() < EPSILON {
        return Err(Error::degenerate("prism height is zero"));
    }
    let lean = newell_vector(base).dot(vector);
    if lean.abs() < EPSILON {
        return Err(Error::degenerate("prism base is parallel to its sweep"));
    }

    let mut ring: Vec<VertexKey> = base.iter().map(|p| mesh.add_vertex_at(p)).collect();
    if lean < 0.0 {
        ring.reverse();
    }

    let top = mesh.add_face(&ring, material)?;
    let (sides, top) = mesh.extrude_face(top, vector)?;
    ring.reverse();
    let bottom = mesh.add_face(&ring, material)?;

    Ok(Prism { bottom, top, sides })
}

/// Builds an axis-spanning box from a corner and three edge vectors.
pub fn build_box(
    mesh: &mut Mesh,
    origin: Point3<f64>,
    x: Vector3<f64>,
    y: Vector3<f64>,
    z: Vector3<f64>,
    material: usize,
) -> Result<Prism> {
    let base = [origin, origin + x, origin + x + y, origin + y];
    build_prism(mesh, &base, &z, material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn box_is_closed_and_outward() {
        let mut mesh = Mesh::new();
        let prism = build_box(
            &mut mesh,
            Point3::origin(),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, 0.0, 3.0),
            0,
        )
        .unwrap();

        assert_eq!(prism.faces().len(), 6);
        assert!(mesh.is_closed());
        assert_eq!(mesh.vertex_count(), 8);
        let centre = Point3::new(0.5, 1.0, 1.5);
        for f in prism.faces() {
            let c = mesh.face_centroid(f).unwrap();
            assert!(mesh.face_normal(f).unwrap().dot(&(c - centre)) > 0.0);
        }
        assert_relative_eq!(mesh.face_normal(prism.bottom).unwrap().z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn clockwise_base_is_reoriented() {
        let mut mesh = Mesh::new();
        let base = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let prism = build_prism(&mut mesh, &base, &Vector3::new(0.0, 0.0, 1.0), 0).unwrap();
        assert_relative_eq!(mesh.face_normal(prism.top).unwrap().z, 1.0, epsilon = 1e-12);
        assert!(mesh.is_closed());
    }

    #[test]
    fn flat_sweep_is_rejected() {
        let mut mesh = Mesh::new();
        let base = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert!(build_prism(&mut mesh, &base, &Vector3::new(1.0, 0.0, 0.0), 0).is_err());
    }
}
