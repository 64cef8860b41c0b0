// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric queries on mesh elements.
//!
//! Computes lengths, areas, normals, centroids, local frames and
//! triangulations using standard computational geometry algorithms (no
//! external kernel required).

use nalgebra::{Point2, Point3, Vector3};

use crate::keys::*;
use crate::mesh::Mesh;

/// Absolute tolerance for degeneracy checks.
pub const EPSILON: f64 = 1e-9;

/// Unnormalized Newell vector of a polygon. Its length is twice the area.
pub fn newell_vector(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    let n = points.len();
    if n < 3 {
        return normal;
    }

    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];

        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

/// Unit normal of a polygon by Newell's method, or `None` when degenerate.
pub fn polygon_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let normal = newell_vector(points);
    let len = normal.norm();
    if len < 1e-15 {
        return None;
    }
    Some(normal / len)
}

/// Area of a planar polygon.
pub fn polygon_area(points: &[Point3<f64>]) -> f64 {
    newell_vector(points).norm() / 2.0
}

/// Returns `true` if the polygon is convex with respect to `normal`.
///
/// Collinear vertices are tolerated.
pub fn is_convex_polygon(points: &[Point3<f64>], normal: &Vector3<f64>) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let turn = (b - a).cross(&(c - b)).dot(normal);
        if turn < -EPSILON {
            return false;
        }
    }
    true
}

/// Right-handed orthonormal frame attached to a planar polygon.
///
/// `bitangent` points "up": world +Z projected into the plane, or world +Y
/// for (near) horizontal planes. `tangent × bitangent = normal`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFrame {
    pub origin: Point3<f64>,
    pub tangent: Vector3<f64>,
    pub bitangent: Vector3<f64>,
    pub normal: Vector3<f64>,
}

impl LocalFrame {
    /// Builds a frame from an origin and a unit normal.
    pub fn from_normal(origin: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self::from_normal_and_up(origin, normal, Vector3::z())
    }

    /// Builds a frame whose bitangent follows `up` projected into the plane.
    pub fn from_normal_and_up(origin: Point3<f64>, normal: Vector3<f64>, up: Vector3<f64>) -> Self {
        let projected = up - normal * up.dot(&normal);
        let bitangent = if projected.norm() > 1e-6 {
            projected.normalize()
        } else {
            // Plane faces along `up`; fall back to a horizontal reference.
            let reference = if normal.y.abs() < 0.9 {
                Vector3::y()
            } else {
                Vector3::x()
            };
            (reference - normal * reference.dot(&normal)).normalize()
        };
        let tangent = bitangent.cross(&normal);
        Self {
            origin,
            tangent,
            bitangent,
            normal,
        }
    }

    /// Projects a point into the frame's plane coordinates.
    pub fn to_local(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.tangent), d.dot(&self.bitangent))
    }
}

impl Mesh {
    /// Returns the 3D position of a vertex as a nalgebra Point3.
    pub fn vertex_point(&self, key: VertexKey) -> Option<Point3<f64>> {
        self.vertices
            .get(key)
            .map(|v| Point3::new(v.x, v.y, v.z))
    }

    /// Returns the loop positions of a face.
    pub fn face_points(&self, key: FaceKey) -> Option<Vec<Point3<f64>>> {
        let face = self.faces.get(key)?;
        face.vertices
            .iter()
            .map(|&vk| self.vertex_point(vk))
            .collect()
    }

    /// Computes the face normal using Newell's method.
    ///
    /// Works for any planar polygon (convex or concave). The normal direction
    /// follows the right-hand rule relative to the vertex winding order.
    pub fn face_normal(&self, key: FaceKey) -> Option<Vector3<f64>> {
        polygon_normal(&self.face_points(key)?)
    }

    /// Computes the area of a face.
    pub fn face_area(&self, key: FaceKey) -> Option<f64> {
        Some(polygon_area(&self.face_points(key)?))
    }

    /// Computes the centroid (vertex average) of a face.
    pub fn face_centroid(&self, key: FaceKey) -> Option<Point3<f64>> {
        let points = self.face_points(key)?;
        if points.is_empty() {
            return None;
        }
        let sum = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / points.len() as f64))
    }

    /// Local frame of a face, origin at its centroid.
    pub fn face_frame(&self, key: FaceKey) -> Option<LocalFrame> {
        let normal = self.face_normal(key)?;
        let origin = self.face_centroid(key)?;
        Some(LocalFrame::from_normal(origin, normal))
    }

    /// Width and height of a face's bounding rectangle in its local frame.
    pub fn face_extents(&self, key: FaceKey) -> Option<(f64, f64)> {
        let frame = self.face_frame(key)?;
        let points = self.face_points(key)?;
        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &points {
            let q = frame.to_local(p);
            min_u = min_u.min(q.x);
            max_u = max_u.max(q.x);
            min_v = min_v.min(q.y);
            max_v = max_v.max(q.y);
        }
        Some((max_u - min_u, max_v - min_v))
    }

    /// Returns `true` if every loop vertex lies within `tolerance` of the
    /// face's best-fit plane.
    pub fn is_planar(&self, key: FaceKey, tolerance: f64) -> bool {
        let (Some(points), Some(normal), Some(centroid)) = (
            self.face_points(key),
            self.face_normal(key),
            self.face_centroid(key),
        ) else {
            return false;
        };
        points
            .iter()
            .all(|p| (p - centroid).dot(&normal).abs() <= tolerance)
    }

    /// Returns `true` if the face is convex.
    pub fn is_convex(&self, key: FaceKey) -> bool {
        match (self.face_points(key), self.face_normal(key)) {
            (Some(points), Some(normal)) => is_convex_polygon(&points, &normal),
            _ => false,
        }
    }

    /// Loop indices of the vertices where the boundary actually turns.
    ///
    /// Vertices lying on a straight run between two corners are skipped.
    pub fn face_corner_indices(&self, key: FaceKey) -> Option<Vec<usize>> {
        let points = self.face_points(key)?;
        let normal = polygon_normal(&points)?;
        let n = points.len();
        let corners = (0..n)
            .filter(|&i| {
                let prev = points[(i + n - 1) % n];
                let next = points[(i + 1) % n];
                let d0 = points[i] - prev;
                let d1 = next - points[i];
                let (l0, l1) = (d0.norm(), d1.norm());
                if l0 < EPSILON || l1 < EPSILON {
                    return false;
                }
                d0.cross(&d1).dot(&normal).abs() / (l0 * l1) > 1e-6
            })
            .collect();
        Some(corners)
    }

    /// Triangulates a face using ear clipping.
    ///
    /// Projects the face onto its dominant plane and runs earcut. Returns
    /// vertex key triples, wound like the face.
    pub fn triangulate_face(&self, key: FaceKey) -> Option<Vec<(VertexKey, VertexKey, VertexKey)>> {
        let face = self.faces.get(key)?;
        let verts = &face.vertices;

        if verts.len() < 3 {
            return None;
        }

        // Get face normal for projection
        let normal = self.face_normal(key)?;

        // Determine dominant axis for 2D projection
        let abs_n = Vector3::new(normal.x.abs(), normal.y.abs(), normal.z.abs());
        let (ax_u, ax_v) = if abs_n.z >= abs_n.x && abs_n.z >= abs_n.y {
            (0, 1) // project onto XY
        } else if abs_n.y >= abs_n.x {
            (2, 0) // project onto ZX
        } else {
            (1, 2) // project onto YZ
        };

        let mut coords_2d: Vec<f64> = Vec::with_capacity(verts.len() * 2);
        for &vk in verts {
            let p = self.vertex_point(vk)?;
            let c = [p.x, p.y, p.z];
            coords_2d.push(c[ax_u]);
            coords_2d.push(c[ax_v]);
        }

        let indices = earcutr::earcut(&coords_2d, &[], 2).ok()?;

        let mut triangles = Vec::with_capacity(indices.len() / 3);
        for chunk in indices.chunks(3) {
            if chunk.len() == 3 {
                let (a, b, c) = (verts[chunk[0]], verts[chunk[1]], verts[chunk[2]]);
                // Keep the winding consistent with the face normal.
                let tri = [self.vertex_point(a)?, self.vertex_point(b)?, self.vertex_point(c)?];
                if newell_vector(&tri).dot(&normal) >= 0.0 {
                    triangles.push((a, b, c));
                } else {
                    triangles.push((a, c, b));
                }
            }
        }

        Some(triangles)
    }

    /// Distance along a ray to the first hit on a face, if any.
    pub fn ray_face_distance(
        &self,
        key: FaceKey,
        origin: &Point3<f64>,
        dir: &Vector3<f64>,
    ) -> Option<f64> {
        let triangles = self.triangulate_face(key)?;
        let mut best: Option<f64> = None;
        for (a, b, c) in triangles {
            let (p0, p1, p2) = (
                self.vertex_point(a)?,
                self.vertex_point(b)?,
                self.vertex_point(c)?,
            );
            if let Some(t) = ray_intersects_triangle(origin, dir, &p0, &p1, &p2) {
                best = Some(best.map_or(t, |b| b.min(t)));
            }
        }
        best
    }
}

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the ray parameter of the hit (`t > 0`), or `None`.
fn ray_intersects_triangle(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    v0: &Point3<f64>,
    v1: &Point3<f64>,
    v2: &Point3<f64>,
) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < 1e-12 {
        return None; // ray parallel to triangle
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    if t > 1e-12 {
        Some(t)
    } else {
        None
    }
}
