// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arched tops for openings.
//!
//! The top band of an opening face is replaced by a half ellipse spanning
//! the opening width. The band above the curve stays behind as wall; the
//! region under it becomes part of the opening. With detail enabled a second,
//! smaller ellipse cuts a moulding strip that is pushed out of the wall.

use nalgebra::{Point3, Vector3};
use storey_kernel::{FaceKey, GridLines, Mesh, VertexKey};
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::params::ArchParameters;
use crate::split::face_size;

/// Faces produced by [`build_arch`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArchResult {
    /// Rectangular part of the opening below the arch springs.
    pub lower: FaceKey,
    /// Region enclosed by the arch, `None` when no arch was built.
    pub arch: Option<FaceKey>,
    /// Wall left between the curve and the original top edge.
    pub remnant: Option<FaceKey>,
    /// Moulding strip and its extruded sides.
    pub detail: Vec<FaceKey>,
}

impl ArchResult {
    fn unchanged(face: FaceKey) -> Self {
        Self {
            lower: face,
            arch: None,
            remnant: None,
            detail: Vec::new(),
        }
    }

    /// Faces belonging to the opening itself.
    pub fn opening_faces(&self) -> Vec<FaceKey> {
        let mut out = vec![self.lower];
        out.extend(self.arch);
        out
    }
}

/// Samples a half ellipse from the right spring (k = 0) to the left one
/// (k = resolution).
struct HalfEllipse {
    centre: Point3<f64>,
    right: Vector3<f64>,
    up: Vector3<f64>,
    resolution: usize,
}

impl HalfEllipse {
    fn point(&self, a: f64, b: f64, k: usize) -> Point3<f64> {
        let theta = std::f64::consts::PI * k as f64 / self.resolution as f64;
        self.centre + self.right * (a * theta.cos()) + self.up * (b * theta.sin())
    }

    fn interior(&self, mesh: &mut Mesh, a: f64, b: f64) -> Vec<VertexKey> {
        (1..self.resolution).map(|k| mesh.add_vertex_at(&self.point(a, b, k))).collect()
    }
}

/// Replaces the top `offset` band of a quad-like face with an arch.
///
/// A resolution below 2 leaves the face untouched.
pub fn build_arch(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &ArchParameters,
    config: &GeneratorConfig,
) -> Result<ArchResult> {
    let resolution = (params.resolution as usize).min(config.max_arch_resolution);
    if resolution < 2 {
        return Ok(ArchResult::unchanged(face));
    }

    let (width, height) = face_size(mesh, face)?;
    if params.offset <= config.tolerance || params.offset >= height {
        return Err(Error::InvalidPlacement(format!(
            "arch offset {} must lie inside the {height:.4} m opening",
            params.offset
        )));
    }
    if params.height <= config.tolerance || params.height >= params.offset {
        return Err(Error::InvalidPlacement(format!(
            "arch rise {} must be positive and below the offset {}",
            params.height, params.offset
        )));
    }
    let (a, b) = (width / 2.0, params.height);
    let thickness = params.detail_thickness;
    if params.detail && (thickness <= 0.0 || thickness >= a || thickness >= b) {
        return Err(Error::InvalidPlacement(format!(
            "arch detail thickness {thickness} does not fit a {width:.4} x {b:.4} arch"
        )));
    }
    let normal = mesh
        .face_normal(face)
        .ok_or_else(|| Error::InvalidPlacement("arch face has no normal".into()))?;

    let split = (height - params.offset) / height;
    let cells = mesh.split_face(face, &GridLines::new(vec![0.0, 1.0], vec![0.0, split, 1.0])?)?;
    let (lower, upper) = (cells[0], cells[1]);

    let [spring_l, spring_r, _, top_l] = mesh.quad_corners(upper)?;
    let point = |m: &Mesh, v: VertexKey| {
        m.vertex_point(v)
            .ok_or(Error::Kernel(storey_kernel::Error::VertexNotFound(v)))
    };
    let (p_l, p_r, p_tl) = (point(mesh, spring_l)?, point(mesh, spring_r)?, point(mesh, top_l)?);
    let ellipse = HalfEllipse {
        centre: Point3::from((p_l.coords + p_r.coords) / 2.0),
        right: (p_r - p_l) / width,
        up: (p_tl - p_l).normalize(),
        resolution,
    };

    let ring = mesh
        .face_vertices(upper)
        .map(<[VertexKey]>::to_vec)
        .ok_or(Error::Kernel(storey_kernel::Error::FaceNotFound(upper)))?;
    let (bottom, rest) = split_ring(&ring, spring_l, spring_r)?;

    let material = mesh.remove_face(upper)?.material;
    let outer = ellipse.interior(mesh, a, b);

    let mut wall = vec![spring_l];
    wall.extend(outer.iter().rev().copied());
    wall.push(spring_r);
    wall.extend(rest);
    let remnant = mesh.add_face(&wall, material)?;

    if !params.detail {
        let mut region = bottom;
        region.extend(outer.iter().copied());
        let arch = mesh.add_face(&region, material)?;
        debug!(resolution, "built arch");
        return Ok(ArchResult {
            lower,
            arch: Some(arch),
            remnant: Some(remnant),
            detail: Vec::new(),
        });
    }

    let (ai, bi) = (a - thickness, b - thickness);
    let springs = mesh.split_edge(
        spring_r,
        spring_l,
        &[ellipse.point(ai, bi, 0), ellipse.point(ai, bi, resolution)],
    )?;
    let (inner_r, inner_l) = (springs[0], springs[1]);
    let inner = ellipse.interior(mesh, ai, bi);

    let mut strip = vec![spring_r];
    strip.extend(outer.iter().copied());
    strip.extend([spring_l, inner_l]);
    strip.extend(inner.iter().rev().copied());
    strip.push(inner_r);
    let strip = mesh.add_face(&strip, material)?;

    let mut region = vec![inner_l, inner_r];
    region.extend(inner.iter().copied());
    let arch = mesh.add_face(&region, material)?;

    let (sides, strip) = mesh.extrude_face(strip, &(normal * params.detail_depth))?;
    let mut detail = vec![strip];
    detail.extend(sides);

    debug!(resolution, detail = detail.len(), "built arch with moulding");
    Ok(ArchResult {
        lower,
        arch: Some(arch),
        remnant: Some(remnant),
        detail,
    })
}

/// Splits a loop into the forward path `from..=to` and the remaining
/// vertices strictly between `to` and `from`.
fn split_ring(ring: &[VertexKey], from: VertexKey, to: VertexKey) -> Result<(Vec<VertexKey>, Vec<VertexKey>)> {
    let n = ring.len();
    let start = ring
        .iter()
        .position(|&v| v == from)
        .ok_or_else(|| Error::InvalidPlacement("arch spring missing from face".into()))?;
    let mut path = Vec::new();
    let mut rest = Vec::new();
    let mut on_path = true;
    for i in 0..n {
        let v = ring[(start + i) % n];
        if on_path {
            path.push(v);
            if v == to {
                on_path = false;
            }
        } else {
            rest.push(v);
        }
    }
    Ok((path, rest))
}
