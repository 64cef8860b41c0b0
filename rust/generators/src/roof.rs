// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roofs over an upward-facing footprint face.
//!
//! Every roof starts from the same flat slab: the footprint is grown by an
//! overhang whose eave hangs the slab thickness below the footprint plane.
//! Gable and hip roofs then shape the cap.

use nalgebra::Vector3;
use storey_kernel::{offset_polygon, FaceKey, GridLines, Mesh, MeshKey, VertexKey};
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::materials::{MaterialRole, MaterialSlotAssignment};
use crate::params::{FlatRoof, GableRoof, HipRoof, RoofOrientation, RoofParameters};
use crate::split::face_size;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoofResult {
    /// Top surfaces: the flat cap or the slopes.
    pub cap: Vec<FaceKey>,
    /// Underside of the overhang.
    pub soffit: Vec<FaceKey>,
    /// Slab edges.
    pub fascia: Vec<FaceKey>,
}

impl RoofResult {
    pub fn faces(&self) -> Vec<FaceKey> {
        self.cap.iter().chain(&self.soffit).chain(&self.fascia).copied().collect()
    }
}

/// Builds a roof of any kind over `face`.
///
/// The mesh is left untouched on failure.
pub fn build_roof(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &RoofParameters,
    config: &GeneratorConfig,
) -> Result<RoofResult> {
    mesh.staged(|m| {
        let result = match params {
            RoofParameters::Flat(flat) => flat_roof(m, face, flat, config)?,
            RoofParameters::Gable(gable) => gable_roof(m, face, gable, config)?,
            RoofParameters::Hip(hip) => hip_roof(m, face, hip, config)?,
        };
        let faces: Vec<FaceKey> = result.faces().into_iter().filter(|&f| m.contains(f.into())).collect();
        MaterialSlotAssignment::new().assign(m, &faces, MaterialRole::Roof)?;
        info!(faces = faces.len(), "built roof");
        Ok(result)
    })
}

pub fn build_flat_roof(mesh: &mut Mesh, face: FaceKey, params: &FlatRoof, config: &GeneratorConfig) -> Result<RoofResult> {
    build_roof(mesh, face, &RoofParameters::Flat(params.clone()), config)
}

pub fn build_gable_roof(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &GableRoof,
    config: &GeneratorConfig,
) -> Result<RoofResult> {
    build_roof(mesh, face, &RoofParameters::Gable(params.clone()), config)
}

/// Hip roof over a convex footprint with at least four corners.
pub fn build_hip_roof(mesh: &mut Mesh, face: FaceKey, params: &HipRoof, config: &GeneratorConfig) -> Result<RoofResult> {
    build_roof(mesh, face, &RoofParameters::Hip(params.clone()), config)
}

fn footprint_normal(mesh: &Mesh, face: FaceKey) -> Result<Vector3<f64>> {
    mesh.face_normal(face)
        .ok_or_else(|| Error::InvalidFootprint("footprint has no normal".into()))
}

/// Slab with overhang.
///
/// The footprint is grown by `outset` into a cap that stays in the footprint
/// plane. The eave hangs `thickness` below the cap as a fascia, and the soffit
/// runs from the bottom of the fascia back to the footprint outline. Without
/// an overhang there is no eave to hang, so the footprint itself is the cap.
fn slab(mesh: &mut Mesh, face: FaceKey, thickness: f64, outset: f64, config: &GeneratorConfig) -> Result<RoofResult> {
    let normal = footprint_normal(mesh, face)?;
    let mut result = RoofResult::default();
    if outset <= config.tolerance {
        if thickness > config.tolerance {
            debug!(thickness, "no overhang, roof slab reduced to its cap");
        }
        result.cap = vec![face];
        return Ok(result);
    }

    let points = mesh
        .face_points(face)
        .ok_or(Error::Kernel(storey_kernel::Error::FaceNotFound(face)))?;
    let grown = offset_polygon(&points, &normal, -outset)
        .ok_or_else(|| Error::InvalidFootprint(format!("footprint cannot be grown by {outset}")))?;
    let inner: Vec<VertexKey> = mesh
        .face_vertices(face)
        .map(<[VertexKey]>::to_vec)
        .ok_or(Error::Kernel(storey_kernel::Error::FaceNotFound(face)))?;
    let top: Vec<VertexKey> = grown.iter().map(|p| mesh.add_vertex_at(p)).collect();

    let material = mesh.remove_face(face)?.material;
    let eave = if thickness > config.tolerance {
        let drop = -normal * thickness;
        let bottom: Vec<VertexKey> = grown.iter().map(|p| mesh.add_vertex_at(&(p + drop))).collect();
        result.fascia = mesh.bridge_loops(&bottom, &top)?;
        bottom
    } else {
        top.clone()
    };
    result.soffit = mesh.bridge_loops(&inner, &eave)?;
    for &f in result.soffit.iter().chain(&result.fascia) {
        mesh.set_face_material(f, material)?;
    }
    result.cap = vec![mesh.add_face(&top, material)?];
    debug!(soffit = result.soffit.len(), fascia = result.fascia.len(), "roof slab");
    Ok(result)
}

/// Flat roof: the slab alone.
fn flat_roof(mesh: &mut Mesh, face: FaceKey, params: &FlatRoof, config: &GeneratorConfig) -> Result<RoofResult> {
    slab(mesh, face, params.thickness, params.outset, config)
}

/// Gable roof over a four-cornered convex footprint.
///
/// The cap is halved along the ridge axis and the ridge is raised by
/// `height`; slopes that end up warped are triangulated.
fn gable_roof(mesh: &mut Mesh, face: FaceKey, params: &GableRoof, config: &GeneratorConfig) -> Result<RoofResult> {
    let corners = mesh.face_corner_indices(face).map_or(0, |c| c.len());
    if corners != 4 || !mesh.is_convex(face) {
        return Err(Error::InvalidFootprint(format!(
            "gable roofs need a convex four-cornered footprint, found {corners} corners"
        )));
    }
    let normal = footprint_normal(mesh, face)?;
    let mut result = slab(mesh, face, params.thickness, params.outset, config)?;
    let cap = result.cap[0];

    let (width, depth) = face_size(mesh, cap)?;
    let ridge_along_bottom = match params.orientation {
        RoofOrientation::Left => width >= depth,
        RoofOrientation::Right => width < depth,
    };
    let lines = if ridge_along_bottom {
        GridLines::new(vec![0.0, 1.0], vec![0.0, 0.5, 1.0])?
    } else {
        GridLines::new(vec![0.0, 0.5, 1.0], vec![0.0, 1.0])?
    };
    let slopes = mesh.split_face(cap, &lines)?;

    let ridge: Vec<VertexKey> = match (mesh.face_vertices(slopes[0]), mesh.face_vertices(slopes[1])) {
        (Some(a), Some(b)) => a.iter().copied().filter(|v| b.contains(v)).collect(),
        _ => Vec::new(),
    };
    if ridge.len() < 2 {
        return Err(Error::InvalidFootprint("gable halves do not share a ridge".into()));
    }
    let keys: Vec<MeshKey> = ridge.iter().map(|&v| v.into()).collect();
    mesh.translate(&keys, &(normal * params.height));

    result.cap = flatten_warped(mesh, &slopes, config)?;
    let fascia = std::mem::take(&mut result.fascia);
    result.fascia = flatten_warped(mesh, &fascia, config)?;
    Ok(result)
}

/// Hip roof over a convex footprint with at least four corners.
///
/// Only the inset-driven shape is built: the cap is inset by `amount` and the
/// inner face raised by `height`, leaving sloped hips around a flat ridge
/// face. Near-coplanar slopes are merged when `dissolve` is set.
fn hip_roof(mesh: &mut Mesh, face: FaceKey, params: &HipRoof, config: &GeneratorConfig) -> Result<RoofResult> {
    let corners = mesh.face_corner_indices(face).map_or(0, |c| c.len());
    if corners < 4 || !mesh.is_convex(face) {
        return Err(Error::InvalidFootprint(format!(
            "hip roofs need a convex footprint with at least four corners, found {corners}"
        )));
    }
    let normal = footprint_normal(mesh, face)?;
    let mut result = slab(mesh, face, params.thickness, params.outset, config)?;
    let cap = result.cap[0];

    let (top, hips) = mesh.inset_face(cap, params.amount)?;
    let ring: Vec<MeshKey> = mesh
        .face_vertices(top)
        .map(|vs| vs.iter().map(|&v| v.into()).collect())
        .unwrap_or_default();
    mesh.translate(&ring, &(normal * params.height));

    let hips = if params.dissolve {
        mesh.dissolve_coplanar(&hips, params.dissolve_angle)?
    } else {
        hips
    };
    let mut cap_faces = vec![top];
    cap_faces.extend(flatten_warped(mesh, &hips, config)?);
    result.cap = cap_faces;
    Ok(result)
}

/// Triangulates the faces that are no longer planar.
fn flatten_warped(mesh: &mut Mesh, faces: &[FaceKey], config: &GeneratorConfig) -> Result<Vec<FaceKey>> {
    let tolerance = config.tolerance.max(1e-6);
    let mut out = Vec::with_capacity(faces.len());
    for &face in faces {
        if mesh.is_planar(face, tolerance) {
            out.push(face);
        } else {
            out.extend(mesh.triangulate(face)?);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use storey_kernel::make_quad;

    fn config() -> GeneratorConfig {
        GeneratorConfig::default()
    }

    fn footprint(mesh: &mut Mesh) -> FaceKey {
        let v0 = mesh.add_vertex(0.0, 0.0, 0.0);
        let v1 = mesh.add_vertex(4.0, 0.0, 0.0);
        let v2 = mesh.add_vertex(4.0, 2.0, 0.0);
        let v3 = mesh.add_vertex(0.0, 2.0, 0.0);
        make_quad(mesh, v0, v1, v2, v3).unwrap()
    }

    fn top_z(mesh: &Mesh, faces: &[FaceKey]) -> f64 {
        faces
            .iter()
            .flat_map(|&f| mesh.face_points(f).unwrap())
            .map(|p| p.z)
            .fold(f64::MIN, f64::max)
    }

    fn low_z(mesh: &Mesh, faces: &[FaceKey]) -> f64 {
        faces
            .iter()
            .flat_map(|&f| mesh.face_points(f).unwrap())
            .map(|p| p.z)
            .fold(f64::MAX, f64::min)
    }

    #[test]
    fn flat_roof_with_overhang() {
        let mut mesh = Mesh::new();
        let face = footprint(&mut mesh);
        let result = build_roof(&mut mesh, face, &RoofParameters::default(), &config()).unwrap();

        assert_eq!(result.soffit.len(), 4);
        assert_eq!(result.fascia.len(), 4);
        for &s in &result.soffit {
            assert!(mesh.face_normal(s).unwrap().z < 0.0);
        }
        for &f in &result.fascia {
            assert_relative_eq!(mesh.face_normal(f).unwrap().z, 0.0, epsilon = 1e-9);
        }
        let cap = result.cap[0];
        assert_relative_eq!(mesh.face_area(cap).unwrap(), 4.2 * 2.2, epsilon = 1e-9);
        assert_relative_eq!(mesh.face_centroid(cap).unwrap().z, 0.0, epsilon = 1e-9);
        assert_relative_eq!(low_z(&mesh, &result.fascia), -0.1, epsilon = 1e-9);
        assert!(!mesh.contains(face.into()));
        assert!(mesh.non_manifold_edges().is_empty());

        let roof = mesh.find_material("roof").unwrap();
        assert!(result.faces().iter().all(|&f| mesh.face_material(f) == Some(roof)));
    }

    #[test]
    fn flat_roof_without_overhang_keeps_footprint() {
        let mut mesh = Mesh::new();
        let face = footprint(&mut mesh);
        let params = FlatRoof {
            thickness: 0.2,
            outset: 0.0,
        };
        let result = build_flat_roof(&mut mesh, face, &params, &config()).unwrap();
        assert_eq!(result.cap, vec![face]);
        assert!(result.soffit.is_empty());
        assert!(result.fascia.is_empty());
        assert_relative_eq!(mesh.face_centroid(face).unwrap().z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn eave_hangs_below_a_closed_block() {
        let mut mesh = Mesh::new();
        let block = storey_kernel::build_box(
            &mut mesh,
            nalgebra::Point3::origin(),
            Vector3::new(4.0, 0.0, 0.0),
            Vector3::new(0.0, 4.0, 0.0),
            Vector3::new(0.0, 0.0, 3.0),
            0,
        )
        .unwrap();
        let params = FlatRoof {
            thickness: 0.2,
            outset: 0.3,
        };
        let result = build_flat_roof(&mut mesh, block.top, &params, &config()).unwrap();

        assert_relative_eq!(top_z(&mesh, &result.faces()), 3.0, epsilon = 1e-9);
        assert_relative_eq!(low_z(&mesh, &result.faces()), 2.8, epsilon = 1e-9);
        assert_relative_eq!(mesh.face_centroid(result.cap[0]).unwrap().z, 3.0, epsilon = 1e-9);
        assert!(mesh.open_edges().is_empty());
        assert!(mesh.non_manifold_edges().is_empty());
    }

    #[test]
    fn gable_ridge_runs_along_long_axis() {
        let mut mesh = Mesh::new();
        let face = footprint(&mut mesh);
        let params = RoofParameters::Gable(GableRoof::default());
        let result = build_roof(&mut mesh, face, &params, &config()).unwrap();

        assert_eq!(result.cap.len(), 2);
        assert_relative_eq!(top_z(&mesh, &result.cap), 1.0, epsilon = 1e-9);
        let ridge: Vec<_> = result
            .cap
            .iter()
            .flat_map(|&f| mesh.face_points(f).unwrap())
            .filter(|p| (p.z - 1.0).abs() < 1e-9)
            .collect();
        assert!(ridge.iter().all(|p| (p.y - 1.0).abs() < 1e-9));
        assert!(mesh.non_manifold_edges().is_empty());
    }

    #[test]
    fn gable_right_turns_the_ridge() {
        let mut mesh = Mesh::new();
        let face = footprint(&mut mesh);
        let params = GableRoof {
            orientation: RoofOrientation::Right,
            ..GableRoof::default()
        };
        let result = build_gable_roof(&mut mesh, face, &params, &config()).unwrap();
        let ridge: Vec<_> = result
            .cap
            .iter()
            .flat_map(|&f| mesh.face_points(f).unwrap())
            .filter(|p| (p.z - 1.0).abs() < 1e-9)
            .collect();
        assert!(!ridge.is_empty());
        assert!(ridge.iter().all(|p| (p.x - 2.0).abs() < 1e-9));
    }

    #[test]
    fn gable_needs_four_corners() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(0.0, 0.0, 0.0);
        let b = mesh.add_vertex(2.0, 0.0, 0.0);
        let c = mesh.add_vertex(1.0, 2.0, 0.0);
        let face = mesh.add_face(&[a, b, c], 0).unwrap();
        let err = build_roof(&mut mesh, face, &RoofParameters::Gable(GableRoof::default()), &config()).unwrap_err();
        assert!(matches!(err, Error::InvalidFootprint(_)));
    }

    #[test]
    fn hip_raises_inset_ridge() {
        let mut mesh = Mesh::new();
        let face = footprint(&mut mesh);
        let result = build_hip_roof(&mut mesh, face, &HipRoof::default(), &config()).unwrap();

        assert_eq!(result.cap.len(), 5);
        let ridge = result.cap[0];
        assert_relative_eq!(mesh.face_centroid(ridge).unwrap().z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.face_area(ridge).unwrap(), 3.2 * 1.2, epsilon = 1e-9);
        assert!(mesh.non_manifold_edges().is_empty());
    }

    #[test]
    fn hip_rejects_concave_and_small_footprints() {
        let mut mesh = Mesh::new();
        let pts = [
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ];
        let ring: Vec<_> = pts.iter().map(|&(x, y)| mesh.add_vertex(x, y, 0.0)).collect();
        let l_shape = mesh.add_face(&ring, 0).unwrap();
        let before = mesh.signature();
        let err = build_roof(&mut mesh, l_shape, &RoofParameters::Hip(HipRoof::default()), &config()).unwrap_err();
        assert!(matches!(err, Error::InvalidFootprint(_)));
        assert_eq!(mesh.signature(), before);

        let a = mesh.add_vertex(5.0, 0.0, 0.0);
        let b = mesh.add_vertex(6.0, 0.0, 0.0);
        let c = mesh.add_vertex(5.5, 1.0, 0.0);
        let tri = mesh.add_face(&[a, b, c], 0).unwrap();
        let err = build_roof(&mut mesh, tri, &RoofParameters::Hip(HipRoof::default()), &config()).unwrap_err();
        assert!(matches!(err, Error::InvalidFootprint(_)));
    }
}
