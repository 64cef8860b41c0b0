// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric anchors that survive regeneration.
//!
//! Keys are not stable across a rebuild, so features remember the faces and
//! edges they were built on by position and resolve them again against the
//! rebuilt mesh through a [`SpatialIndex`].

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use storey_kernel::{EdgeKey, FaceKey, Mesh, SpatialIndex, VertexKey};

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};

fn to_array(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

fn to_point(a: &[f64; 3]) -> Point3<f64> {
    Point3::new(a[0], a[1], a[2])
}

/// Lookup of vertices by position within the reference tolerance.
struct Locator<'a> {
    mesh: &'a Mesh,
    index: SpatialIndex,
    tolerance: f64,
}

impl<'a> Locator<'a> {
    fn new(mesh: &'a Mesh, config: &GeneratorConfig) -> Self {
        let tolerance = config.reference_tolerance;
        Self {
            mesh,
            index: SpatialIndex::from_mesh(mesh, tolerance.max(1e-6) * 2.0),
            tolerance,
        }
    }

    fn vertex(&self, at: &[f64; 3]) -> Result<VertexKey> {
        self.index
            .find_near(self.mesh, &to_point(at), self.tolerance)
            .ok_or_else(|| Error::StaleReference(format!("no vertex near {at:?}")))
    }
}

/// A face remembered by its loop positions and orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceReference {
    /// Position of the face in the mesh's face order when captured.
    pub index: usize,
    pub corners: Vec<[f64; 3]>,
    pub normal: [f64; 3],
    pub material: usize,
}

impl FaceReference {
    pub fn capture(mesh: &Mesh, face: FaceKey) -> Result<Self> {
        let missing = || Error::Kernel(storey_kernel::Error::FaceNotFound(face));
        let points = mesh.face_points(face).ok_or_else(missing)?;
        let normal = mesh.face_normal(face).ok_or_else(missing)?;
        let index = mesh.face_keys().position(|f| f == face).ok_or_else(missing)?;
        Ok(Self {
            index,
            corners: points.iter().map(to_array).collect(),
            normal: [normal.x, normal.y, normal.z],
            material: mesh.face_material(face).unwrap_or(0),
        })
    }

    /// Finds the face again: it must use a vertex at every remembered
    /// position and face the same way. Extra vertices spliced into its loop
    /// since capture are allowed; the tightest match wins.
    pub fn resolve(&self, mesh: &Mesh, config: &GeneratorConfig) -> Result<FaceKey> {
        let locator = Locator::new(mesh, config);
        let corners = self
            .corners
            .iter()
            .map(|c| locator.vertex(c))
            .collect::<Result<Vec<_>>>()?;
        let first = *corners
            .first()
            .ok_or_else(|| Error::StaleReference("face reference has no corners".into()))?;
        let normal = Vector3::new(self.normal[0], self.normal[1], self.normal[2]);

        mesh.vertex_faces(first)
            .into_iter()
            .filter(|&f| {
                let loop_ok = mesh
                    .face_vertices(f)
                    .is_some_and(|vs| corners.iter().all(|c| vs.contains(c)));
                let facing = mesh.face_normal(f).is_some_and(|n| n.dot(&normal) > 0.99);
                loop_ok && facing
            })
            .min_by_key(|&f| (mesh.face_vertices(f).map_or(usize::MAX, <[VertexKey]>::len), f))
            .ok_or_else(|| Error::StaleReference(format!("face {} no longer exists", self.index)))
    }
}

/// An edge remembered by its end positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeReference {
    pub start: [f64; 3],
    pub end: [f64; 3],
}

impl EdgeReference {
    pub fn capture(mesh: &Mesh, edge: EdgeKey) -> Result<Self> {
        let missing = || Error::Kernel(storey_kernel::Error::EdgeNotFound(edge));
        let data = mesh.edge(edge).ok_or_else(missing)?;
        let start = mesh.vertex_point(data.start).ok_or_else(missing)?;
        let end = mesh.vertex_point(data.end).ok_or_else(missing)?;
        Ok(Self {
            start: to_array(&start),
            end: to_array(&end),
        })
    }

    pub fn resolve(&self, mesh: &Mesh, config: &GeneratorConfig) -> Result<EdgeKey> {
        let locator = Locator::new(mesh, config);
        let (a, b) = (locator.vertex(&self.start)?, locator.vertex(&self.end)?);
        mesh.find_edge(a, b)
            .ok_or_else(|| Error::StaleReference(format!("edge {:?} -> {:?} no longer exists", self.start, self.end)))
    }
}

/// What a feature instance is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anchor {
    Face(FaceReference),
    Edges { edges: Vec<EdgeReference> },
    Origin { origin: [f64; 3] },
}

/// An anchor resolved against the current mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Face(FaceKey),
    Edges(Vec<EdgeKey>),
    Origin(Point3<f64>),
}

impl Anchor {
    pub fn origin(p: &Point3<f64>) -> Self {
        Anchor::Origin { origin: to_array(p) }
    }

    pub fn resolve(&self, mesh: &Mesh, config: &GeneratorConfig) -> Result<Resolved> {
        match self {
            Anchor::Face(face) => face.resolve(mesh, config).map(Resolved::Face),
            Anchor::Edges { edges } => edges
                .iter()
                .map(|e| e.resolve(mesh, config))
                .collect::<Result<Vec<_>>>()
                .map(Resolved::Edges),
            Anchor::Origin { origin } => Ok(Resolved::Origin(to_point(origin))),
        }
    }
}
