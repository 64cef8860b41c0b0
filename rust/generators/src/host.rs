// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! What the generators need to know about the host application.

use nalgebra::{Matrix4, Point3, Vector3};
use storey_kernel::{EdgeKey, FaceKey, EPSILON};

/// Selection state of the building object being edited.
pub trait HostSelection {
    fn selected_faces(&self) -> &[FaceKey];

    fn selected_edges(&self) -> &[EdgeKey];

    /// Object to world transform.
    fn object_transform(&self) -> Matrix4<f64>;

    /// Placement point for features that are not anchored on geometry, in
    /// object space.
    fn cursor(&self) -> Point3<f64> {
        Point3::origin()
    }

    /// World up expressed in object space. Falls back to +Z when the
    /// transform cannot be inverted.
    fn up(&self) -> Vector3<f64> {
        self.object_transform()
            .try_inverse()
            .and_then(|inv| inv.transform_vector(&Vector3::z()).try_normalize(EPSILON))
            .unwrap_or_else(Vector3::z)
    }
}

/// Plain selection value for hosts without their own selection model.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub faces: Vec<FaceKey>,
    pub edges: Vec<EdgeKey>,
    pub transform: Matrix4<f64>,
    pub cursor: Point3<f64>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            faces: Vec::new(),
            edges: Vec::new(),
            transform: Matrix4::identity(),
            cursor: Point3::origin(),
        }
    }
}

impl Selection {
    pub fn face(face: FaceKey) -> Self {
        Self {
            faces: vec![face],
            ..Self::default()
        }
    }

    pub fn edges(edges: impl IntoIterator<Item = EdgeKey>) -> Self {
        Self {
            edges: edges.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn at(cursor: Point3<f64>) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }
}

impl HostSelection for Selection {
    fn selected_faces(&self) -> &[FaceKey] {
        &self.faces
    }

    fn selected_edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    fn object_transform(&self) -> Matrix4<f64> {
        self.transform
    }

    fn cursor(&self) -> Point3<f64> {
        self.cursor
    }
}
