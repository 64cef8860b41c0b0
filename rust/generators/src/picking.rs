// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interactive face picking.
//!
//! A picker lives for one modal placement: pointer moves call
//! [`FacePicker::hover`], and the session ends with either
//! [`FacePicker::confirm`] or [`FacePicker::cancel`]. The picker only reads
//! the mesh.

use nalgebra::{Point3, Vector3};
use storey_kernel::{FaceKey, Mesh};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacePicker {
    hovered: Option<FaceKey>,
}

impl FacePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlights the nearest face hit by the ray, or clears the highlight
    /// when nothing is hit.
    pub fn hover(&mut self, mesh: &Mesh, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<FaceKey> {
        self.hovered = mesh
            .face_keys()
            .filter_map(|f| mesh.ray_face_distance(f, origin, direction).map(|t| (t, f)))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, f)| f);
        self.hovered
    }

    pub fn hovered(&self) -> Option<FaceKey> {
        self.hovered
    }

    /// Ends the session with the highlighted face.
    pub fn confirm(&mut self) -> Option<FaceKey> {
        let picked = self.hovered.take();
        debug!(?picked, "face pick confirmed");
        picked
    }

    pub fn cancel(&mut self) {
        if self.hovered.take().is_some() {
            debug!("face pick cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storey_kernel::build_box;

    fn cube(mesh: &mut Mesh) -> storey_kernel::Prism {
        build_box(
            mesh,
            Point3::origin(),
            Vector3::x(),
            Vector3::y(),
            Vector3::z(),
            0,
        )
        .unwrap()
    }

    #[test]
    fn hover_takes_the_nearest_face() {
        let mut mesh = Mesh::new();
        let prism = cube(&mut mesh);
        let mut picker = FacePicker::new();

        let hit = picker.hover(&mesh, &Point3::new(0.5, 0.5, 5.0), &-Vector3::z());
        assert_eq!(hit, Some(prism.top));
        assert_eq!(picker.hovered(), Some(prism.top));

        assert_eq!(picker.hover(&mesh, &Point3::new(5.0, 5.0, 5.0), &-Vector3::z()), None);
        assert_eq!(picker.hovered(), None);
    }

    #[test]
    fn confirm_yields_and_clears() {
        let mut mesh = Mesh::new();
        let prism = cube(&mut mesh);
        let mut picker = FacePicker::new();
        picker.hover(&mesh, &Point3::new(0.5, 0.5, -5.0), &Vector3::z());

        assert_eq!(picker.confirm(), Some(prism.bottom));
        assert_eq!(picker.confirm(), None);
    }

    #[test]
    fn cancel_leaves_the_mesh_alone() {
        let mut mesh = Mesh::new();
        cube(&mut mesh);
        let before = mesh.signature();
        let mut picker = FacePicker::new();
        picker.hover(&mesh, &Point3::new(0.5, -5.0, 0.5), &Vector3::y());
        assert!(picker.hovered().is_some());

        picker.cancel();
        assert_eq!(picker.hovered(), None);
        assert_eq!(mesh.signature(), before);
    }
}
