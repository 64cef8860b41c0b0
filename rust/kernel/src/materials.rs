// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named material slots.
//!
//! Faces carry a slot index; the mesh owns the slot names. Slot 0 is always
//! [`DEFAULT_MATERIAL`](crate::mesh::DEFAULT_MATERIAL).

use crate::error::{Error, Result};
use crate::keys::FaceKey;
use crate::mesh::Mesh;

impl Mesh {
    /// Returns the slot named `name`, creating it if needed.
    pub fn material_slot(&mut self, name: &str) -> usize {
        if let Some(slot) = self.find_material(name) {
            return slot;
        }
        self.materials.push(name.to_string());
        self.materials.len() - 1
    }

    /// Looks up an existing slot by name.
    pub fn find_material(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m == name)
    }

    pub fn material_name(&self, slot: usize) -> Option<&str> {
        self.materials.get(slot).map(String::as_str)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn face_material(&self, face: FaceKey) -> Option<usize> {
        self.faces.get(face).map(|f| f.material)
    }

    /// Assigns an existing slot to a face.
    pub fn set_face_material(&mut self, face: FaceKey, slot: usize) -> Result<()> {
        if slot >= self.materials.len() {
            return Err(Error::DegenerateGeometry(format!("material slot {slot} does not exist")));
        }
        let data = self.faces.get_mut(face).ok_or(Error::FaceNotFound(face))?;
        data.material = slot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_reused_by_name() {
        let mut mesh = Mesh::new();
        let glass = mesh.material_slot("glass");
        assert_eq!(glass, 1);
        assert_eq!(mesh.material_slot("glass"), glass);
        assert_eq!(mesh.material_name(glass), Some("glass"));
        assert_eq!(mesh.material_count(), 2);
        assert_eq!(mesh.find_material("frame"), None);
    }

    #[test]
    fn face_material_needs_a_known_slot() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(0.0, 0.0, 0.0);
        let b = mesh.add_vertex(1.0, 0.0, 0.0);
        let c = mesh.add_vertex(0.0, 1.0, 0.0);
        let face = mesh.add_face(&[a, b, c], 0).unwrap();

        let slot = mesh.material_slot("frame");
        mesh.set_face_material(face, slot).unwrap();
        assert_eq!(mesh.face_material(face), Some(slot));
        assert!(mesh.set_face_material(face, 99).is_err());
    }
}
