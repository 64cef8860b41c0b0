// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Semantic material roles and their slots on a mesh.
//!
//! Slots are resolved by role name, so a role maps to the same slot across
//! regenerations of an instance and across instances on one mesh.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use storey_kernel::{FaceKey, Mesh};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialRole {
    Frame,
    Pane,
    Bar,
    Glass,
    Groove,
    Louver,
    Post,
    Rail,
    Wall,
    Step,
    Landing,
    Support,
    Roof,
}

impl MaterialRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialRole::Frame => "frame",
            MaterialRole::Pane => "pane",
            MaterialRole::Bar => "bar",
            MaterialRole::Glass => "glass",
            MaterialRole::Groove => "groove",
            MaterialRole::Louver => "louver",
            MaterialRole::Post => "post",
            MaterialRole::Rail => "rail",
            MaterialRole::Wall => "wall",
            MaterialRole::Step => "step",
            MaterialRole::Landing => "landing",
            MaterialRole::Support => "support",
            MaterialRole::Roof => "roof",
        }
    }
}

impl fmt::Display for MaterialRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role to slot mapping collected while a feature is generated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialSlotAssignment {
    slots: BTreeMap<MaterialRole, usize>,
}

impl MaterialSlotAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `role` on `mesh`, created on first use.
    pub fn slot(&mut self, mesh: &mut Mesh, role: MaterialRole) -> usize {
        let slot = mesh.material_slot(role.as_str());
        self.slots.insert(role, slot);
        slot
    }

    /// Tags every face with the slot of `role`.
    pub fn assign(&mut self, mesh: &mut Mesh, faces: &[FaceKey], role: MaterialRole) -> Result<()> {
        let slot = self.slot(mesh, role);
        for &face in faces {
            mesh.set_face_material(face, slot)?;
        }
        Ok(())
    }

    pub fn get(&self, role: MaterialRole) -> Option<usize> {
        self.slots.get(&role).copied()
    }

    /// Roles touched so far, in role order.
    pub fn roles(&self) -> impl Iterator<Item = (MaterialRole, usize)> + '_ {
        self.slots.iter().map(|(&r, &s)| (r, s))
    }
}
