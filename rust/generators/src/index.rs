// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed registry of feature instances on one building mesh.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use storey_kernel::FaceKey;

use crate::error::{Error, Result};
use crate::params::GeneratorParameters;
use crate::reference::Anchor;

/// Identifier of a feature instance, unique within its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One feature instance: what it is, where it is anchored and the faces it
/// currently owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: InstanceId,
    pub params: GeneratorParameters,
    pub anchor: Anchor,
    /// Object-local up direction at the time the feature was added.
    pub up: [f64; 3],
    /// Faces generated by the last build. Rebuilt on load.
    #[serde(skip)]
    pub faces: Vec<FaceKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingInstanceIndex {
    next_id: u64,
    records: Vec<InstanceRecord>,
}

impl BuildingInstanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next free id.
    pub fn allocate(&mut self) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn push(&mut self, record: InstanceRecord) {
        self.records.push(record);
    }

    pub fn get(&self, id: InstanceId) -> Option<&InstanceRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut InstanceRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<InstanceRecord> {
        let pos = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(pos))
    }

    /// Records in creation order.
    pub fn records(&self) -> &[InstanceRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [InstanceRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks that ids are unique and below the allocation counter.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for record in &self.records {
            if !seen.insert(record.id) {
                return Err(Error::InvalidIndex(format!("duplicate instance id {}", record.id)));
            }
            if record.id.0 >= self.next_id {
                return Err(Error::InvalidIndex(format!(
                    "instance id {} was never allocated (next id is {})",
                    record.id, self.next_id
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidIndex(e.to_string()))
    }

    /// Parses and validates an index produced by [`Self::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let index: Self = serde_json::from_str(json).map_err(|e| Error::InvalidIndex(e.to_string()))?;
        index.validate()?;
        Ok(index)
    }
}
