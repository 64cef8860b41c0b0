// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A building mesh together with the feature instances generated on it.
//!
//! The [`Building`] keeps the mesh as it was before any feature was added
//! (the base) and rebuilds everything from it whenever an instance changes:
//! the base is cloned, every instance is replayed in creation order and the
//! result replaces the live mesh only if all of them succeed. Replay is
//! deterministic, so an unchanged instance list reproduces the same mesh and
//! removing an instance restores exactly what was there without it.

use nalgebra::Vector3;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use storey_kernel::{FaceKey, Mesh, MeshSnapshot};
use tracing::{info, warn};

use crate::balcony::build_balcony;
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::host::HostSelection;
use crate::index::{BuildingInstanceIndex, InstanceId, InstanceRecord};
use crate::observer::{ParameterHandle, RegenerationObserver, RegenerationRequest};
use crate::opening::{build_door, build_window, OpeningResult};
use crate::params::GeneratorParameters;
use crate::railing::build_railing;
use crate::reference::{Anchor, EdgeReference, FaceReference, Resolved};
use crate::roof::build_roof;
use crate::stairs::{build_staircase, build_stairs};

/// Persisted form of a [`Building`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BuildingState {
    base: MeshSnapshot,
    index: BuildingInstanceIndex,
}

#[derive(Debug, Clone)]
pub struct Building {
    mesh: Mesh,
    base: Mesh,
    index: BuildingInstanceIndex,
    config: GeneratorConfig,
}

impl Building {
    pub fn new(mesh: Mesh) -> Self {
        Self::with_config(mesh, GeneratorConfig::default())
    }

    pub fn with_config(mesh: Mesh, config: GeneratorConfig) -> Self {
        Self {
            base: mesh.clone(),
            mesh,
            index: BuildingInstanceIndex::new(),
            config,
        }
    }

    /// The live mesh with every feature applied.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// The mesh without any feature.
    pub fn base(&self) -> &Mesh {
        &self.base
    }

    pub fn instances(&self) -> &BuildingInstanceIndex {
        &self.index
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a feature on the current selection and records it.
    ///
    /// Window, door, balcony, stairs and roof features need exactly one
    /// selected face, railings need selected edges and staircases are placed
    /// at the host cursor. Nothing is recorded if generation fails.
    pub fn add_feature(&mut self, selection: &impl HostSelection, params: GeneratorParameters) -> Result<InstanceId> {
        let anchor = self.capture_anchor(selection, &params)?;
        let up = selection.up();

        let mut record = InstanceRecord {
            id: InstanceId(0),
            params,
            anchor,
            up: [up.x, up.y, up.z],
            faces: Vec::new(),
        };
        record.faces = generate(&mut self.mesh, &record, &self.config)?;
        record.id = self.index.allocate();

        let id = record.id;
        info!(instance = %id, kind = record.params.kind(), faces = record.faces.len(), "added feature");
        self.index.push(record);
        Ok(id)
    }

    /// Replaces an instance's parameters and regenerates the building.
    ///
    /// On failure the previous parameters and mesh are kept.
    pub fn update_parameters(&mut self, id: InstanceId, params: GeneratorParameters) -> Result<()> {
        let record = self.index.get_mut(id).ok_or(Error::UnknownInstance(id))?;
        let previous = std::mem::replace(&mut record.params, params);
        if let Err(err) = self.regenerate() {
            if let Some(record) = self.index.get_mut(id) {
                record.params = previous;
            }
            return Err(err);
        }
        Ok(())
    }

    /// Deletes an instance and everything generated for it.
    pub fn remove_feature(&mut self, id: InstanceId) -> Result<InstanceRecord> {
        let saved = self.index.clone();
        let record = self.index.remove(id).ok_or(Error::UnknownInstance(id))?;
        if let Err(err) = self.regenerate() {
            self.index = saved;
            return Err(err);
        }
        info!(instance = %id, kind = record.params.kind(), "removed feature");
        Ok(record)
    }

    /// Applies a host edit to the base mesh and replays every feature on
    /// top of it.
    pub fn edit_base<T, F>(&mut self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Mesh) -> Result<T>,
    {
        let mut base = self.base.clone();
        let value = edit(&mut base)?;
        let saved = std::mem::replace(&mut self.base, base);
        if let Err(err) = self.regenerate() {
            self.base = saved;
            return Err(err);
        }
        Ok(value)
    }

    /// Rebuilds the live mesh from the base and the recorded instances.
    pub fn regenerate(&mut self) -> Result<()> {
        let mut mesh = self.base.clone();
        let mut owned = Vec::with_capacity(self.index.len());
        for record in self.index.records() {
            let faces = generate(&mut mesh, record, &self.config).map_err(|err| {
                warn!(instance = %record.id, kind = record.params.kind(), error = %err, "regeneration failed");
                err
            })?;
            owned.push(faces);
        }

        self.mesh = mesh;
        for (record, faces) in self.index.records_mut().iter_mut().zip(owned) {
            record.faces = faces;
        }
        info!(instances = self.index.len(), faces = self.mesh.face_count(), "regenerated building");
        Ok(())
    }

    /// Faces currently owned by an instance.
    pub fn generated_faces(&self, id: InstanceId) -> Result<&[FaceKey]> {
        self.index
            .get(id)
            .map(|r| r.faces.as_slice())
            .ok_or(Error::UnknownInstance(id))
    }

    /// Editable copy of an instance's parameters for the host property UI.
    pub fn handle(&self, id: InstanceId) -> Result<ParameterHandle> {
        self.index
            .get(id)
            .map(|r| ParameterHandle::new(id, r.params.clone()))
            .ok_or(Error::UnknownInstance(id))
    }

    pub fn to_json(&self) -> Result<String> {
        let state = BuildingState {
            base: self.base.to_snapshot(),
            index: self.index.clone(),
        };
        serde_json::to_string_pretty(&state).map_err(|e| Error::InvalidIndex(e.to_string()))
    }

    /// Restores a building saved with [`Self::to_json`], replaying every
    /// instance to rebuild the live mesh.
    pub fn from_json(json: &str, config: GeneratorConfig) -> Result<Self> {
        let state: BuildingState = serde_json::from_str(json).map_err(|e| Error::InvalidIndex(e.to_string()))?;
        state.index.validate()?;
        let base = Mesh::from_snapshot(&state.base)?;

        let mut building = Self {
            mesh: base.clone(),
            base,
            index: state.index,
            config,
        };
        building
            .regenerate()
            .map_err(|e| Error::InvalidIndex(format!("stored instances no longer apply: {e}")))?;
        Ok(building)
    }

    fn capture_anchor(&self, selection: &impl HostSelection, params: &GeneratorParameters) -> Result<Anchor> {
        match params {
            GeneratorParameters::Railing(_) => {
                let edges = selection.selected_edges();
                if edges.is_empty() {
                    return Err(Error::InvalidPlacement("railing needs at least one selected edge".into()));
                }
                let edges = edges
                    .iter()
                    .map(|&e| EdgeReference::capture(&self.mesh, e))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Anchor::Edges { edges })
            }
            GeneratorParameters::Staircase(_) => Ok(Anchor::origin(&selection.cursor())),
            _ => match selection.selected_faces() {
                [face] => Ok(Anchor::Face(FaceReference::capture(&self.mesh, *face)?)),
                faces => Err(Error::InvalidPlacement(format!(
                    "{} needs exactly one selected face, got {}",
                    params.kind(),
                    faces.len()
                ))),
            },
        }
    }
}

impl RegenerationObserver for Building {
    fn parameters_changed(&mut self, request: RegenerationRequest) -> Result<()> {
        self.update_parameters(request.instance, request.parameters)
    }
}

fn opening_faces(result: &OpeningResult) -> Vec<FaceKey> {
    result.openings.iter().flat_map(|o| o.faces()).collect()
}

/// Builds one instance on `mesh` and returns the faces it owns: every face
/// that did not exist before plus the faces the generator reports.
fn generate(mesh: &mut Mesh, record: &InstanceRecord, config: &GeneratorConfig) -> Result<Vec<FaceKey>> {
    let before: FxHashSet<FaceKey> = mesh.face_keys().collect();
    let up = Vector3::new(record.up[0], record.up[1], record.up[2]);
    let target = record.anchor.resolve(mesh, config)?;

    let reported = match (&record.params, target) {
        (GeneratorParameters::Window(p), Resolved::Face(face)) => opening_faces(&build_window(mesh, face, p, config)?),
        (GeneratorParameters::Door(p), Resolved::Face(face)) => opening_faces(&build_door(mesh, face, p, config)?),
        (GeneratorParameters::Balcony(p), Resolved::Face(face)) => build_balcony(mesh, face, p, &up, config)?.faces(),
        (GeneratorParameters::Stairs(p), Resolved::Face(face)) => build_stairs(mesh, face, p, &up, config)?.faces(),
        (GeneratorParameters::Roof(p), Resolved::Face(face)) => build_roof(mesh, face, p, config)?.faces(),
        (GeneratorParameters::Railing(p), Resolved::Edges(edges)) => build_railing(mesh, &edges, p, &up, config)?.faces(),
        (GeneratorParameters::Staircase(p), Resolved::Origin(origin)) => build_staircase(mesh, &origin, p, config)?.faces(),
        (params, _) => {
            return Err(Error::InvalidIndex(format!(
                "{} instance {} has an anchor of the wrong kind",
                params.kind(),
                record.id
            )))
        }
    };

    let mut owned: Vec<FaceKey> = mesh.face_keys().filter(|f| !before.contains(f)).collect();
    owned.extend(reported.into_iter().filter(|&f| mesh.face(f).is_some()));
    owned.sort();
    owned.dedup();
    Ok(owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Selection;
    use crate::params::{
        FillParameters, GlassPaneFill, RailingParameters, RoofParameters, StaircaseParameters, WindowParameters,
    };
    use nalgebra::{Point3, Vector3};
    use storey_kernel::{build_box, Prism};

    /// 4 x 4 x 3 block; returns the mesh and its prism faces.
    fn block() -> (Mesh, Prism) {
        let mut mesh = Mesh::new();
        let prism = build_box(
            &mut mesh,
            Point3::origin(),
            Vector3::new(4.0, 0.0, 0.0),
            Vector3::new(0.0, 4.0, 0.0),
            Vector3::new(0.0, 0.0, 3.0),
            0,
        )
        .unwrap();
        (mesh, prism)
    }

    fn south_wall(mesh: &Mesh, prism: &Prism) -> FaceKey {
        prism
            .sides
            .iter()
            .copied()
            .find(|&f| mesh.face_normal(f).unwrap().y < -0.9)
            .unwrap()
    }

    fn window() -> GeneratorParameters {
        GeneratorParameters::Window(WindowParameters::default())
    }

    #[test]
    fn regeneration_is_byte_identical() {
        let (mesh, prism) = block();
        let wall = south_wall(&mesh, &prism);
        let mut building = Building::new(mesh);
        building.add_feature(&Selection::face(wall), window()).unwrap();

        let first = building.mesh().to_json().unwrap();
        building.regenerate().unwrap();
        assert_eq!(building.mesh().to_json().unwrap(), first);
    }

    #[test]
    fn removing_restores_the_host() {
        let (mesh, prism) = block();
        let wall = south_wall(&mesh, &prism);
        let original = mesh.signature();
        let mut building = Building::new(mesh);
        let id = building.add_feature(&Selection::face(wall), window()).unwrap();
        assert_ne!(building.mesh().signature(), original);

        let record = building.remove_feature(id).unwrap();
        assert_eq!(record.params, window());
        assert_eq!(building.mesh().signature(), original);
        assert!(building.instances().is_empty());
        assert!(matches!(building.remove_feature(id), Err(Error::UnknownInstance(_))));
    }

    #[test]
    fn update_regenerates_from_the_anchor() {
        let (mesh, prism) = block();
        let wall = south_wall(&mesh, &prism);
        let mut building = Building::new(mesh);
        let id = building.add_feature(&Selection::face(wall), window()).unwrap();
        let single = building.mesh().face_count();

        let twin = GeneratorParameters::Window(WindowParameters {
            count: 2,
            size_offset: crate::params::SizeOffset {
                size: (0.8, 1.0),
                offset: (0.0, 0.0),
            },
            ..WindowParameters::default()
        });
        building.update_parameters(id, twin.clone()).unwrap();
        assert!(building.mesh().face_count() > single);
        assert_eq!(building.instances().get(id).unwrap().params, twin);

        // Two 0.8 m openings replay to the same mesh as a fresh build.
        let (fresh_mesh, fresh_prism) = block();
        let fresh_wall = south_wall(&fresh_mesh, &fresh_prism);
        let mut fresh = Building::new(fresh_mesh);
        fresh.add_feature(&Selection::face(fresh_wall), twin).unwrap();
        assert_eq!(fresh.mesh().signature(), building.mesh().signature());
    }

    #[test]
    fn failed_update_keeps_previous_state() {
        let (mesh, prism) = block();
        let wall = south_wall(&mesh, &prism);
        let mut building = Building::new(mesh);
        let id = building.add_feature(&Selection::face(wall), window()).unwrap();
        let before = building.mesh().signature();

        let huge = GeneratorParameters::Window(WindowParameters {
            size_offset: crate::params::SizeOffset {
                size: (9.0, 1.0),
                offset: (0.0, 0.0),
            },
            ..WindowParameters::default()
        });
        let err = building.update_parameters(id, huge).unwrap_err();
        assert!(matches!(err, Error::InvalidPlacement(_)));
        assert_eq!(building.mesh().signature(), before);
        assert_eq!(building.instances().get(id).unwrap().params, window());
    }

    #[test]
    fn later_features_survive_earlier_updates() {
        let (mesh, prism) = block();
        let wall = south_wall(&mesh, &prism);
        let mut building = Building::new(mesh);
        let roof = building
            .add_feature(&Selection::face(prism.top), GeneratorParameters::Roof(RoofParameters::default()))
            .unwrap();
        let win = building.add_feature(&Selection::face(wall), window()).unwrap();
        let window_faces = building.generated_faces(win).unwrap().len();

        let mut handle = building.handle(roof).unwrap();
        handle
            .edit(&mut building, |p| {
                if let GeneratorParameters::Roof(RoofParameters::Flat(flat)) = p {
                    flat.thickness = 0.3;
                }
            })
            .unwrap();

        assert_eq!(building.generated_faces(win).unwrap().len(), window_faces);
        // The eave hangs the new thickness below the roof plane.
        let eave = building
            .generated_faces(roof)
            .unwrap()
            .iter()
            .filter_map(|&f| building.mesh().face_points(f))
            .flatten()
            .map(|p| p.z)
            .fold(f64::MAX, f64::min);
        assert!((eave - 2.7).abs() < 1e-9);
    }

    #[test]
    fn features_need_a_matching_selection() {
        let (mesh, prism) = block();
        let mut building = Building::new(mesh);
        let none = building.add_feature(&Selection::default(), window()).unwrap_err();
        assert!(matches!(none, Error::InvalidPlacement(_)));

        let both = Selection {
            faces: vec![prism.top, prism.bottom],
            ..Selection::default()
        };
        assert!(building.add_feature(&both, window()).is_err());
        let railing = building
            .add_feature(&Selection::face(prism.top), GeneratorParameters::Railing(RailingParameters::default()))
            .unwrap_err();
        assert!(matches!(railing, Error::InvalidPlacement(_)));
        assert!(building.instances().is_empty());
    }

    #[test]
    fn railing_and_staircase_instances_replay() {
        let (mesh, prism) = block();
        let edges = mesh.face_edges(prism.top).unwrap().to_vec();
        let mut building = Building::new(mesh);
        let railing = building
            .add_feature(&Selection::edges(edges), GeneratorParameters::Railing(RailingParameters::default()))
            .unwrap();
        let stairs = building
            .add_feature(
                &Selection::at(Point3::new(10.0, 0.0, 0.0)),
                GeneratorParameters::Staircase(StaircaseParameters::default()),
            )
            .unwrap();
        let before = building.mesh().signature();

        building.regenerate().unwrap();
        assert_eq!(building.mesh().signature(), before);
        assert!(!building.generated_faces(railing).unwrap().is_empty());
        assert!(!building.generated_faces(stairs).unwrap().is_empty());
    }

    #[test]
    fn saved_building_reloads() {
        let (mesh, prism) = block();
        let wall = south_wall(&mesh, &prism);
        let mut building = Building::new(mesh);
        let params = GeneratorParameters::Window(WindowParameters {
            fill: FillParameters::GlassPanes(GlassPaneFill::default()),
            ..WindowParameters::default()
        });
        let id = building.add_feature(&Selection::face(wall), params).unwrap();

        let json = building.to_json().unwrap();
        let loaded = Building::from_json(&json, GeneratorConfig::default()).unwrap();
        assert_eq!(loaded.mesh().signature(), building.mesh().signature());
        assert_eq!(loaded.generated_faces(id).unwrap().len(), building.generated_faces(id).unwrap().len());
    }

    #[test]
    fn reload_rejects_anchors_that_do_not_resolve() {
        let (mesh, prism) = block();
        let wall = south_wall(&mesh, &prism);
        let mut building = Building::new(mesh);
        building.add_feature(&Selection::face(wall), window()).unwrap();
        let json = building.to_json().unwrap();

        // Same index over an unrelated base.
        let mut state: BuildingState = serde_json::from_str(&json).unwrap();
        let mut other = Mesh::new();
        build_box(
            &mut other,
            Point3::new(50.0, 50.0, 0.0),
            Vector3::x(),
            Vector3::y(),
            Vector3::z(),
            0,
        )
        .unwrap();
        state.base = other.to_snapshot();
        let json = serde_json::to_string(&state).unwrap();

        let err = Building::from_json(&json, GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidIndex(_)));
    }

    #[test]
    fn base_edits_are_replayed_under_features() {
        let (mesh, prism) = block();
        let wall = south_wall(&mesh, &prism);
        let mut building = Building::new(mesh);
        building.add_feature(&Selection::face(wall), window()).unwrap();
        let faces = building.mesh().face_count();

        let marker = building
            .edit_base(|m| {
                let a = m.add_vertex(10.0, 0.0, 0.0);
                let b = m.add_vertex(11.0, 0.0, 0.0);
                let c = m.add_vertex(10.0, 1.0, 0.0);
                Ok(m.add_face(&[a, b, c], 0)?)
            })
            .unwrap();
        assert!(building.base().face(marker).is_some());
        assert_eq!(building.mesh().face_count(), faces + 1);
    }
}
