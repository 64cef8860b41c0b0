// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end: a small house with a window, a door and a roof, saved,
//! reloaded and edited.

use nalgebra::{Point3, Vector3};
use storey_generators::{
    Building, DoorParameters, Error, GeneratorConfig, GeneratorParameters, RoofParameters, Selection, WindowParameters,
};
use storey_kernel::{build_box, FaceKey, Mesh, Prism};

fn house() -> (Mesh, Prism) {
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

fn wall_facing(mesh: &Mesh, prism: &Prism, dir: Vector3<f64>) -> FaceKey {
    prism
        .sides
        .iter()
        .copied()
        .find(|&f| mesh.face_normal(f).unwrap().dot(&dir) > 0.9)
        .unwrap()
}

fn window() -> GeneratorParameters {
    GeneratorParameters::Window(WindowParameters::default())
}

fn door() -> GeneratorParameters {
    GeneratorParameters::Door(DoorParameters::default())
}

fn roof() -> GeneratorParameters {
    GeneratorParameters::Roof(RoofParameters::default())
}

#[test]
fn house_survives_save_reload_and_removal() {
    let (mesh, prism) = house();
    let south = wall_facing(&mesh, &prism, -Vector3::y());
    let north = wall_facing(&mesh, &prism, Vector3::y());
    let mut building = Building::new(mesh);

    let win = building.add_feature(&Selection::face(south), window()).unwrap();
    let entrance = building.add_feature(&Selection::face(north), door()).unwrap();
    let top = building.add_feature(&Selection::face(prism.top), roof()).unwrap();
    assert_eq!(building.instances().len(), 3);

    let window_faces = building.generated_faces(win).unwrap().to_vec();
    let door_faces = building.generated_faces(entrance).unwrap().to_vec();
    assert!(!building.generated_faces(top).unwrap().is_empty());
    assert!(window_faces.iter().all(|f| !door_faces.contains(f)));

    let json = building.to_json().unwrap();
    let reloaded = Building::from_json(&json, GeneratorConfig::default()).unwrap();
    assert_eq!(reloaded.mesh().signature(), building.mesh().signature());

    building.remove_feature(entrance).unwrap();

    let (mesh, prism) = house();
    let south = wall_facing(&mesh, &prism, -Vector3::y());
    let mut fresh = Building::new(mesh);
    fresh.add_feature(&Selection::face(south), window()).unwrap();
    fresh.add_feature(&Selection::face(prism.top), roof()).unwrap();
    assert_eq!(fresh.mesh().signature(), building.mesh().signature());
}

#[test]
fn base_edits_replay_features() {
    let (mesh, prism) = house();
    let south = wall_facing(&mesh, &prism, -Vector3::y());
    let mut building = Building::new(mesh);
    building.add_feature(&Selection::face(south), window()).unwrap();
    let faces = building.mesh().face_count();
    let vertices = building.mesh().vertex_count();

    building
        .edit_base(|base| {
            base.add_vertex(10.0, 10.0, 10.0);
            Ok(())
        })
        .unwrap();
    assert_eq!(building.mesh().face_count(), faces);
    assert_eq!(building.mesh().vertex_count(), vertices + 1);

    let before = building.mesh().signature();
    let err = building
        .edit_base(|_| -> storey_generators::Result<()> { Err(Error::InvalidPlacement("rejected".into())) })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPlacement(_)));
    assert_eq!(building.mesh().signature(), before);
}
