// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON serialization and canonical signatures for meshes.
//!
//! Snapshots map slot map keys to sequential integer ids so they can be
//! stored and reloaded. Signatures go further and drop identity entirely:
//! two meshes with the same quantized geometry, face loops and materials
//! compare equal no matter how their keys were allocated.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keys::*;
use crate::mesh::Mesh;

/// Coordinates are compared on a 1 µm lattice.
const QUANTUM: f64 = 1e-6;

/// Serializable representation of a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub vertices: Vec<VertexSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
    pub faces: Vec<FaceSnapshot>,
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSnapshot {
    pub id: usize,
    pub vertices: Vec<usize>,
    pub material: usize,
}

/// Key-independent canonical form of a mesh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshSignature {
    /// Sorted quantized vertex positions.
    pub vertices: Vec<[i64; 3]>,
    /// Sorted undirected edges as quantized endpoint pairs.
    pub edges: Vec<([i64; 3], [i64; 3])>,
    /// Sorted faces: loop rotated to its smallest point, plus material name.
    pub faces: Vec<(Vec<[i64; 3]>, String)>,
}

impl Mesh {
    /// Serializes the mesh to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot()).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserializes a mesh from a JSON string produced by [`Mesh::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: MeshSnapshot = serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_snapshot(&snapshot)
    }

    /// Creates a serializable snapshot, keys mapped to sequential ids.
    pub fn to_snapshot(&self) -> MeshSnapshot {
        let mut vertex_ids = FxHashMap::default();

        let vertices: Vec<VertexSnapshot> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, (k, v))| {
                vertex_ids.insert(k, i);
                VertexSnapshot {
                    id: i,
                    x: v.x,
                    y: v.y,
                    z: v.z,
                }
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, (_, e))| EdgeSnapshot {
                id: i,
                start: vertex_ids[&e.start],
                end: vertex_ids[&e.end],
            })
            .collect();

        let faces = self
            .faces
            .iter()
            .enumerate()
            .map(|(i, (_, f))| FaceSnapshot {
                id: i,
                vertices: f.vertices.iter().map(|v| vertex_ids[v]).collect(),
                material: f.material,
            })
            .collect();

        MeshSnapshot {
            vertices,
            edges,
            faces,
            materials: self.materials.clone(),
        }
    }

    /// Rebuilds a mesh from a snapshot, validating every reference.
    pub fn from_snapshot(snapshot: &MeshSnapshot) -> Result<Self> {
        let mut mesh = Mesh::new();
        if snapshot.materials.is_empty() {
            return Err(Error::Serialization("snapshot has no material slots".into()));
        }
        mesh.materials = snapshot.materials.clone();

        let mut vertex_map: FxHashMap<usize, VertexKey> = FxHashMap::default();
        for vs in &snapshot.vertices {
            let vk = mesh.add_vertex(vs.x, vs.y, vs.z);
            if vertex_map.insert(vs.id, vk).is_some() {
                return Err(Error::Serialization(format!("duplicate vertex id {}", vs.id)));
            }
        }
        let lookup = |id: usize| {
            vertex_map
                .get(&id)
                .copied()
                .ok_or_else(|| Error::Serialization(format!("unknown vertex id {id}")))
        };

        for es in &snapshot.edges {
            mesh.ensure_edge(lookup(es.start)?, lookup(es.end)?)?;
        }
        for fs in &snapshot.faces {
            if fs.material >= mesh.materials.len() {
                return Err(Error::Serialization(format!(
                    "face {} uses unknown material slot {}",
                    fs.id, fs.material
                )));
            }
            let verts = fs.vertices.iter().map(|&id| lookup(id)).collect::<Result<Vec<_>>>()?;
            mesh.add_face(&verts, fs.material)?;
        }
        Ok(mesh)
    }

    /// Computes the canonical signature of the mesh.
    pub fn signature(&self) -> MeshSignature {
        let q = |x: f64| (x / QUANTUM).round() as i64;
        let point = |vk: &VertexKey| -> [i64; 3] {
            self.vertices
                .get(*vk)
                .map(|v| [q(v.x), q(v.y), q(v.z)])
                .unwrap_or([i64::MIN; 3])
        };

        let mut vertices: Vec<[i64; 3]> = self.vertices.keys().map(|k| point(&k)).collect();
        vertices.sort();

        let mut edges: Vec<([i64; 3], [i64; 3])> = self
            .edges
            .values()
            .map(|e| {
                let (a, b) = (point(&e.start), point(&e.end));
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect();
        edges.sort();

        let mut faces: Vec<(Vec<[i64; 3]>, String)> = self
            .faces
            .values()
            .map(|f| {
                let mut ring: Vec<[i64; 3]> = f.vertices.iter().map(&point).collect();
                let start = ring
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, p)| **p)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                ring.rotate_left(start);
                let material = self.materials.get(f.material).cloned().unwrap_or_default();
                (ring, material)
            })
            .collect();
        faces.sort();

        MeshSignature {
            vertices,
            edges,
            faces,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::make_quad;
    use nalgebra::Vector3;

    fn block(mesh: &mut Mesh) {
        let v0 = mesh.add_vertex(0.0, 0.0, 0.0);
        let v1 = mesh.add_vertex(1.0, 0.0, 0.0);
        let v2 = mesh.add_vertex(1.0, 1.0, 0.0);
        let v3 = mesh.add_vertex(0.0, 1.0, 0.0);
        let face = make_quad(mesh, v0, v1, v2, v3).unwrap();
        mesh.extrude_face(face, &Vector3::new(0.0, 0.0, 1.0)).unwrap();
        let slot = mesh.material_slot("roof");
        mesh.set_face_material(face, slot).unwrap();
    }

    #[test]
    fn json_reload_preserves_mesh() {
        let mut mesh = Mesh::new();
        block(&mut mesh);

        let json = mesh.to_json().unwrap();
        let restored = Mesh::from_json(&json).unwrap();

        assert_eq!(restored.vertex_count(), mesh.vertex_count());
        assert_eq!(restored.edge_count(), mesh.edge_count());
        assert_eq!(restored.face_count(), mesh.face_count());
        assert_eq!(restored.signature(), mesh.signature());
        assert_eq!(restored.to_json().unwrap(), json);
    }

    #[test]
    fn signature_ignores_key_allocation() {
        let mut a = Mesh::new();
        block(&mut a);

        // Same geometry built after churn in the slot maps.
        let mut b = Mesh::new();
        let junk = b.add_vertex(9.0, 9.0, 9.0);
        b.prune_isolated_vertices();
        assert!(!b.contains(junk.into()));
        block(&mut b);

        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn signature_sees_material_changes() {
        let mut a = Mesh::new();
        block(&mut a);
        let before = a.signature();
        let face = a.face_keys().next().unwrap();
        let slot = a.material_slot("glass");
        a.set_face_material(face, slot).unwrap();
        assert_ne!(a.signature(), before);
    }

    #[test]
    fn malformed_snapshot_is_rejected() {
        let json = r#"{"vertices":[],"edges":[],"faces":[{"id":0,"vertices":[0,1,2],"material":0}],"materials":["default"]}"#;
        assert!(matches!(Mesh::from_json(json), Err(Error::Serialization(_))));
        assert!(Mesh::from_json("not json").is_err());
    }
}
