// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial index for tolerance-based vertex lookup.
//!
//! Uses a grid-based spatial hash for O(1) average-case nearest-vertex
//! queries. Geometry-based references (a face remembered by its corner
//! positions) resolve through it after the mesh has been rebuilt.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::keys::VertexKey;
use crate::mesh::Mesh;

/// A spatial hash grid for fast tolerance-based vertex lookup.
///
/// The grid divides 3D space into cubic cells of side `cell_size`. Lookups
/// check the 27 neighbouring cells (3x3x3 neighbourhood) for candidates
/// within tolerance.
#[derive(Debug)]
pub struct SpatialIndex {
    cell_size: f64,
    grid: FxHashMap<(i64, i64, i64), Vec<VertexKey>>,
}

impl SpatialIndex {
    /// Creates a new spatial index with the given cell size.
    ///
    /// `cell_size` should be >= the tolerance used for queries.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            grid: FxHashMap::default(),
        }
    }

    /// Builds a spatial index from all vertices of a mesh.
    pub fn from_mesh(mesh: &Mesh, cell_size: f64) -> Self {
        let mut index = Self::new(cell_size);
        for (key, data) in mesh.vertices.iter() {
            index.insert(key, &Point3::new(data.x, data.y, data.z));
        }
        index
    }

    /// Inserts a vertex key at the given position.
    pub fn insert(&mut self, key: VertexKey, p: &Point3<f64>) {
        let cell = self.cell_coords(p);
        self.grid.entry(cell).or_default().push(key);
    }

    /// Finds the vertex closest to `p`, if any lies within `tolerance`.
    ///
    /// Equal distances resolve to the smaller key so that lookups do not
    /// depend on hash iteration order.
    pub fn find_near(&self, mesh: &Mesh, p: &Point3<f64>, tolerance: f64) -> Option<VertexKey> {
        let mut best: Option<(f64, VertexKey)> = None;
        for (dist_sq, vk) in self.candidates(mesh, p, tolerance) {
            let closer = match best {
                None => true,
                Some((d, k)) => dist_sq < d || (dist_sq == d && vk < k),
            };
            if closer {
                best = Some((dist_sq, vk));
            }
        }
        best.map(|(_, vk)| vk)
    }

    fn candidates(&self, mesh: &Mesh, p: &Point3<f64>, tolerance: f64) -> Vec<(f64, VertexKey)> {
        let (cx, cy, cz) = self.cell_coords(p);
        let tol_sq = tolerance * tolerance;
        let mut out = Vec::new();

        // Search 3x3x3 neighbourhood
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(keys) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &vk in keys {
                        if let Some(v) = mesh.vertex(vk) {
                            let dist_sq = (v.x - p.x).powi(2) + (v.y - p.y).powi(2) + (v.z - p.z).powi(2);
                            if dist_sq <= tol_sq {
                                out.push((dist_sq, vk));
                            }
                        }
                    }
                }
            }
        }
        out
    }

    fn cell_coords(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }
}
