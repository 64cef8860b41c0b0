// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Window and door infill: bar grids, glass pane grids and louvers.

use nalgebra::Vector3;
use storey_kernel::{FaceKey, GridLines, Mesh};
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::materials::{MaterialRole, MaterialSlotAssignment};
use crate::params::{BarFill, FillParameters, GlassPaneFill, LouverFill};
use crate::split::face_size;

/// Faces produced by a fill, grouped by material role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillResult {
    /// Margin frame around louvers.
    pub frame: Vec<FaceKey>,
    /// Outer ring and interior bars.
    pub bars: Vec<FaceKey>,
    pub panes: Vec<FaceKey>,
    pub louvers: Vec<FaceKey>,
    /// Extrusion sides of bars and pane recesses.
    pub sides: Vec<FaceKey>,
}

impl FillResult {
    pub fn faces(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.frame
            .iter()
            .chain(&self.bars)
            .chain(&self.panes)
            .chain(&self.louvers)
            .chain(&self.sides)
            .copied()
    }

    pub fn assign_roles(&self, mesh: &mut Mesh, slots: &mut MaterialSlotAssignment) -> Result<()> {
        slots.assign(mesh, &self.frame, MaterialRole::Frame)?;
        slots.assign(mesh, &self.bars, MaterialRole::Bar)?;
        slots.assign(mesh, &self.sides, MaterialRole::Bar)?;
        slots.assign(mesh, &self.panes, MaterialRole::Glass)?;
        slots.assign(mesh, &self.louvers, MaterialRole::Louver)?;
        Ok(())
    }
}

/// Fills an opening face. With no fill the face itself becomes the pane.
pub fn apply_fill(mesh: &mut Mesh, face: FaceKey, fill: &FillParameters, config: &GeneratorConfig) -> Result<FillResult> {
    match fill {
        FillParameters::None => Ok(FillResult {
            panes: vec![face],
            ..FillResult::default()
        }),
        FillParameters::Bars(params) => bar_fill(mesh, face, params, config),
        FillParameters::GlassPanes(params) => glass_pane_fill(mesh, face, params, config),
        FillParameters::Louver(params) => louver_fill(mesh, face, params, config),
    }
}

fn degenerate(msg: String) -> Error {
    Error::Kernel(storey_kernel::Error::DegenerateGeometry(msg))
}

/// Alternating pane/bar lines across one axis of the inner face.
///
/// Returns normalized lines with `count` panes separated by bars of
/// `thickness`; fails when the panes would have no size left.
fn pane_lines(count: u32, thickness: f64, extent: f64, tolerance: f64) -> Result<Vec<f64>> {
    let count = count.max(1) as usize;
    let pane = (extent - (count - 1) as f64 * thickness) / count as f64;
    if pane <= tolerance {
        return Err(degenerate(format!(
            "{count} panes with {thickness} m bars do not fit {extent:.4} m"
        )));
    }
    let mut lines = vec![0.0];
    let mut at = 0.0;
    for i in 0..count {
        at += pane;
        if i + 1 == count {
            lines.push(1.0);
        } else {
            lines.push(at / extent);
            at += thickness;
            lines.push(at / extent);
        }
    }
    Ok(lines)
}

/// Ring, bars and pane cells laid out over a face.
struct PaneGrid {
    ring: Vec<FaceKey>,
    bars: Vec<FaceKey>,
    panes: Vec<FaceKey>,
}

fn layout_panes(
    mesh: &mut Mesh,
    face: FaceKey,
    counts: (u32, u32),
    thickness: f64,
    config: &GeneratorConfig,
) -> Result<PaneGrid> {
    let (width, height) = face_size(mesh, face)?;
    if thickness <= config.tolerance || 2.0 * thickness >= width.min(height) {
        return Err(degenerate(format!(
            "bar thickness {thickness} does not fit a {width:.4} x {height:.4} face"
        )));
    }
    let (iw, ih) = (width - 2.0 * thickness, height - 2.0 * thickness);
    let columns = pane_lines(counts.0, thickness, iw, config.tolerance)?;
    let rows = pane_lines(counts.1, thickness, ih, config.tolerance)?;

    let (inner, ring) = mesh.inset_face(face, thickness)?;
    let lines = GridLines::new(columns, rows)?;
    let nc = lines.column_count();
    let cells = mesh.split_face(inner, &lines)?;

    let mut bars = Vec::new();
    let mut panes = Vec::new();
    for (i, &cell) in cells.iter().enumerate() {
        let (col, row) = (i % nc, i / nc);
        if col % 2 == 0 && row % 2 == 0 {
            panes.push(cell);
        } else {
            bars.push(cell);
        }
    }
    Ok(PaneGrid { ring, bars, panes })
}

/// Bar grid: panes are cut away and the bars pushed out by `depth`.
pub fn bar_fill(mesh: &mut Mesh, face: FaceKey, params: &BarFill, config: &GeneratorConfig) -> Result<FillResult> {
    let normal = face_normal(mesh, face)?;
    let grid = layout_panes(mesh, face, (params.count_x, params.count_y), params.thickness, config)?;
    mesh.delete_faces(&grid.panes)?;

    let mut bars = grid.ring;
    bars.extend(grid.bars);
    let extrusion = mesh.extrude_region(&bars, &(normal * params.depth))?;

    debug!(bars = bars.len(), sides = extrusion.sides.len(), "bar fill");
    Ok(FillResult {
        bars,
        sides: extrusion.sides,
        ..FillResult::default()
    })
}

/// Glass panes recessed by `depth` between flush bars.
pub fn glass_pane_fill(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &GlassPaneFill,
    config: &GeneratorConfig,
) -> Result<FillResult> {
    let normal = face_normal(mesh, face)?;
    let grid = layout_panes(mesh, face, (params.count_x, params.count_y), params.thickness, config)?;

    let mut sides = Vec::new();
    for &pane in &grid.panes {
        let (walls, _) = mesh.extrude_face(pane, &(-normal * params.depth))?;
        sides.extend(walls);
    }

    let mut bars = grid.ring;
    bars.extend(grid.bars);
    debug!(panes = grid.panes.len(), "glass pane fill");
    Ok(FillResult {
        bars,
        panes: grid.panes,
        sides,
        ..FillResult::default()
    })
}

/// Horizontal slats inside a margin frame, each tilted 45° downward.
pub fn louver_fill(mesh: &mut Mesh, face: FaceKey, params: &LouverFill, config: &GeneratorConfig) -> Result<FillResult> {
    if params.depth <= config.tolerance {
        return Err(degenerate(format!("louver depth {} must be positive", params.depth)));
    }
    let normal = face_normal(mesh, face)?;
    let (_, height) = face_size(mesh, face)?;
    let inner_height = height - 2.0 * params.margin.max(0.0);
    let count = ((params.density * inner_height / params.depth + 1e-9).floor() as usize)
        .clamp(1, config.max_slats.max(1));

    let (inner, frame) = if params.margin > config.tolerance {
        mesh.inset_face(face, params.margin)?
    } else {
        (face, Vec::new())
    };
    let [bl, _, _, tl] = mesh.quad_corners(inner)?;
    let up = match (mesh.vertex_point(bl), mesh.vertex_point(tl)) {
        (Some(b), Some(t)) => (t - b).normalize(),
        _ => return Err(degenerate("louver face lost its corners".into())),
    };
    let tilt: Vector3<f64> = (normal - up).normalize() * params.depth;

    let slats = mesh.split_face(inner, &GridLines::uniform(1, count))?;
    let mut louvers = Vec::with_capacity(slats.len() * 5);
    for &slat in &slats {
        let (walls, moved) = mesh.extrude_face(slat, &tilt)?;
        louvers.push(moved);
        louvers.extend(walls);
    }

    debug!(slats = slats.len(), "louver fill");
    Ok(FillResult {
        frame,
        louvers,
        ..FillResult::default()
    })
}

fn face_normal(mesh: &Mesh, face: FaceKey) -> Result<Vector3<f64>> {
    mesh.face_normal(face)
        .ok_or_else(|| degenerate("fill face has no normal".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use storey_kernel::make_quad;

    fn opening(mesh: &mut Mesh) -> FaceKey {
        let v0 = mesh.add_vertex(0.0, 0.0, 0.0);
        let v1 = mesh.add_vertex(1.0, 0.0, 0.0);
        let v2 = mesh.add_vertex(1.0, 0.0, 1.0);
        let v3 = mesh.add_vertex(0.0, 0.0, 1.0);
        make_quad(mesh, v0, v1, v2, v3).unwrap()
    }

    #[test]
    fn single_bar_cell_is_a_ring() {
        let mut mesh = Mesh::new();
        let face = opening(&mut mesh);
        let result = bar_fill(&mut mesh, face, &BarFill::default(), &GeneratorConfig::default()).unwrap();

        assert_eq!(result.bars.len(), 4);
        assert!(result.panes.is_empty());
        assert_eq!(result.sides.len(), 8);
        assert!(!mesh.contains(face.into()));
        for &bar in &result.bars {
            assert_relative_eq!(mesh.face_centroid(bar).unwrap().y, -0.05, epsilon = 1e-9);
        }
    }

    #[test]
    fn bar_grid_counts() {
        let mut mesh = Mesh::new();
        let face = opening(&mut mesh);
        let params = BarFill {
            count_x: 2,
            count_y: 3,
            ..BarFill::default()
        };
        let result = bar_fill(&mut mesh, face, &params, &GeneratorConfig::default()).unwrap();
        // 3 x 5 cells, 6 of them panes, plus the 4 ring faces.
        assert_eq!(result.bars.len(), 4 + 9);
        assert!(mesh.non_manifold_edges().is_empty());
    }

    #[test]
    fn crowded_bars_are_degenerate() {
        let mut mesh = Mesh::new();
        let face = opening(&mut mesh);
        let params = BarFill {
            count_x: 10,
            thickness: 0.1,
            ..BarFill::default()
        };
        let err = bar_fill(&mut mesh, face, &params, &GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Kernel(storey_kernel::Error::DegenerateGeometry(_))));
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn glass_panes_are_recessed() {
        let mut mesh = Mesh::new();
        let face = opening(&mut mesh);
        let result =
            glass_pane_fill(&mut mesh, face, &GlassPaneFill::default(), &GeneratorConfig::default()).unwrap();

        assert_eq!(result.panes.len(), 4);
        assert_eq!(result.sides.len(), 16);
        for &pane in &result.panes {
            assert_relative_eq!(mesh.face_centroid(pane).unwrap().y, 0.02, epsilon = 1e-9);
            let pane_width = (0.9 - 0.05) / 2.0;
            assert_relative_eq!(mesh.face_area(pane).unwrap(), pane_width * pane_width, epsilon = 1e-9);
        }
    }

    #[test]
    fn louver_slat_count_follows_density() {
        let mut mesh = Mesh::new();
        let face = opening(&mut mesh);
        let params = LouverFill {
            depth: 0.07,
            ..LouverFill::default()
        };
        let result = louver_fill(&mut mesh, face, &params, &GeneratorConfig::default()).unwrap();

        // floor(0.5 * 0.8 / 0.07) = 5 slats, each with four walls.
        assert_eq!(result.louvers.len(), 5 * 5);
        assert_eq!(result.frame.len(), 4);
        // Slats lean down and out of the wall.
        let slat = result.louvers[0];
        let c = mesh.face_centroid(slat).unwrap();
        assert!(c.y < 0.0);
        assert_relative_eq!(c.z, 0.1 + 0.08 - 0.07 / 2f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn louver_slats_are_capped() {
        let mut mesh = Mesh::new();
        let face = opening(&mut mesh);
        let params = LouverFill {
            depth: 1e-4,
            ..LouverFill::default()
        };
        let config = GeneratorConfig {
            max_slats: 8,
            ..GeneratorConfig::default()
        };
        let result = louver_fill(&mut mesh, face, &params, &config).unwrap();
        assert_eq!(result.louvers.len(), 8 * 5);
    }

    #[test]
    fn roles_map_to_slots() {
        let mut mesh = Mesh::new();
        let face = opening(&mut mesh);
        let result = apply_fill(&mut mesh, face, &FillParameters::None, &GeneratorConfig::default()).unwrap();
        let mut slots = MaterialSlotAssignment::new();
        result.assign_roles(&mut mesh, &mut slots).unwrap();
        let glass = slots.get(MaterialRole::Glass).unwrap();
        assert_eq!(mesh.face_material(face), Some(glass));
    }
}
