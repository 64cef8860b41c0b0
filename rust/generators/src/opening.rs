// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Window and door generators.
//!
//! Both cut evenly spaced openings out of a wall face and then run each one
//! through the same stages: frame placement, optional arch, fill and material
//! assignment. Doors add a double-leaf split, grooves and glazed panes.

use std::fmt;

use nalgebra::Vector3;
use storey_kernel::{FaceKey, GridLines, Mesh};
use tracing::{debug, info};

use crate::arch::{build_arch, ArchResult};
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::fill::{apply_fill, FillResult};
use crate::materials::{MaterialRole, MaterialSlotAssignment};
use crate::params::{DoorPaneParameters, DoorParameters, GrooveParameters, SizeOffset, WindowParameters};
use crate::split::{carve, carve_spans, face_size, Rect};

/// Build stage of one opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpeningStage {
    SelectFace,
    PlaceFrame,
    SplitFillArea,
    ApplyFill,
    AssignMaterials,
    Done,
}

impl OpeningStage {
    pub fn next(self) -> Option<Self> {
        match self {
            OpeningStage::SelectFace => Some(OpeningStage::PlaceFrame),
            OpeningStage::PlaceFrame => Some(OpeningStage::SplitFillArea),
            OpeningStage::SplitFillArea => Some(OpeningStage::ApplyFill),
            OpeningStage::ApplyFill => Some(OpeningStage::AssignMaterials),
            OpeningStage::AssignMaterials => Some(OpeningStage::Done),
            OpeningStage::Done => None,
        }
    }
}

impl fmt::Display for OpeningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpeningStage::SelectFace => "select_face",
            OpeningStage::PlaceFrame => "place_frame",
            OpeningStage::SplitFillArea => "split_fill_area",
            OpeningStage::ApplyFill => "apply_fill",
            OpeningStage::AssignMaterials => "assign_materials",
            OpeningStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Walks one opening through its stages in order.
#[derive(Debug)]
struct StageTracker {
    opening: usize,
    stage: OpeningStage,
}

impl StageTracker {
    fn new(opening: usize) -> Self {
        Self {
            opening,
            stage: OpeningStage::SelectFace,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            debug!(opening = self.opening, from = %self.stage, to = %next, "opening stage");
            self.stage = next;
        }
    }
}

/// Faces generated for a single opening.
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningParts {
    /// Frame rings, reveals and the wall left above an arch.
    pub frame: Vec<FaceKey>,
    /// Door leaves; empty for windows.
    pub leaves: Vec<FaceKey>,
    /// Groove floors and walls cut into door leaves.
    pub grooves: Vec<FaceKey>,
    pub arch: Option<ArchResult>,
    /// Fill of every leaf, or of the window opening.
    pub fill: Vec<FillResult>,
    pub stage: OpeningStage,
}

impl OpeningParts {
    fn new() -> Self {
        Self {
            frame: Vec::new(),
            leaves: Vec::new(),
            grooves: Vec::new(),
            arch: None,
            fill: Vec::new(),
            stage: OpeningStage::SelectFace,
        }
    }

    pub fn faces(&self) -> Vec<FaceKey> {
        let mut out: Vec<FaceKey> = self.frame.iter().chain(&self.leaves).chain(&self.grooves).copied().collect();
        if let Some(arch) = &self.arch {
            out.extend(arch.arch);
        }
        for fill in &self.fill {
            out.extend(fill.faces());
        }
        out.sort();
        out.dedup();
        out
    }
}

/// Result of a window or door build.
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningResult {
    pub openings: Vec<OpeningParts>,
    /// Wall cells left around the openings.
    pub wall: Vec<FaceKey>,
    pub slots: MaterialSlotAssignment,
}

/// Checks that a face can host openings and returns its normal.
fn validate_host(mesh: &Mesh, face: FaceKey, config: &GeneratorConfig) -> Result<Vector3<f64>> {
    if !mesh.is_planar(face, config.tolerance.max(1e-6)) {
        return Err(Error::InvalidPlacement("host face is not planar".into()));
    }
    if !mesh.is_convex(face) {
        return Err(Error::InvalidPlacement("host face is not convex".into()));
    }
    mesh.quad_corners(face)
        .map_err(|e| Error::InvalidPlacement(format!("host face is not quad-like: {e}")))?;
    mesh.face_normal(face)
        .ok_or_else(|| Error::InvalidPlacement("host face has no normal".into()))
}

/// Horizontal spans of `count` openings, each centred in its slot.
fn opening_spans(count: u32, size: &SizeOffset, width: f64, tolerance: f64) -> Result<Vec<(f64, f64)>> {
    let count = count.max(1);
    let slot = width / count as f64;
    (0..count)
        .map(|i| {
            let centre = slot * (i as f64 + 0.5) + size.offset.0;
            let (x0, x1) = (centre - size.size.0 / 2.0, centre + size.size.0 / 2.0);
            let (lo, hi) = (slot * i as f64, slot * (i + 1) as f64);
            if size.size.0 <= tolerance || x0 < lo - tolerance || x1 > hi + tolerance {
                return Err(Error::InvalidPlacement(format!(
                    "opening {i} spans {x0:.4}..{x1:.4}, outside its slot {lo:.4}..{hi:.4}"
                )));
            }
            Ok((x0.max(lo), x1.min(hi)))
        })
        .collect()
}

/// Insets a ring of `thickness` and pushes the inner face along `push`.
/// Returns the inner face; ring and reveal faces go to `frame`.
fn framed(
    mesh: &mut Mesh,
    face: FaceKey,
    thickness: f64,
    push: Vector3<f64>,
    frame: &mut Vec<FaceKey>,
    config: &GeneratorConfig,
) -> Result<FaceKey> {
    let inner = if thickness > config.tolerance {
        let (inner, ring) = mesh.inset_face(face, thickness)?;
        frame.extend(ring);
        inner
    } else {
        face
    };
    if push.norm() > config.tolerance {
        let (sides, _) = mesh.extrude_face(inner, &push)?;
        frame.extend(sides);
    }
    Ok(inner)
}

/// Builds windows into a wall face.
///
/// The mesh is left untouched on failure.
pub fn build_window(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &WindowParameters,
    config: &GeneratorConfig,
) -> Result<OpeningResult> {
    mesh.staged(|m| window(m, face, params, config))
}

fn window(mesh: &mut Mesh, face: FaceKey, params: &WindowParameters, config: &GeneratorConfig) -> Result<OpeningResult> {
    let normal = validate_host(mesh, face, config)?;
    let (width, height) = face_size(mesh, face)?;
    let size = &params.size_offset;
    let spans = opening_spans(params.count, size, width, config.tolerance)?;
    let bottom = height / 2.0 + size.offset.1 - size.size.1 / 2.0;
    let carved = carve_spans(mesh, face, &spans, (bottom, bottom + size.size.1), config.tolerance)?;

    let mut slots = MaterialSlotAssignment::new();
    let mut openings = Vec::with_capacity(carved.focus.len());
    for (i, &opening) in carved.focus.iter().enumerate() {
        let mut tracker = StageTracker::new(i);
        let mut parts = OpeningParts::new();

        tracker.advance();
        if params.frame_depth.abs() > config.tolerance {
            let (sides, _) = mesh.extrude_face(opening, &(normal * params.frame_depth))?;
            parts.frame.extend(sides);
        }
        let glazing = framed(
            mesh,
            opening,
            params.frame_thickness,
            -normal * params.window_depth,
            &mut parts.frame,
            config,
        )?;

        tracker.advance();
        let fill_face = if params.add_arch {
            let arch = build_arch(mesh, glazing, &params.arch, config)?;
            parts.frame.extend(arch.remnant);
            parts.frame.extend(arch.detail.iter().copied());
            let lower = arch.lower;
            parts.arch = Some(arch);
            lower
        } else {
            glazing
        };

        tracker.advance();
        parts.fill.push(apply_fill(mesh, fill_face, &params.fill, config)?);

        tracker.advance();
        slots.assign(mesh, &parts.frame, MaterialRole::Frame)?;
        if let Some(arch_face) = parts.arch.as_ref().and_then(|a| a.arch) {
            slots.assign(mesh, &[arch_face], MaterialRole::Glass)?;
        }
        for fill in &parts.fill {
            fill.assign_roles(mesh, &mut slots)?;
        }

        tracker.advance();
        parts.stage = tracker.stage;
        openings.push(parts);
    }

    info!(openings = openings.len(), "built window");
    Ok(OpeningResult {
        openings,
        wall: carved.rest,
        slots,
    })
}

/// Builds doors into a wall face.
///
/// The mesh is left untouched on failure.
pub fn build_door(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &DoorParameters,
    config: &GeneratorConfig,
) -> Result<OpeningResult> {
    mesh.staged(|m| door(m, face, params, config))
}

fn door(mesh: &mut Mesh, face: FaceKey, params: &DoorParameters, config: &GeneratorConfig) -> Result<OpeningResult> {
    let normal = validate_host(mesh, face, config)?;
    let (width, _) = face_size(mesh, face)?;
    let size = &params.size_offset;
    let spans = opening_spans(params.count, size, width, config.tolerance)?;
    let bottom = size.offset.1;
    let carved = carve_spans(mesh, face, &spans, (bottom, bottom + size.size.1), config.tolerance)?;

    let mut slots = MaterialSlotAssignment::new();
    let mut openings = Vec::with_capacity(carved.focus.len());
    for (i, &opening) in carved.focus.iter().enumerate() {
        let mut tracker = StageTracker::new(i);
        let mut parts = OpeningParts::new();

        tracker.advance();
        let mut leaf = opening;
        if params.outer_frame_thickness > config.tolerance {
            let depth = normal * params.outer_frame_depth;
            if depth.norm() > config.tolerance {
                let (sides, _) = mesh.extrude_face(leaf, &depth)?;
                parts.frame.extend(sides);
            }
            leaf = framed(mesh, leaf, params.outer_frame_thickness, -depth, &mut parts.frame, config)?;
        }
        leaf = framed(
            mesh,
            leaf,
            params.inner_frame_thickness,
            -normal * params.inner_frame_depth,
            &mut parts.frame,
            config,
        )?;

        tracker.advance();
        if params.add_arch {
            let arch = build_arch(mesh, leaf, &params.arch, config)?;
            parts.frame.extend(arch.remnant);
            parts.frame.extend(arch.detail.iter().copied());
            leaf = arch.lower;
            parts.arch = Some(arch);
        }
        let halves = if params.double_door {
            mesh.split_face(leaf, &GridLines::new(vec![0.0, 0.5, 1.0], vec![0.0, 1.0])?)?
        } else {
            vec![leaf]
        };

        tracker.advance();
        for leaf in halves {
            let (lower, upper) = if params.panes.enabled {
                let (_, h) = face_size(mesh, leaf)?;
                let at = params.panes.offset;
                if at <= config.tolerance || at >= h - config.tolerance {
                    return Err(Error::InvalidPlacement(format!(
                        "door panes start at {at} outside a {h:.4} m leaf"
                    )));
                }
                let rows = mesh.split_face(leaf, &GridLines::new(vec![0.0, 1.0], vec![0.0, at / h, 1.0])?)?;
                (rows[0], Some(rows[1]))
            } else {
                (leaf, None)
            };
            if params.grooves.enabled {
                let grooves = cut_grooves(mesh, lower, &params.grooves, normal, &mut parts.leaves, config)?;
                parts.grooves.extend(grooves);
            } else {
                parts.leaves.push(lower);
            }
            if let Some(upper) = upper {
                let panes = glaze_leaf(mesh, upper, &params.panes, normal, &mut parts.leaves, config)?;
                parts.fill.push(panes);
            }
        }

        tracker.advance();
        slots.assign(mesh, &parts.leaves, MaterialRole::Pane)?;
        slots.assign(mesh, &parts.frame, MaterialRole::Frame)?;
        slots.assign(mesh, &parts.grooves, MaterialRole::Groove)?;
        if let Some(arch_face) = parts.arch.as_ref().and_then(|a| a.arch) {
            slots.assign(mesh, &[arch_face], MaterialRole::Glass)?;
        }
        for fill in &parts.fill {
            fill.assign_roles(mesh, &mut slots)?;
        }

        tracker.advance();
        parts.stage = tracker.stage;
        openings.push(parts);
    }

    info!(openings = openings.len(), double = params.double_door, "built door");
    Ok(OpeningResult {
        openings,
        wall: carved.rest,
        slots,
    })
}

/// Cuts a grid of shallow grooves into a leaf region. Returns the groove
/// floors and walls; margins and the ridges between grooves go to `leaf`.
fn cut_grooves(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &GrooveParameters,
    normal: Vector3<f64>,
    leaf: &mut Vec<FaceKey>,
    config: &GeneratorConfig,
) -> Result<Vec<FaceKey>> {
    let cells = leaf_grid(mesh, face, params.width, params.thickness, params.offset, params.count, leaf, config)?;
    let mut grooves = Vec::new();
    for cell in cells {
        let floor = if params.thickness > config.tolerance {
            let (inner, ring) = mesh.inset_face(cell, params.thickness)?;
            leaf.extend(ring);
            inner
        } else {
            cell
        };
        if params.depth.abs() > config.tolerance {
            let (walls, _) = mesh.extrude_face(floor, &(-normal * params.depth))?;
            grooves.extend(walls);
        }
        grooves.push(floor);
    }
    Ok(grooves)
}

/// Glazes the upper part of a leaf with a grid of recessed panes.
fn glaze_leaf(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &DoorPaneParameters,
    normal: Vector3<f64>,
    leaf: &mut Vec<FaceKey>,
    config: &GeneratorConfig,
) -> Result<FillResult> {
    let cells = leaf_grid(mesh, face, params.width, params.thickness, 0.0, params.count, leaf, config)?;
    let mut result = FillResult::default();
    for cell in cells {
        let pane = if params.thickness > config.tolerance {
            let (inner, ring) = mesh.inset_face(cell, params.thickness)?;
            leaf.extend(ring);
            inner
        } else {
            cell
        };
        if params.depth.abs() > config.tolerance {
            let (sides, _) = mesh.extrude_face(pane, &(-normal * params.depth))?;
            result.frame.extend(sides);
        }
        result.panes.push(pane);
    }
    Ok(result)
}

/// Carves a centred band covering `width` of the face, with vertical
/// margins of `margin` shifted up by `shift`, and splits it into a uniform
/// grid. Margin cells go to `leaf`.
#[allow(clippy::too_many_arguments)]
fn leaf_grid(
    mesh: &mut Mesh,
    face: FaceKey,
    width: f64,
    margin: f64,
    shift: f64,
    count: (u32, u32),
    leaf: &mut Vec<FaceKey>,
    config: &GeneratorConfig,
) -> Result<Vec<FaceKey>> {
    let (w, h) = face_size(mesh, face)?;
    let span = w * width.clamp(0.0, 1.0);
    let margin = margin.max(0.0);
    let rect = Rect::new((w - span) / 2.0, margin + shift, span, h - 2.0 * margin);
    let carved = carve(mesh, face, rect, config.tolerance)?;
    leaf.extend(carved.rest);

    let lines = GridLines::uniform(count.0.max(1) as usize, count.1.max(1) as usize);
    Ok(mesh.split_face(carved.focus[0], &lines)?)
}
