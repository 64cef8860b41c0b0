// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stairs: single flights stepped out of a face, and free-standing
//! staircases of landings joined by flights.

use nalgebra::{Point3, Vector3};
use storey_kernel::{build_box, build_prism, FaceKey, GridLines, Mesh, Prism, EPSILON};
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::materials::{MaterialRole, MaterialSlotAssignment};
use crate::params::{StaircaseParameters, StairsParameters};
use crate::railing::{build_railing_along, Polyline, RailingResult};
use crate::split::face_size;

/// Faces of a stepped flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StairsResult {
    /// Walking surfaces, top step first.
    pub treads: Vec<FaceKey>,
    /// Vertical step fronts, top step first.
    pub risers: Vec<FaceKey>,
    pub sides: Vec<FaceKey>,
}

impl StairsResult {
    pub fn faces(&self) -> Vec<FaceKey> {
        self.treads.iter().chain(&self.risers).chain(&self.sides).copied().collect()
    }
}

fn bad_stairs(msg: String) -> Error {
    Error::InvalidStairGeometry(msg)
}

/// Steps a flight out of a vertical face, descending away from it.
///
/// Each step extrudes the remaining face by the run and splits off the
/// riser of the step above. The mesh is left untouched on failure.
pub fn build_stairs(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &StairsParameters,
    up: &Vector3<f64>,
    config: &GeneratorConfig,
) -> Result<StairsResult> {
    mesh.staged(|m| stairs(m, face, params, up, config))
}

fn stairs(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &StairsParameters,
    up: &Vector3<f64>,
    config: &GeneratorConfig,
) -> Result<StairsResult> {
    if params.step_count == 0 {
        return Err(bad_stairs("a flight needs at least one step".into()));
    }
    if params.step_width <= config.tolerance {
        return Err(bad_stairs(format!("step width {} must be positive", params.step_width)));
    }
    let up = up
        .try_normalize(EPSILON)
        .ok_or_else(|| bad_stairs("up vector is zero".into()))?;
    let normal = mesh
        .face_normal(face)
        .ok_or_else(|| bad_stairs("profile face has no normal".into()))?;
    if normal.dot(&up).abs() > 0.5 {
        return Err(bad_stairs("profile face must be upright".into()));
    }
    let (_, height) = face_size(mesh, face)?;
    let count = params.step_count as usize;
    let rise = height / count as f64;
    if rise <= config.tolerance {
        return Err(bad_stairs(format!("step height {rise} is not positive")));
    }

    let run = normal * params.step_width;
    let mut result = StairsResult::default();
    let mut current = face;
    for step in 0..count {
        let (sides, cap) = mesh.extrude_face(current, &run)?;
        let tread = sides
            .iter()
            .copied()
            .max_by(|a, b| {
                let lift = |f: &FaceKey| mesh.face_normal(*f).map_or(f64::MIN, |n| n.dot(&up));
                lift(a).total_cmp(&lift(b))
            })
            .ok_or_else(|| bad_stairs("step extrusion produced no sides".into()))?;
        result.treads.push(tread);
        result.sides.extend(sides.into_iter().filter(|&f| f != tread));

        if step + 1 == count {
            result.risers.push(cap);
            break;
        }
        let (_, h) = face_size(mesh, cap)?;
        let cut = (h - rise) / h;
        let rows = mesh.split_face(cap, &GridLines::new(vec![0.0, 1.0], vec![0.0, cut, 1.0])?)?;
        result.risers.push(rows[1]);
        current = rows[0];
    }

    if params.scale > 0.0 {
        let recess = -normal * (params.scale * params.step_width / 2.0);
        for &riser in &result.risers {
            let (walls, _) = mesh.extrude_face(riser, &recess)?;
            result.sides.extend(walls);
        }
    }

    if !params.keep_bottom_faces {
        let bottoms: Vec<FaceKey> = result
            .sides
            .iter()
            .copied()
            .filter(|&f| mesh.face_normal(f).is_some_and(|n| n.dot(&up) < -0.5))
            .collect();
        mesh.delete_faces(&bottoms)?;
        result.sides.retain(|f| !bottoms.contains(f));
    }

    let mut slots = MaterialSlotAssignment::new();
    slots.assign(mesh, &result.treads, MaterialRole::Step)?;
    slots.assign(mesh, &result.risers, MaterialRole::Step)?;
    slots.assign(mesh, &result.sides, MaterialRole::Step)?;

    info!(steps = count, rise, "built stairs");
    Ok(result)
}

/// Steps of one flight between two landings.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub steps: Vec<Prism>,
    pub step_height: f64,
    pub step_depth: f64,
}

/// Geometry of a multi-landing staircase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaircaseResult {
    pub landings: Vec<Prism>,
    pub flights: Vec<Flight>,
    pub supports: Vec<Prism>,
    pub railings: Vec<RailingResult>,
}

impl StaircaseResult {
    pub fn faces(&self) -> Vec<FaceKey> {
        let mut out: Vec<FaceKey> = self
            .landings
            .iter()
            .chain(self.flights.iter().flat_map(|f| &f.steps))
            .chain(&self.supports)
            .flat_map(Prism::faces)
            .collect();
        for railing in &self.railings {
            out.extend(railing.faces());
        }
        out
    }
}

/// Builds a straight staircase starting at `origin`.
///
/// Landings run along +Y, rising along +Z, with their left edge at the
/// origin's X. Consecutive landings are joined by a flight whose steps
/// exactly span the gap. The mesh is left untouched on failure.
pub fn build_staircase(
    mesh: &mut Mesh,
    origin: &Point3<f64>,
    params: &StaircaseParameters,
    config: &GeneratorConfig,
) -> Result<StaircaseResult> {
    mesh.staged(|m| staircase(m, origin, params, config))
}

fn staircase(
    mesh: &mut Mesh,
    origin: &Point3<f64>,
    params: &StaircaseParameters,
    config: &GeneratorConfig,
) -> Result<StaircaseResult> {
    let tol = config.tolerance;
    if params.landing_count == 0 {
        return Err(bad_stairs("a staircase needs at least one landing".into()));
    }
    if params.landing_width <= tol || params.landing_length <= tol || params.landing_thickness <= tol {
        return Err(bad_stairs("landing dimensions must be positive".into()));
    }
    let flight_width = params.landing_width - 2.0 * params.step_gap;
    let steps = params.step_count as usize;
    if params.landing_count > 1 {
        if flight_width <= tol {
            return Err(bad_stairs(format!(
                "flight width {flight_width} leaves no room between {} m gaps",
                params.step_gap
            )));
        }
        if steps == 0 {
            return Err(bad_stairs("a flight needs at least one step".into()));
        }
    }
    let step_height = params.landing_offset_z / steps.max(1) as f64;
    let step_depth = params.landing_offset_y / steps.max(1) as f64;
    if params.landing_count > 1 && (step_height <= tol || step_depth <= tol) {
        return Err(bad_stairs(format!(
            "step height {step_height} and depth {step_depth} must both be positive"
        )));
    }

    let (x, y, z) = (Vector3::x(), Vector3::y(), Vector3::z());
    let pitch = params.landing_length + params.landing_offset_y;
    let landing_top = |i: usize| origin + y * (i as f64 * pitch) + z * (i as f64 * params.landing_offset_z);

    let mut result = StaircaseResult::default();
    for i in 0..params.landing_count as usize {
        let corner = landing_top(i) - z * params.landing_thickness;
        result.landings.push(build_box(
            mesh,
            corner,
            x * params.landing_width,
            y * params.landing_length,
            z * params.landing_thickness,
            0,
        )?);

        if params.landing_support {
            result.supports.extend(landing_columns(mesh, origin, &corner, params, tol)?);
        }
        if params.landing_railing {
            let top = landing_top(i);
            for side in [0.0, params.landing_width] {
                let line = Polyline {
                    points: vec![top + x * side, top + x * side + y * params.landing_length],
                    closed: false,
                };
                result
                    .railings
                    .push(build_railing_along(mesh, &line, &params.landing_rail(), &z, config)?);
            }
        }
    }

    for i in 0..(params.landing_count as usize).saturating_sub(1) {
        let start = landing_top(i) + y * params.landing_length + x * params.step_gap;
        let end = start + y * params.landing_offset_y + z * params.landing_offset_z;

        let mut flight = Flight {
            steps: Vec::with_capacity(steps),
            step_height,
            step_depth,
        };
        for j in 0..steps {
            let corner = start + y * (j as f64 * step_depth) + z * (j as f64 * step_height);
            flight.steps.push(build_box(
                mesh,
                corner,
                x * flight_width,
                y * step_depth,
                z * step_height,
                0,
            )?);
        }
        debug!(flight = i, steps, step_height, "built flight");
        result.flights.push(flight);

        if params.step_support {
            let count = params.step_support_count.max(1) as usize;
            let width = params.step_support_width;
            if width <= tol || width * count as f64 > flight_width {
                return Err(bad_stairs(format!("{count} step supports of {width} m do not fit the flight")));
            }
            for k in 0..count {
                let offset = flight_width * (k + 1) as f64 / (count + 1) as f64 - width / 2.0;
                let base = [
                    start + x * offset - z * step_height,
                    end + x * offset - z * step_height,
                    end + x * offset,
                    start + x * offset,
                ];
                result.supports.push(build_prism(mesh, &base, &(x * width), 0)?);
            }
        }

        if params.step_railing {
            let mut sides = Vec::new();
            if params.inner_step_railing {
                sides.push(0.0);
            }
            if params.outer_step_railing {
                sides.push(flight_width);
            }
            for side in sides {
                let line = Polyline {
                    points: vec![start + x * side, end + x * side],
                    closed: false,
                };
                result
                    .railings
                    .push(build_railing_along(mesh, &line, &params.step_rail(), &z, config)?);
            }
        }
    }

    let mut slots = MaterialSlotAssignment::new();
    let landing_faces: Vec<FaceKey> = result.landings.iter().flat_map(Prism::faces).collect();
    let step_faces: Vec<FaceKey> = result.flights.iter().flat_map(|f| &f.steps).flat_map(Prism::faces).collect();
    let support_faces: Vec<FaceKey> = result.supports.iter().flat_map(Prism::faces).collect();
    slots.assign(mesh, &landing_faces, MaterialRole::Landing)?;
    slots.assign(mesh, &step_faces, MaterialRole::Step)?;
    slots.assign(mesh, &support_faces, MaterialRole::Support)?;
    for railing in &result.railings {
        railing.assign_roles(mesh, &mut slots)?;
    }

    info!(
        landings = result.landings.len(),
        flights = result.flights.len(),
        supports = result.supports.len(),
        "built staircase"
    );
    Ok(result)
}

/// Corner columns carrying an elevated landing down to the origin's level.
fn landing_columns(
    mesh: &mut Mesh,
    origin: &Point3<f64>,
    corner: &Point3<f64>,
    params: &StaircaseParameters,
    tol: f64,
) -> Result<Vec<Prism>> {
    let drop = corner.z - origin.z;
    if drop <= tol {
        return Ok(Vec::new());
    }
    let size = params.landing_support_size;
    if size <= tol || 2.0 * size > params.landing_width.min(params.landing_length) {
        return Err(bad_stairs(format!("landing support size {size} does not fit the landing")));
    }
    let (x, y, z) = (Vector3::x(), Vector3::y(), Vector3::z());
    let foot = corner - z * drop;
    let spots = [
        foot,
        foot + x * (params.landing_width - size),
        foot + y * (params.landing_length - size),
        foot + x * (params.landing_width - size) + y * (params.landing_length - size),
    ];
    spots
        .iter()
        .map(|&p| Ok(build_box(mesh, p, x * size, y * size, z * drop, 0)?))
        .collect()
}
