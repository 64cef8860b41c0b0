// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Balconies: a slab pushed out of a wall with a railing around its deck.

use nalgebra::Vector3;
use storey_kernel::{FaceKey, Mesh, EPSILON};
use tracing::{info, warn};

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::materials::MaterialSlotAssignment;
use crate::params::BalconyParameters;
use crate::railing::{build_railing_along, Polyline, RailingResult};
use crate::split::split_face;

#[derive(Debug, Clone, PartialEq)]
pub struct BalconyResult {
    /// Walkable top of the slab.
    pub deck: FaceKey,
    /// Remaining slab faces, front first.
    pub slab: Vec<FaceKey>,
    pub railing: Option<RailingResult>,
}

impl BalconyResult {
    pub fn faces(&self) -> Vec<FaceKey> {
        let mut out = vec![self.deck];
        out.extend(self.slab.iter().copied());
        if let Some(railing) = &self.railing {
            out.extend(railing.faces());
        }
        out
    }
}

/// Builds a balcony out of a wall face.
///
/// With a split enabled the balcony grows from the middle cell; a split that
/// does not fit falls back to the whole face. The mesh is left untouched on
/// failure.
pub fn build_balcony(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &BalconyParameters,
    up: &Vector3<f64>,
    config: &GeneratorConfig,
) -> Result<BalconyResult> {
    mesh.staged(|m| balcony(m, face, params, up, config))
}

fn balcony(
    mesh: &mut Mesh,
    face: FaceKey,
    params: &BalconyParameters,
    up: &Vector3<f64>,
    config: &GeneratorConfig,
) -> Result<BalconyResult> {
    let normal = mesh
        .face_normal(face)
        .ok_or_else(|| Error::InvalidPlacement("balcony face has no normal".into()))?;
    let up = up
        .try_normalize(EPSILON)
        .ok_or_else(|| Error::InvalidPlacement("balcony up vector is zero".into()))?;
    if params.width <= config.tolerance {
        return Err(Error::InvalidPlacement(format!("balcony width {} must be positive", params.width)));
    }

    let mut slab = Vec::new();
    let mut focus = face;
    if params.has_split {
        match split_face(mesh, face, &params.split, config.tolerance) {
            Ok(split) => {
                focus = split.centre();
                if split.grid.normal_offset.abs() > config.tolerance {
                    let (sides, _) = mesh.extrude_face(focus, &(normal * split.grid.normal_offset))?;
                    slab.extend(sides);
                }
            }
            Err(Error::SplitOutOfBounds(reason)) => {
                warn!(%reason, "balcony split does not fit, using the whole face");
            }
            Err(err) => return Err(err),
        }
    }

    let (sides, front) = mesh.extrude_face(focus, &(normal * params.width))?;
    let deck = sides
        .iter()
        .copied()
        .filter_map(|f| mesh.face_normal(f).map(|n| (f, n.dot(&up))))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .filter(|(_, lift)| *lift > 0.5)
        .map(|(f, _)| f)
        .ok_or_else(|| Error::InvalidPlacement("balcony face has no upward side".into()))?;

    slab.insert(0, front);
    slab.extend(sides.iter().copied().filter(|&f| f != deck));

    let railing = if params.railing {
        let points = mesh
            .face_points(deck)
            .ok_or(Error::Kernel(storey_kernel::Error::FaceNotFound(deck)))?;
        if points.len() != 4 {
            return Err(Error::InvalidPlacement("balcony deck is not a quad".into()));
        }
        // Deck loop runs wall-left, wall-right, outer-right, outer-left.
        let line = Polyline {
            points: vec![points[1], points[2], points[3], points[0]],
            closed: false,
        };
        let railing = build_railing_along(mesh, &line, &params.rail, &up, config)?;
        railing.assign_roles(mesh, &mut MaterialSlotAssignment::new())?;
        Some(railing)
    } else {
        None
    };

    info!(width = params.width, railing = params.railing, "built balcony");
    Ok(BalconyResult { deck, slab, railing })
}
