// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grid subdivision of quad-like faces.
//!
//! A face is quad-like when its loop turns at exactly four corners; extra
//! vertices lying on a straight side (left behind by earlier splits of a
//! neighbour) are allowed and reused. The face is parameterised bilinearly
//! from its bottom-left corner, so the cells of a planar quad tile it
//! exactly.

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::keys::*;
use crate::mesh::Mesh;

/// Distance below which a grid line snaps to an existing side vertex.
const SNAP: f64 = 1e-7;

/// Normalized grid line positions across a face.
///
/// Both lists start at `0.0`, end at `1.0` and increase strictly.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLines {
    pub columns: Vec<f64>,
    pub rows: Vec<f64>,
}

impl GridLines {
    /// Validates and wraps explicit line positions.
    pub fn new(columns: Vec<f64>, rows: Vec<f64>) -> Result<Self> {
        let lines = Self { columns, rows };
        lines.validate()?;
        Ok(lines)
    }

    /// Evenly spaced grid of `cols` by `rows` cells.
    pub fn uniform(cols: usize, rows: usize) -> Self {
        let spread = |n: usize| -> Vec<f64> {
            let n = n.max(1);
            (0..=n).map(|i| i as f64 / n as f64).collect()
        };
        Self {
            columns: spread(cols),
            rows: spread(rows),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// A 1x1 grid leaves the face untouched.
    pub fn is_trivial(&self) -> bool {
        self.column_count() == 1 && self.row_count() == 1
    }

    fn validate(&self) -> Result<()> {
        for (name, lines) in [("column", &self.columns), ("row", &self.rows)] {
            if lines.len() < 2 {
                return Err(Error::DegenerateGeometry(format!("{name} lines need at least 2 entries")));
            }
            let first = lines[0];
            let last = lines[lines.len() - 1];
            if first.abs() > 1e-12 || (last - 1.0).abs() > 1e-12 {
                return Err(Error::DegenerateGeometry(format!("{name} lines must span 0..1")));
            }
            if lines.windows(2).any(|w| w[1] - w[0] <= 1e-12) {
                return Err(Error::DegenerateGeometry(format!("{name} lines must increase strictly")));
            }
        }
        Ok(())
    }
}

/// One straight side of a quad-like face, as `(parameter, vertex)` pairs
/// sorted by parameter.
struct Side {
    start: Point3<f64>,
    end: Point3<f64>,
    stops: Vec<(f64, VertexKey)>,
}

impl Side {
    fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    fn point_at(&self, t: f64) -> Point3<f64> {
        self.start + (self.end - self.start) * t
    }

    fn vertex_at(&self, t: f64) -> Option<VertexKey> {
        let len = self.length();
        self.stops
            .iter()
            .find(|(s, _)| ((s - t) * len).abs() < SNAP)
            .map(|&(_, v)| v)
    }

    /// Vertices with parameter in `[lo, hi]`, ascending.
    fn run(&self, lo: f64, hi: f64) -> Vec<VertexKey> {
        let tol = SNAP / self.length().max(SNAP);
        self.stops
            .iter()
            .filter(|(s, _)| *s >= lo - tol && *s <= hi + tol)
            .map(|&(_, v)| v)
            .collect()
    }
}

impl Mesh {
    /// Returns the four corners of a quad-like face ordered bottom-left,
    /// bottom-right, top-right, top-left in the face's local frame.
    pub fn quad_corners(&self, face: FaceKey) -> Result<[VertexKey; 4]> {
        let data = self.faces.get(face).ok_or(Error::FaceNotFound(face))?;
        let corners = self
            .face_corner_indices(face)
            .ok_or_else(|| Error::degenerate("face has no normal"))?;
        if corners.len() != 4 {
            return Err(Error::DegenerateGeometry(format!(
                "expected a quad-like face, found {} corners",
                corners.len()
            )));
        }
        let frame = self
            .face_frame(face)
            .ok_or_else(|| Error::degenerate("face has no normal"))?;

        let mut start = 0;
        let mut best = f64::INFINITY;
        for (slot, &idx) in corners.iter().enumerate() {
            let p = self
                .vertex_point(data.vertices[idx])
                .ok_or(Error::VertexNotFound(data.vertices[idx]))?;
            let q = frame.to_local(&p);
            if q.x + q.y < best - 1e-12 {
                best = q.x + q.y;
                start = slot;
            }
        }

        let pick = |k: usize| data.vertices[corners[(start + k) % 4]];
        Ok([pick(0), pick(1), pick(2), pick(3)])
    }

    /// Splits a quad-like face into a grid of cells.
    ///
    /// Cells are returned row-major from the bottom-left corner and inherit
    /// the face material. Vertices already lying on the face sides are
    /// reused; new side vertices are spliced into neighbouring faces. A 1x1
    /// grid returns the face unchanged.
    pub fn split_face(&mut self, face: FaceKey, lines: &GridLines) -> Result<Vec<FaceKey>> {
        lines.validate()?;
        let corners = self.quad_corners(face)?;
        if lines.is_trivial() {
            return Ok(vec![face]);
        }

        let [bl, br, tr, tl] = corners;
        let p = |m: &Mesh, v: VertexKey| m.vertex_point(v).ok_or(Error::VertexNotFound(v));
        let (p_bl, p_br, p_tr, p_tl) = (p(self, bl)?, p(self, br)?, p(self, tr)?, p(self, tl)?);

        let mut bottom = self.side_between(face, bl, br, false)?;
        let mut right = self.side_between(face, br, tr, false)?;
        let mut top = self.side_between(face, tr, tl, true)?;
        let mut left = self.side_between(face, tl, bl, true)?;

        self.insert_side_stops(&mut bottom, &lines.columns)?;
        self.insert_side_stops(&mut top, &lines.columns)?;
        self.insert_side_stops(&mut left, &lines.rows)?;
        self.insert_side_stops(&mut right, &lines.rows)?;

        let (nc, nr) = (lines.column_count(), lines.row_count());
        let bilinear = |u: f64, v: f64| -> Point3<f64> {
            let lower = p_bl.coords * (1.0 - u) + p_br.coords * u;
            let upper = p_tl.coords * (1.0 - u) + p_tr.coords * u;
            Point3::from(lower * (1.0 - v) + upper * v)
        };

        // Grid vertex lookup, (row, column) indexed.
        let mut grid = vec![vec![bl; nc + 1]; nr + 1];
        for r in 0..=nr {
            for c in 0..=nc {
                let (u, v) = (lines.columns[c], lines.rows[r]);
                let on_side = if r == 0 {
                    bottom.vertex_at(u)
                } else if r == nr {
                    top.vertex_at(u)
                } else if c == 0 {
                    left.vertex_at(v)
                } else if c == nc {
                    right.vertex_at(v)
                } else {
                    None
                };
                grid[r][c] = match on_side {
                    Some(vk) => vk,
                    None => self.add_vertex_at(&bilinear(u, v)),
                };
            }
        }

        let material = self.faces[face].material;
        self.remove_face(face)?;

        let mut cells = Vec::with_capacity(nc * nr);
        for r in 0..nr {
            for c in 0..nc {
                let (u0, u1) = (lines.columns[c], lines.columns[c + 1]);
                let (v0, v1) = (lines.rows[r], lines.rows[r + 1]);

                let mut cell: Vec<VertexKey> = if r == 0 {
                    bottom.run(u0, u1)
                } else {
                    vec![grid[r][c], grid[r][c + 1]]
                };
                let right_run = if c + 1 == nc {
                    right.run(v0, v1)
                } else {
                    vec![grid[r][c + 1], grid[r + 1][c + 1]]
                };
                cell.extend(right_run.into_iter().skip(1));
                let mut top_run = if r + 1 == nr {
                    top.run(u0, u1)
                } else {
                    vec![grid[r + 1][c], grid[r + 1][c + 1]]
                };
                top_run.reverse();
                cell.extend(top_run.into_iter().skip(1));
                let mut left_run = if c == 0 {
                    left.run(v0, v1)
                } else {
                    vec![grid[r][c], grid[r + 1][c]]
                };
                left_run.reverse();
                let len = left_run.len();
                cell.extend(left_run.into_iter().skip(1).take(len.saturating_sub(2)));

                cells.push(self.add_face(&cell, material)?);
            }
        }

        Ok(cells)
    }

    /// Collects the loop vertices from corner `a` to corner `b` as a side.
    ///
    /// With `reversed`, the side is parameterised from `b` to `a` so that
    /// top and left sides share the bottom/right parameter direction.
    fn side_between(&self, face: FaceKey, a: VertexKey, b: VertexKey, reversed: bool) -> Result<Side> {
        let verts = &self.faces[face].vertices;
        let n = verts.len();
        let ia = verts
            .iter()
            .position(|&v| v == a)
            .ok_or(Error::VertexNotFound(a))?;
        let mut chain = vec![a];
        let mut i = ia;
        while verts[i] != b {
            i = (i + 1) % n;
            chain.push(verts[i]);
            if chain.len() > n {
                return Err(Error::degenerate("corner not found on face loop"));
            }
        }
        if reversed {
            chain.reverse();
        }

        let start = self
            .vertex_point(chain[0])
            .ok_or(Error::VertexNotFound(chain[0]))?;
        let end = self
            .vertex_point(chain[chain.len() - 1])
            .ok_or(Error::VertexNotFound(chain[chain.len() - 1]))?;
        let dir = end - start;
        let len_sq = dir.norm_squared();
        if len_sq < 1e-18 {
            return Err(Error::degenerate("face side has zero length"));
        }

        let mut stops = Vec::with_capacity(chain.len());
        for vk in chain {
            let q = self.vertex_point(vk).ok_or(Error::VertexNotFound(vk))?;
            stops.push(((q - start).dot(&dir) / len_sq, vk));
        }
        Ok(Side { start, end, stops })
    }

    /// Makes sure the side has a vertex at every interior line position,
    /// splitting side segments where needed.
    fn insert_side_stops(&mut self, side: &mut Side, lines: &[f64]) -> Result<()> {
        for &t in &lines[1..lines.len() - 1] {
            if side.vertex_at(t).is_some() {
                continue;
            }
            let seg = side
                .stops
                .windows(2)
                .position(|w| w[0].0 < t && t < w[1].0)
                .ok_or_else(|| Error::degenerate("grid line falls outside the face side"))?;
            let (a, b) = (side.stops[seg].1, side.stops[seg + 1].1);
            let inserted = self.split_edge(a, b, &[side.point_at(t)])?;
            side.stops.insert(seg + 1, (t, inserted[0]));
        }
        Ok(())
    }
}
