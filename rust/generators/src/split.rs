// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parametric split engine.
//!
//! Turns split parameters into normalized grid lines over a quad-like face
//! and cuts the face along them. Every opening generator also uses
//! [`carve`] to cut its sub-rectangles out of a wall with the same machinery.

use storey_kernel::{FaceKey, GridLines, Mesh};
use tracing::debug;

use crate::error::{Error, Result};
use crate::params::SplitParameters;

/// Cell boundaries of a split, normalized to `[0, 1]` along each face axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitGrid {
    pub columns: Vec<f64>,
    pub rows: Vec<f64>,
    /// Face width along its bottom edge.
    pub width: f64,
    /// Face height along its left edge.
    pub height: f64,
    /// Displacement along the normal requested for the focus cell.
    pub normal_offset: f64,
}

impl SplitGrid {
    pub fn column_widths(&self) -> Vec<f64> {
        self.columns.windows(2).map(|w| (w[1] - w[0]) * self.width).collect()
    }

    pub fn row_heights(&self) -> Vec<f64> {
        self.rows.windows(2).map(|w| (w[1] - w[0]) * self.height).collect()
    }

    pub fn is_trivial(&self) -> bool {
        self.columns.len() == 2 && self.rows.len() == 2
    }

    pub fn lines(&self) -> Result<GridLines> {
        Ok(GridLines::new(self.columns.clone(), self.rows.clone())?)
    }
}

/// Cells produced by a split, row-major from the bottom-left.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    pub cells: Vec<FaceKey>,
    pub grid: SplitGrid,
}

impl SplitResult {
    /// The middle cell, used as the focus of balconies.
    pub fn centre(&self) -> FaceKey {
        let nc = self.grid.columns.len() - 1;
        let nr = self.grid.rows.len() - 1;
        self.cells[(nr / 2) * nc + nc / 2]
    }
}

/// Width (bottom edge) and height (left edge) of a quad-like face.
pub fn face_size(mesh: &Mesh, face: FaceKey) -> Result<(f64, f64)> {
    let [bl, br, _, tl] = mesh.quad_corners(face)?;
    let point = |v| {
        mesh.vertex_point(v)
            .ok_or(Error::Kernel(storey_kernel::Error::VertexNotFound(v)))
    };
    let (p_bl, p_br, p_tl) = (point(bl)?, point(br)?, point(tl)?);
    Ok(((p_br - p_bl).norm(), (p_tl - p_bl).norm()))
}

/// Normalized boundaries along one axis.
///
/// Outer cells weigh 1 and interior cells weigh `ratio`; with two cells the
/// first one takes the ratio. Interior boundaries are then shifted by
/// `offset` metres.
fn axis_lines(count: u32, ratio: f64, offset: f64, extent: f64, tolerance: f64) -> Result<Vec<f64>> {
    let n = count.max(1) as usize;
    if n == 1 {
        return Ok(vec![0.0, 1.0]);
    }
    let ratio = if ratio.is_nan() { 1.0 } else { ratio.clamp(1e-3, n as f64) };

    let weights: Vec<f64> = match n {
        2 => vec![ratio, 1.0],
        _ => (0..n)
            .map(|i| if i == 0 || i == n - 1 { 1.0 } else { ratio })
            .collect(),
    };
    let total: f64 = weights.iter().sum();

    let shift = offset / extent;
    let mut lines = Vec::with_capacity(n + 1);
    let mut acc = 0.0;
    lines.push(0.0);
    for w in &weights[..n - 1] {
        acc += w;
        lines.push(acc / total + shift);
    }
    lines.push(1.0);

    let min_cell = tolerance / extent;
    if lines.windows(2).any(|w| w[1] - w[0] <= min_cell) {
        return Err(Error::SplitOutOfBounds(format!(
            "offset {offset} pushes the grid outside a {extent:.4} m face"
        )));
    }
    Ok(lines)
}

/// Computes the split grid of a face without touching the mesh.
pub fn compute_split_grid(mesh: &Mesh, face: FaceKey, params: &SplitParameters, tolerance: f64) -> Result<SplitGrid> {
    let (width, height) = face_size(mesh, face)?;
    let columns = axis_lines(params.count.0, params.ratio.0, params.offset.0, width, tolerance)?;
    let rows = axis_lines(params.count.1, params.ratio.1, params.offset.1, height, tolerance)?;
    Ok(SplitGrid {
        columns,
        rows,
        width,
        height,
        normal_offset: params.offset.2,
    })
}

/// Splits a face by its parameters. A 1x1 grid returns the face unchanged.
pub fn split_face(mesh: &mut Mesh, face: FaceKey, params: &SplitParameters, tolerance: f64) -> Result<SplitResult> {
    let grid = compute_split_grid(mesh, face, params, tolerance)?;
    if grid.is_trivial() {
        return Ok(SplitResult { cells: vec![face], grid });
    }
    let cells = mesh.split_face(face, &grid.lines()?)?;
    debug!(cells = cells.len(), "split face");
    Ok(SplitResult { cells, grid })
}

/// Axis-aligned rectangle in face coordinates: metres from the bottom-left
/// corner along the bottom and left edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Result of carving rectangles out of a face.
#[derive(Debug, Clone, PartialEq)]
pub struct Carved {
    /// One cell per requested rectangle, in request order.
    pub focus: Vec<FaceKey>,
    /// The surrounding margin cells.
    pub rest: Vec<FaceKey>,
}

/// Cuts one rectangle out of a face.
pub fn carve(mesh: &mut Mesh, face: FaceKey, rect: Rect, tolerance: f64) -> Result<Carved> {
    carve_spans(mesh, face, &[(rect.x, rect.x + rect.width)], (rect.y, rect.y + rect.height), tolerance)
}

/// Cuts several side-by-side rectangles sharing one vertical span out of a
/// face. Margins narrower than `tolerance` are dropped instead of producing
/// sliver cells.
pub fn carve_spans(
    mesh: &mut Mesh,
    face: FaceKey,
    spans: &[(f64, f64)],
    rows: (f64, f64),
    tolerance: f64,
) -> Result<Carved> {
    let (width, height) = face_size(mesh, face)?;
    if spans.is_empty() {
        return Err(Error::InvalidPlacement("nothing to carve".into()));
    }

    let mut sorted: Vec<(usize, (f64, f64))> = spans.iter().copied().enumerate().collect();
    sorted.sort_by(|a, b| a.1 .0.total_cmp(&b.1 .0));

    let mut columns = vec![0.0];
    let mut focus_columns = vec![0usize; spans.len()];
    for &(request, (x0, x1)) in &sorted {
        let start = push_span(&mut columns, x0, x1, width, tolerance)?;
        focus_columns[request] = start;
    }
    close_lines(&mut columns, width, tolerance);

    let mut row_lines = vec![0.0];
    let focus_row = push_span(&mut row_lines, rows.0, rows.1, height, tolerance)?;
    close_lines(&mut row_lines, height, tolerance);

    let lines = GridLines::new(columns, row_lines)?;
    let nc = lines.column_count();
    let cells = mesh.split_face(face, &lines)?;

    let focus: Vec<FaceKey> = focus_columns.iter().map(|&c| cells[focus_row * nc + c]).collect();
    let rest = cells.iter().copied().filter(|c| !focus.contains(c)).collect();
    Ok(Carved { focus, rest })
}

/// Appends the normalized span `[lo, hi]` to `lines`, skipping a zero-width
/// margin before it. Returns the cell index of the span.
fn push_span(lines: &mut Vec<f64>, lo: f64, hi: f64, extent: f64, tolerance: f64) -> Result<usize> {
    if hi - lo <= tolerance {
        return Err(Error::InvalidPlacement(format!("opening span {lo:.4}..{hi:.4} is empty")));
    }
    if lo < -tolerance || hi > extent + tolerance {
        return Err(Error::InvalidPlacement(format!(
            "opening span {lo:.4}..{hi:.4} exceeds the {extent:.4} m face"
        )));
    }
    let eps = tolerance / extent;
    let (lo, hi) = ((lo / extent).max(0.0), (hi / extent).min(1.0));
    let last = lines[lines.len() - 1];
    if lo < last - eps {
        return Err(Error::InvalidPlacement("openings overlap".into()));
    }
    if lo > last + eps {
        lines.push(lo);
    }
    let index = lines.len() - 1;
    lines.push(hi);
    Ok(index)
}

/// Closes a line list at 1, snapping a final line that already sits there.
fn close_lines(lines: &mut Vec<f64>, extent: f64, tolerance: f64) {
    let eps = tolerance / extent;
    let last = lines.len() - 1;
    if lines[last] >= 1.0 - eps {
        lines[last] = 1.0;
    } else {
        lines.push(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use storey_kernel::make_quad;

    const TOL: f64 = 1e-6;

    fn wall(mesh: &mut Mesh, width: f64, height: f64) -> FaceKey {
        let v0 = mesh.add_vertex(0.0, 0.0, 0.0);
        let v1 = mesh.add_vertex(width, 0.0, 0.0);
        let v2 = mesh.add_vertex(width, 0.0, height);
        let v3 = mesh.add_vertex(0.0, 0.0, height);
        make_quad(mesh, v0, v1, v2, v3).unwrap()
    }

    #[test]
    fn default_split_areas_sum_to_face() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 6.0, 3.0);
        let result = split_face(&mut mesh, face, &SplitParameters::default(), TOL).unwrap();

        assert_eq!(result.cells.len(), 9);
        let total: f64 = result.cells.iter().map(|&c| mesh.face_area(c).unwrap()).sum();
        assert_relative_eq!(total, 18.0, epsilon = 1e-9);
        assert_relative_eq!(result.grid.column_widths().iter().sum::<f64>(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(result.grid.row_heights().iter().sum::<f64>(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn ratio_weights_interior_cells() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 4.0, 1.0);
        let params = SplitParameters {
            count: (3, 1),
            ratio: (2.0, 1.0),
            offset: (0.0, 0.0, 0.0),
        };
        let grid = compute_split_grid(&mesh, face, &params, TOL).unwrap();
        let widths = grid.column_widths();
        assert_relative_eq!(widths[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(widths[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(widths[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn ratio_is_clamped_to_count() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 4.0, 1.0);
        let params = SplitParameters {
            count: (2, 1),
            ratio: (50.0, 1.0),
            offset: (0.0, 0.0, 0.0),
        };
        let grid = compute_split_grid(&mesh, face, &params, TOL).unwrap();
        // Ratio 2 over two cells: 2/3 and 1/3 of the width.
        assert_relative_eq!(grid.columns[1], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn offset_shifts_interior_lines() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 4.0, 2.0);
        let params = SplitParameters {
            count: (3, 3),
            ratio: (2.0, 2.0),
            offset: (0.5, -0.25, 0.3),
        };
        let result = split_face(&mut mesh, face, &params, TOL).unwrap();
        let widths = result.grid.column_widths();
        assert_relative_eq!(widths[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(widths[2], 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.grid.normal_offset, 0.3);
        let total: f64 = result.cells.iter().map(|&c| mesh.face_area(c).unwrap()).sum();
        assert_relative_eq!(total, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn offset_past_the_edge_is_out_of_bounds() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 4.0, 2.0);
        let before = mesh.signature();
        let params = SplitParameters {
            count: (3, 1),
            ratio: (2.0, 1.0),
            offset: (1.5, 0.0, 0.0),
        };
        let err = split_face(&mut mesh, face, &params, TOL).unwrap_err();
        assert!(matches!(err, Error::SplitOutOfBounds(_)));
        assert_eq!(mesh.signature(), before);
    }

    #[test]
    fn single_count_returns_face() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 4.0, 2.0);
        let params = SplitParameters {
            count: (1, 1),
            ..SplitParameters::default()
        };
        let result = split_face(&mut mesh, face, &params, TOL).unwrap();
        assert_eq!(result.cells, vec![face]);
        assert_eq!(result.centre(), face);
    }

    #[test]
    fn carve_centred_rect() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 4.0, 3.0);
        let carved = carve(&mut mesh, face, Rect::new(1.5, 1.0, 1.0, 1.0), TOL).unwrap();

        assert_eq!(carved.focus.len(), 1);
        assert_eq!(carved.rest.len(), 8);
        assert_relative_eq!(mesh.face_area(carved.focus[0]).unwrap(), 1.0, epsilon = 1e-9);
        let c = mesh.face_centroid(carved.focus[0]).unwrap();
        assert_relative_eq!(c.x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(c.z, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn carve_drops_zero_margins() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 4.0, 3.0);
        let carved = carve(&mut mesh, face, Rect::new(1.5, 0.0, 1.0, 2.0), TOL).unwrap();
        assert_eq!(carved.rest.len(), 5);
    }

    #[test]
    fn carve_several_spans() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 6.0, 3.0);
        let carved = carve_spans(&mut mesh, face, &[(3.5, 4.5), (0.5, 1.5)], (1.0, 2.0), TOL).unwrap();

        assert_eq!(carved.focus.len(), 2);
        // Request order is kept even though spans were given right to left.
        assert!(mesh.face_centroid(carved.focus[0]).unwrap().x > 3.0);
        assert!(mesh.face_centroid(carved.focus[1]).unwrap().x < 3.0);
    }

    #[test]
    fn carve_outside_face_is_invalid_placement() {
        let mut mesh = Mesh::new();
        let face = wall(&mut mesh, 4.0, 3.0);
        let err = carve(&mut mesh, face, Rect::new(3.5, 1.0, 1.0, 1.0), TOL).unwrap_err();
        assert!(matches!(err, Error::InvalidPlacement(_)));
        assert_eq!(mesh.face_count(), 1);
    }
}
