// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Railings along edge polylines: posts, rails and solid wall panels.

use nalgebra::{Point3, Vector3};
use rustc_hash::{FxHashMap, FxHashSet};
use storey_kernel::{build_box, EdgeKey, FaceKey, Mesh, Prism, VertexKey, EPSILON};
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::materials::{MaterialRole, MaterialSlotAssignment};
use crate::params::{RailFill, RailingParameters};

/// Ordered points of a chain of edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point3<f64>>,
    /// The last point connects back to the first.
    pub closed: bool,
}

impl Polyline {
    pub fn segments(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> + '_ {
        let n = self.points.len();
        let count = if self.closed && n > 2 { n } else { n.saturating_sub(1) };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    pub fn centroid(&self) -> Point3<f64> {
        let sum = self.points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.points.len().max(1) as f64)
    }
}

/// Orders a selection of edges into a single polyline.
///
/// Fails with [`Error::InvalidPlacement`] when the edges branch or fall apart
/// into several pieces.
pub fn chain_edges(mesh: &Mesh, edges: &[EdgeKey]) -> Result<Polyline> {
    if edges.is_empty() {
        return Err(Error::InvalidPlacement("no edges selected".into()));
    }
    let mut incident: FxHashMap<VertexKey, Vec<EdgeKey>> = FxHashMap::default();
    for &ek in edges {
        let edge = mesh
            .edge(ek)
            .ok_or(Error::Kernel(storey_kernel::Error::EdgeNotFound(ek)))?;
        incident.entry(edge.start).or_default().push(ek);
        incident.entry(edge.end).or_default().push(ek);
    }
    if incident.values().any(|list| list.len() > 2) {
        return Err(Error::InvalidPlacement("selected edges branch".into()));
    }

    // Open chains start at the first endpoint met in selection order.
    let mut start = None;
    for &ek in edges {
        if let Some(edge) = mesh.edge(ek) {
            if let Some(&v) = [edge.start, edge.end].iter().find(|v| incident[*v].len() == 1) {
                start = Some(v);
                break;
            }
        }
    }
    let closed = start.is_none();
    let mut current = match start {
        Some(v) => v,
        None => mesh.edge(edges[0]).map(|e| e.start).ok_or(Error::Kernel(storey_kernel::Error::EdgeNotFound(edges[0])))?,
    };

    let mut visited: FxHashSet<EdgeKey> = FxHashSet::default();
    let mut order = vec![current];
    while let Some(&next_edge) = incident[&current].iter().find(|e| !visited.contains(*e)) {
        visited.insert(next_edge);
        let edge = mesh
            .edge(next_edge)
            .ok_or(Error::Kernel(storey_kernel::Error::EdgeNotFound(next_edge)))?;
        current = if edge.start == current { edge.end } else { edge.start };
        order.push(current);
    }
    if visited.len() != edges.len() {
        return Err(Error::InvalidPlacement("selected edges are not connected".into()));
    }
    if closed {
        order.pop();
    }

    let points = order
        .into_iter()
        .map(|v| mesh.vertex_point(v).ok_or(Error::Kernel(storey_kernel::Error::VertexNotFound(v))))
        .collect::<Result<Vec<_>>>()?;
    Ok(Polyline { points, closed })
}

/// Geometry produced by a railing build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RailingResult {
    pub posts: Vec<Prism>,
    pub corner_posts: Vec<Prism>,
    pub rails: Vec<Prism>,
    /// Wall panel faces left after interior sides are dropped.
    pub walls: Vec<FaceKey>,
}

impl RailingResult {
    pub fn faces(&self) -> Vec<FaceKey> {
        let mut out: Vec<FaceKey> = self
            .posts
            .iter()
            .chain(&self.corner_posts)
            .chain(&self.rails)
            .flat_map(Prism::faces)
            .collect();
        out.extend(self.walls.iter().copied());
        out
    }

    pub fn assign_roles(&self, mesh: &mut Mesh, slots: &mut MaterialSlotAssignment) -> Result<()> {
        let posts: Vec<FaceKey> = self.posts.iter().chain(&self.corner_posts).flat_map(Prism::faces).collect();
        let rails: Vec<FaceKey> = self.rails.iter().flat_map(Prism::faces).collect();
        slots.assign(mesh, &posts, MaterialRole::Post)?;
        slots.assign(mesh, &rails, MaterialRole::Rail)?;
        slots.assign(mesh, &self.walls, MaterialRole::Wall)?;
        Ok(())
    }

    fn extend(&mut self, other: RailingResult) {
        self.posts.extend(other.posts);
        self.corner_posts.extend(other.corner_posts);
        self.rails.extend(other.rails);
        self.walls.extend(other.walls);
    }
}

/// Builds a railing along a selection of edges, `up` being the object's
/// vertical in mesh coordinates.
///
/// The mesh is left untouched on failure.
pub fn build_railing(
    mesh: &mut Mesh,
    edges: &[EdgeKey],
    params: &RailingParameters,
    up: &Vector3<f64>,
    config: &GeneratorConfig,
) -> Result<RailingResult> {
    mesh.staged(|m| {
        let line = chain_edges(m, edges)?;
        let result = build_railing_along(m, &line, params, up, config)?;
        result.assign_roles(m, &mut MaterialSlotAssignment::new())?;
        info!(
            posts = result.posts.len(),
            corner_posts = result.corner_posts.len(),
            rails = result.rails.len(),
            "built railing"
        );
        Ok(result)
    })
}

/// Number of posts on an edge of `length`, both ends included.
pub fn post_count(length: f64, params: &RailingParameters, config: &GeneratorConfig) -> usize {
    let density = params.post_density.clamp(0.0, 1.0);
    let raw = (density * length / (2.0 * params.post_width.max(EPSILON))).round() as usize;
    let mut count = raw.max(2);
    if count > 2 && count % 2 == 0 {
        count += 1;
    }
    count.min(config.max_posts_per_edge.max(2))
}

/// Horizontal run direction of a segment and its horizontal normal.
fn segment_axes(a: &Point3<f64>, b: &Point3<f64>, up: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let run = b - a;
    let flat = run - up * up.dot(&run);
    let dir = if flat.norm() > EPSILON {
        flat.normalize()
    } else {
        let x = Vector3::x();
        (x - up * up.dot(&x)).try_normalize(EPSILON).unwrap_or_else(Vector3::y)
    };
    (dir, up.cross(&dir))
}

/// Square column of `width` centred on `at`, rising `height` along `up`.
fn column(
    mesh: &mut Mesh,
    at: &Point3<f64>,
    dir: &Vector3<f64>,
    side: &Vector3<f64>,
    up: &Vector3<f64>,
    width: f64,
    height: f64,
) -> Result<Prism> {
    let origin = at - dir * (width / 2.0) - side * (width / 2.0);
    Ok(build_box(mesh, origin, dir * width, side * width, up * height, 0)?)
}

/// Beam from `a` to `b` of `width` across and `height` along `up`, its
/// bottom lifted by `lift`.
#[allow(clippy::too_many_arguments)]
fn beam(
    mesh: &mut Mesh,
    a: &Point3<f64>,
    b: &Point3<f64>,
    side: &Vector3<f64>,
    up: &Vector3<f64>,
    width: f64,
    height: f64,
    lift: f64,
) -> Result<Prism> {
    let origin = a + up * lift - side * (width / 2.0);
    Ok(build_box(mesh, origin, b - a, side * width, up * height, 0)?)
}

/// Builds railing geometry along a polyline.
///
/// Every polyline vertex gets exactly one corner post; edges get their
/// evenly spaced posts in between. Shared with balconies and staircases.
pub fn build_railing_along(
    mesh: &mut Mesh,
    line: &Polyline,
    params: &RailingParameters,
    up: &Vector3<f64>,
    config: &GeneratorConfig,
) -> Result<RailingResult> {
    if line.points.len() < 2 {
        return Err(Error::InvalidPlacement("railing needs at least one edge".into()));
    }
    let up = up
        .try_normalize(EPSILON)
        .ok_or_else(|| Error::InvalidPlacement("railing up vector is zero".into()))?;
    let segments: Vec<(Point3<f64>, Point3<f64>)> = line.segments().collect();
    let mut result = RailingResult::default();

    let (corner_width, corner_height) = if params.has_corner_posts {
        (params.corner_post_width, params.corner_post_height)
    } else {
        (params.post_width, params.post_height)
    };
    for (i, p) in line.points.iter().enumerate() {
        let (a, b) = segments[i.min(segments.len() - 1)];
        let (dir, side) = segment_axes(&a, &b, &up);
        let post = column(mesh, p, &dir, &side, &up, corner_width, corner_height)?;
        if params.has_corner_posts {
            result.corner_posts.push(post);
        } else {
            result.posts.push(post);
        }
    }

    let centre = line.centroid();
    for (a, b) in &segments {
        let (dir, side) = segment_axes(a, b, &up);
        let mut part = RailingResult::default();

        if params.fill != RailFill::Wall {
            let count = post_count((b - a).norm(), params, config);
            for i in 1..count - 1 {
                let t = i as f64 / (count - 1) as f64;
                let at = a + (b - a) * t;
                part.posts.push(column(mesh, &at, &dir, &side, &up, params.post_width, params.post_height)?);
            }
            part.rails.push(beam(
                mesh,
                a,
                b,
                &side,
                &up,
                params.rail_width,
                params.rail_height,
                params.post_height,
            )?);
        }

        match params.fill {
            RailFill::Posts => {}
            RailFill::Rails => {
                let raw = (params.rail_density * params.post_height / params.rail_height.max(EPSILON)).round();
                let count = (raw as usize).clamp(1, config.max_slats.max(1));
                for j in 0..count {
                    let lift = params.post_height * (j + 1) as f64 / (count + 1) as f64 - params.rail_height / 2.0;
                    part.rails.push(beam(mesh, a, b, &side, &up, params.rail_width, params.rail_height, lift)?);
                }
            }
            RailFill::Wall => {
                let panel = beam(mesh, a, b, &side, &up, params.wall_width, params.wall_height, 0.0)?;
                let mut faces = panel.faces();
                if params.delete_faces && segments.len() > 1 {
                    let mid = Point3::from((a.coords + b.coords) / 2.0);
                    let inward = centre - mid;
                    let inward = inward - up * up.dot(&inward);
                    if let Some(inward) = inward.try_normalize(EPSILON) {
                        let interior: Vec<FaceKey> = panel
                            .sides
                            .iter()
                            .copied()
                            .filter(|&f| mesh.face_normal(f).is_some_and(|n| n.dot(&inward) > 0.5))
                            .collect();
                        mesh.delete_faces(&interior)?;
                        faces.retain(|f| !interior.contains(f));
                    }
                }
                part.walls.extend(faces);
            }
        }
        result.extend(part);
    }

    debug!(
        segments = segments.len(),
        closed = line.closed,
        posts = result.posts.len(),
        "railing along polyline"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use storey_kernel::make_quad;

    fn config() -> GeneratorConfig {
        GeneratorConfig::default()
    }

    /// 4 x 4 floor quad; returns its face and boundary edges.
    fn floor(mesh: &mut Mesh) -> (FaceKey, Vec<EdgeKey>) {
        let v0 = mesh.add_vertex(0.0, 0.0, 0.0);
        let v1 = mesh.add_vertex(4.0, 0.0, 0.0);
        let v2 = mesh.add_vertex(4.0, 4.0, 0.0);
        let v3 = mesh.add_vertex(0.0, 4.0, 0.0);
        let face = make_quad(mesh, v0, v1, v2, v3).unwrap();
        let edges = mesh.face_edges(face).unwrap().to_vec();
        (face, edges)
    }

    #[test]
    fn closed_loop_gets_one_corner_post_per_vertex() {
        for density in [0.0, 0.5, 1.0] {
            let mut mesh = Mesh::new();
            let (_, edges) = floor(&mut mesh);
            let params = RailingParameters {
                post_density: density,
                ..RailingParameters::default()
            };
            let result = build_railing(&mut mesh, &edges, &params, &Vector3::z(), &config()).unwrap();
            assert_eq!(result.corner_posts.len(), 4);
            assert_eq!(result.rails.len(), 4);
        }
    }

    #[test]
    fn post_count_is_odd_biased() {
        let params = RailingParameters::default();
        // 0.9 * 4 / 0.3 = 12, bumped to 13.
        assert_eq!(post_count(4.0, &params, &config()), 13);
        assert_eq!(post_count(0.1, &params, &config()), 2);
        let dense = RailingParameters {
            post_width: 0.001,
            post_density: 1.0,
            ..RailingParameters::default()
        };
        assert_eq!(post_count(10.0, &dense, &config()), config().max_posts_per_edge);
    }

    #[test]
    fn posts_stand_on_the_edge() {
        let mut mesh = Mesh::new();
        let (_, edges) = floor(&mut mesh);
        let result = build_railing(&mut mesh, &edges, &RailingParameters::default(), &Vector3::z(), &config()).unwrap();
        assert_eq!(result.posts.len(), 4 * 11);

        let post = &result.posts[0];
        let base = mesh.face_centroid(post.bottom).unwrap();
        let top = mesh.face_centroid(post.top).unwrap();
        assert_relative_eq!(base.z, 0.0, epsilon = 1e-9);
        assert_relative_eq!(top.z, 0.7, epsilon = 1e-9);
        assert!(mesh.non_manifold_edges().is_empty());
    }

    #[test]
    fn open_chain_follows_selection() {
        let mut mesh = Mesh::new();
        let (_, edges) = floor(&mut mesh);
        let line = chain_edges(&mesh, &edges[..3]).unwrap();
        assert!(!line.closed);
        assert_eq!(line.points.len(), 4);
        assert_eq!(line.segments().count(), 3);
    }

    #[test]
    fn branching_edges_are_rejected() {
        let mut mesh = Mesh::new();
        let (face, mut edges) = floor(&mut mesh);
        let corner = mesh.face_vertices(face).unwrap()[0];
        let spur = mesh.add_vertex(-1.0, -1.0, 0.0);
        edges.push(mesh.ensure_edge(corner, spur).unwrap());
        let err = chain_edges(&mesh, &edges).unwrap_err();
        assert!(matches!(err, Error::InvalidPlacement(_)));
    }

    #[test]
    fn rails_fill_stacks_rails() {
        let mut mesh = Mesh::new();
        let (_, edges) = floor(&mut mesh);
        let params = RailingParameters {
            fill: RailFill::Rails,
            ..RailingParameters::default()
        };
        let result = build_railing(&mut mesh, &edges, &params, &Vector3::z(), &config()).unwrap();
        // round(0.2 * 0.7 / 0.025) = 6 rails plus the top rail on each edge.
        assert_eq!(result.rails.len(), 4 * 7);

        let mut capped = Mesh::new();
        let (_, edges) = floor(&mut capped);
        let config = GeneratorConfig {
            max_slats: 3,
            ..config()
        };
        let result = build_railing(&mut capped, &edges, &params, &Vector3::z(), &config).unwrap();
        assert_eq!(result.rails.len(), 4 * 4);
    }

    #[test]
    fn wall_fill_drops_interior_sides() {
        let mut mesh = Mesh::new();
        let (_, edges) = floor(&mut mesh);
        let params = RailingParameters {
            fill: RailFill::Wall,
            ..RailingParameters::default()
        };
        let result = build_railing(&mut mesh, &edges, &params, &Vector3::z(), &config()).unwrap();
        assert_eq!(result.walls.len(), 4 * 5);
        assert!(result.posts.is_empty());
        for &face in &result.walls {
            let n = mesh.face_normal(face).unwrap();
            let c = mesh.face_centroid(face).unwrap();
            let inward = Vector3::new(2.0 - c.x, 2.0 - c.y, 0.0).normalize();
            assert!(n.dot(&inward) <= 0.5);
        }
    }
}
