//! Front expansion by pivoting the ball around active edges

use crate::geometry::{self, COSPHERICAL_ANGLE};
use crate::mesh_graph::{Ball, EdgeId, EdgeState, MeshGraph, TriangleId, VertexId, VertexState};
use crate::seed::is_empty_ball;
use crate::spatial_index::SpatialIndex;
use meshbuild_core::{Error, Point3d, Result};
use std::f64::consts::TAU;
use tracing::{debug, trace};

/// Best point for the ball to hit when pivoting around an edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotCandidate {
    pub vertex: VertexId,
    pub center: Point3d,
    /// Rotation from the adjacent triangle's ball, in `[0, 2π]`
    pub angle: f64,
}

/// Counters for one expansion of a seed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    pub triangles_added: usize,
    pub boundary_edges: usize,
    pub stale_edges: usize,
}

/// Grow the mesh from `seed` until the front is exhausted
///
/// Every triangle created, starting with the seed itself, is appended to
/// `accumulator`.
pub fn expand(
    seed: TriangleId,
    index: &mut SpatialIndex,
    mesh: &mut MeshGraph,
    accumulator: &mut Vec<TriangleId>,
    tolerance: f64,
) -> Result<ExpansionStats> {
    let mut stats = ExpansionStats::default();
    let mut front: Vec<EdgeId> = mesh.edges_of(seed)?.to_vec();
    accumulator.push(seed);

    while let Some(edge) = front.pop() {
        if mesh.edge(edge).state() != EdgeState::Active {
            stats.stale_edges += 1;
            continue;
        }

        let Some(candidate) = find_candidate(edge, index, mesh, tolerance) else {
            trace!(edge = edge.index(), "No pivot candidate, marking boundary");
            mesh.mark_boundary(edge);
            stats.boundary_edges += 1;
            continue;
        };

        let (source, target) = (mesh.edge(edge).source(), mesh.edge(edge).target());
        let ball = Ball::new(candidate.center, index.radius());
        let triangle = mesh.insert_triangle(source, target, candidate.vertex, ball)?;
        index.mark_vertices_used(&[source, target, candidate.vertex]);
        accumulator.push(triangle);
        stats.triangles_added += 1;

        trace!(
            edge = edge.index(),
            candidate = candidate.vertex.index(),
            angle = candidate.angle,
            "Pivoted onto candidate"
        );

        for (u, v) in [(candidate.vertex, source), (target, candidate.vertex)] {
            let closing = mesh.edge_between(u, v).ok_or(Error::MissingEdge {
                v0: u.index(),
                v1: v.index(),
            })?;
            if mesh.edge(closing).state() == EdgeState::Active {
                front.push(closing);
            }
        }
    }

    debug!(
        seed = seed.index(),
        triangles = stats.triangles_added,
        boundary = stats.boundary_edges,
        stale = stats.stale_edges,
        "Front exhausted"
    );
    Ok(stats)
}

/// Accepting `p` for the edge `source -> target` would put a third triangle on
/// one of the closing edges, or fold the new triangle onto the one already
/// attached to a closing edge.
pub fn is_bad_candidate(mesh: &MeshGraph, source: VertexId, target: VertexId, p: VertexId) -> bool {
    [(target, p, source), (p, source, target)]
        .into_iter()
        .any(|(u, v, across)| closes_badly(mesh, u, v, across))
}

fn closes_badly(mesh: &MeshGraph, u: VertexId, v: VertexId, across: VertexId) -> bool {
    let Some(id) = mesh.edge_between(u, v) else {
        return false;
    };
    let edge = mesh.edge(id);
    if edge.state() == EdgeState::Inner {
        return true;
    }

    let Some(existing) = edge.first_triangle().and_then(|t| mesh.triangle(t).opposite(u, v)) else {
        return false;
    };
    geometry::folds_onto(
        mesh.vertex(u).position(),
        mesh.vertex(v).position(),
        mesh.vertex(existing).position(),
        mesh.vertex(across).position(),
    )
}

/// Point hit first when rotating the ball of the edge's triangle around it
pub fn find_candidate(
    edge: EdgeId,
    index: &SpatialIndex,
    mesh: &MeshGraph,
    tolerance: f64,
) -> Option<PivotCandidate> {
    let e = mesh.edge(edge);
    let (source, target) = (e.source(), e.target());
    let triangle = mesh.triangle(e.first_triangle()?);
    let radius = index.radius();

    let vs = mesh.vertex(source);
    let ps = vs.position();
    let pt = mesh.vertex(target).position();
    let midpoint = nalgebra::center(ps, pt);
    let direction = (pt - ps).try_normalize(f64::EPSILON)?;

    // Rotate away from the triangle: around the edge direction when the edge
    // runs counter-clockwise about the triangle's outward normal.
    let [a, b, c] = triangle.vertices();
    let outward = geometry::oriented_normal(
        mesh.vertex(a).position(),
        mesh.vertex(b).position(),
        mesh.vertex(c).position(),
        mesh.vertex(a).normal(),
    )?;
    let opposite = triangle.opposite(source, target)?;
    let inward = geometry::reject_from(&(mesh.vertex(opposite).position() - midpoint), &direction);
    let axis = if direction.cross(&inward).dot(&outward) >= 0.0 {
        direction
    } else {
        -direction
    };

    let mut best: Option<PivotCandidate> = None;
    for p in index.neighbors(&midpoint) {
        let vp = mesh.vertex(p);
        if vp.state() == VertexState::Inner
            || triangle.contains(p)
            || is_bad_candidate(mesh, source, target, p)
        {
            continue;
        }

        let Some(center) = geometry::ball_center(ps, vs.normal(), pt, vp.position(), radius) else {
            continue;
        };
        let Some(mut angle) = geometry::pivot_angle(&midpoint, &axis, triangle.center(), &center) else {
            continue;
        };

        // Co-spherical with the current ball: only a point across the edge
        // can be taken without rotating.
        if angle < COSPHERICAL_ANGLE || angle > TAU - COSPHERICAL_ANGLE {
            let side = geometry::reject_from(&(vp.position() - midpoint), &direction).dot(&inward);
            if side > 0.0 {
                continue;
            }
            angle = 0.0;
        }

        if best.is_some_and(|b| angle >= b.angle) {
            continue;
        }
        if !is_empty_ball(&center, radius, &[source, target, p], index, mesh, tolerance) {
            continue;
        }

        best = Some(PivotCandidate {
            vertex: p,
            center,
            angle,
        });
    }

    best
}
