//! Post-hoc checks of a reconstructed mesh
//!
//! These are independent of the bookkeeping done during pivoting: edge
//! incidences are recounted from the triangle list, and every recorded ball is
//! tested against every input point.

use crate::geometry;
use crate::mesh_graph::{EdgeState, MeshGraph, TriangleId, VertexId, VertexState};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Vertex and edge counts by state, plus incidence mismatches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyReport {
    pub orphan_vertices: usize,
    pub front_vertices: usize,
    pub inner_vertices: usize,
    pub active_edges: usize,
    pub boundary_edges: usize,
    pub inner_edges: usize,
    pub triangles: usize,
    /// Edges adjacent to more than two triangles
    pub overfull_edges: usize,
    /// Edges whose state disagrees with their triangle count
    pub mismatched_edges: usize,
    /// Vertices whose state disagrees with their edges
    pub mismatched_vertices: usize,
    /// Triangle sides with no registered edge
    pub missing_edges: usize,
}

impl TopologyReport {
    pub fn from_graph(mesh: &MeshGraph) -> Self {
        let mut report = Self {
            triangles: mesh.triangle_count(),
            ..Self::default()
        };

        let mut incidence = vec![0usize; mesh.edge_count()];
        for (_, triangle) in mesh.triangles() {
            let [a, b, c] = triangle.vertices();
            for (u, v) in [(a, b), (b, c), (c, a)] {
                match mesh.edge_between(u, v) {
                    Some(e) => incidence[e.index()] += 1,
                    None => report.missing_edges += 1,
                }
            }
        }

        for (id, edge) in mesh.edges() {
            match edge.state() {
                EdgeState::Active => report.active_edges += 1,
                EdgeState::Boundary => report.boundary_edges += 1,
                EdgeState::Inner => report.inner_edges += 1,
            }

            let count = incidence[id.index()];
            if count > 2 {
                report.overfull_edges += 1;
            }
            let sealed = edge.state() == EdgeState::Inner;
            if (count == 2) != sealed {
                report.mismatched_edges += 1;
            }
        }

        for (_, vertex) in mesh.vertices() {
            match vertex.state() {
                VertexState::Orphan => report.orphan_vertices += 1,
                VertexState::Front => report.front_vertices += 1,
                VertexState::Inner => report.inner_vertices += 1,
            }

            let expected = if vertex.edges().is_empty() {
                VertexState::Orphan
            } else if vertex
                .edges()
                .iter()
                .all(|&e| mesh.edge(e).state() == EdgeState::Inner)
            {
                VertexState::Inner
            } else {
                VertexState::Front
            };
            if vertex.state() != expected {
                report.mismatched_vertices += 1;
            }
        }

        report
    }

    /// No edge carries more than two triangles and every state matches the counts
    pub fn is_consistent(&self) -> bool {
        self.overfull_edges == 0
            && self.mismatched_edges == 0
            && self.mismatched_vertices == 0
            && self.missing_edges == 0
    }
}

/// Triangles whose ball strictly contains some other input point
///
/// Brute force over all points; meant for tests and `--audit`, not for the
/// reconstruction loop.
pub fn occupied_balls(mesh: &MeshGraph, tolerance: f64) -> Vec<TriangleId> {
    let positions = mesh.positions();
    (0..mesh.triangle_count())
        .into_par_iter()
        .map(TriangleId::new)
        .filter(|&t| {
            let triangle = mesh.triangle(t);
            let ball = triangle.ball();
            positions.iter().enumerate().any(|(i, p)| {
                !triangle.contains(VertexId::new(i))
                    && geometry::strictly_inside(p, &ball.center, ball.radius, tolerance)
            })
        })
        .collect()
}

/// Number of faces whose normal points against one of its vertex normals
///
/// A face counts when the dot product of its unit normal with any corner's
/// normal is below `-epsilon`. Degenerate faces are skipped.
pub fn winding_violations(mesh: &MeshGraph, faces: &[[usize; 3]], epsilon: f64) -> usize {
    faces
        .par_iter()
        .filter(|face| {
            let corner = |i: usize| mesh.vertex(VertexId::new(face[i]));
            let Some(normal) =
                geometry::face_normal(corner(0).position(), corner(1).position(), corner(2).position())
                    .try_normalize(f64::EPSILON)
            else {
                return false;
            };
            (0..3).any(|i| normal.dot(corner(i).normal()) < -epsilon)
        })
        .count()
}

/// Everything `--audit` prints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub topology: TopologyReport,
    pub occupied_balls: usize,
    pub winding_violations: usize,
}

impl AuditSummary {
    /// Run every check; `faces` must be in counter-clockwise winding
    pub fn collect(mesh: &MeshGraph, faces: &[[usize; 3]], tolerance: f64) -> Self {
        Self {
            topology: TopologyReport::from_graph(mesh),
            occupied_balls: occupied_balls(mesh, tolerance).len(),
            winding_violations: winding_violations(mesh, faces, 1e-5),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.topology.is_consistent() && self.occupied_balls == 0 && self.winding_violations == 0
    }
}
