//! Seed triangle search
//!
//! Scans the grid cells not yet used at the current radius for an orphan
//! point that forms a compatible, empty-ball triangle with two nearby orphans.

use crate::geometry;
use crate::mesh_graph::{Ball, MeshGraph, TriangleId, VertexId, VertexState};
use crate::spatial_index::{Cell, SpatialIndex};
use itertools::iproduct;
use meshbuild_core::{Point3d, Result};
use tracing::{debug, trace};

/// A seed triangle that passed every test but is not yet in the graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedCandidate {
    pub vertices: [VertexId; 3],
    pub center: Point3d,
}

/// Find a seed triangle, insert it into `mesh` and mark its cells used
///
/// Returns `Ok(None)` when no unused cell yields a seed at the index's radius.
pub fn find_seed(index: &mut SpatialIndex, mesh: &mut MeshGraph, tolerance: f64) -> Result<Option<TriangleId>> {
    let mut exhausted = Vec::new();
    let mut found = None;

    for (key, cell) in index.unused_cells() {
        match seed_in_cell(cell, index, mesh, tolerance) {
            Some(seed) => {
                found = Some((key, seed));
                break;
            }
            None => exhausted.push(key),
        }
    }

    // The orphan set only shrinks during a pass, so a cell that failed once
    // fails for the rest of it.
    for key in exhausted {
        index.mark_used(key);
    }

    let Some((key, seed)) = found else {
        return Ok(None);
    };

    let [p, q, s] = seed.vertices;
    let triangle = mesh.insert_triangle(p, q, s, Ball::new(seed.center, index.radius()))?;
    index.mark_used(key);
    index.mark_vertices_used(&seed.vertices);

    debug!(
        triangle = triangle.index(),
        p = p.index(),
        q = q.index(),
        s = s.index(),
        cell = ?key,
        "Found seed triangle"
    );
    Ok(Some(triangle))
}

/// Whether some unused cell still yields a seed, without inserting it
pub fn has_seed(index: &SpatialIndex, mesh: &MeshGraph, tolerance: f64) -> bool {
    index
        .unused_cells()
        .any(|(_, cell)| seed_in_cell(cell, index, mesh, tolerance).is_some())
}

fn seed_in_cell(cell: &Cell, index: &SpatialIndex, mesh: &MeshGraph, tolerance: f64) -> Option<SeedCandidate> {
    cell.points()
        .iter()
        .copied()
        .filter(|&p| mesh.vertex(p).state() == VertexState::Orphan)
        .find_map(|p| seed_around(p, index, mesh, tolerance))
}

/// Orphan neighbours of `p` (including `p` itself), nearest first
///
/// Ties are broken by vertex id so the order is total.
pub fn sorted_orphan_neighbors(p: VertexId, index: &SpatialIndex, mesh: &MeshGraph) -> Vec<VertexId> {
    let origin = mesh.vertex(p).position();
    let mut orphans: Vec<(f64, VertexId)> = index
        .neighbors(origin)
        .into_iter()
        .filter(|&v| mesh.vertex(v).state() == VertexState::Orphan)
        .map(|v| ((mesh.vertex(v).position() - origin).norm_squared(), v))
        .collect();

    orphans.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    orphans.into_iter().map(|(_, v)| v).collect()
}

/// First valid seed with `p` as its first corner
pub fn seed_around(p: VertexId, index: &SpatialIndex, mesh: &MeshGraph, tolerance: f64) -> Option<SeedCandidate> {
    let radius = index.radius();
    let orphans = sorted_orphan_neighbors(p, index, mesh);
    let vp = mesh.vertex(p);

    iproduct!(orphans.iter().copied(), orphans.iter().copied())
        .filter(|&(q, s)| p != q && p != s && q != s)
        .find_map(|(q, s)| {
            let (vq, vs) = (mesh.vertex(q), mesh.vertex(s));
            if !geometry::is_compatible(
                vp.position(),
                vp.normal(),
                vq.position(),
                vq.normal(),
                vs.position(),
                vs.normal(),
            ) {
                return None;
            }

            let center = geometry::ball_center(vp.position(), vp.normal(), vq.position(), vs.position(), radius)?;
            if !is_empty_ball(&center, radius, &[p, q, s], index, mesh, tolerance) {
                trace!(p = p.index(), q = q.index(), s = s.index(), "Seed ball is not empty");
                return None;
            }

            Some(SeedCandidate {
                vertices: [p, q, s],
                center,
            })
        })
}

/// Whether no point other than `corners` lies strictly inside the ball
pub fn is_empty_ball(
    center: &Point3d,
    radius: f64,
    corners: &[VertexId],
    index: &SpatialIndex,
    mesh: &MeshGraph,
    tolerance: f64,
) -> bool {
    index
        .neighbors(center)
        .into_iter()
        .filter(|v| !corners.contains(v))
        .all(|v| !geometry::strictly_inside(mesh.vertex(v).position(), center, radius, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_graph::EdgeState;
    use meshbuild_core::Vector3d;

    const TOL: f64 = 1e-7;

    fn setup(points: &[[f64; 3]], radius: f64) -> (SpatialIndex, MeshGraph) {
        let oriented: Vec<_> = points
            .iter()
            .map(|p| (Point3d::new(p[0], p[1], p[2]), Vector3d::z()))
            .collect();
        let mesh = MeshGraph::new(oriented);
        let mut index = SpatialIndex::new(mesh.positions());
        index.rebuild(radius).unwrap();
        (index, mesh)
    }

    #[test]
    fn test_seed_from_unit_square() {
        let (mut index, mut mesh) = setup(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            0.8,
        );

        let seed = find_seed(&mut index, &mut mesh, TOL).unwrap().unwrap();
        let tri = mesh.triangle(seed);
        assert_eq!(
            tri.vertices(),
            [VertexId::new(0), VertexId::new(1), VertexId::new(3)]
        );
        assert!(tri.center().z > 0.0);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.edges().all(|(_, e)| e.state() == EdgeState::Active));
        assert_eq!(index.unused_cells().count(), 0);
    }

    #[test]
    fn test_seed_is_ccw_around_normals() {
        let (mut index, mut mesh) = setup(
            &[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
            1.0,
        );

        let seed = find_seed(&mut index, &mut mesh, TOL).unwrap().unwrap();
        let [a, b, c] = mesh.triangle(seed).vertices();
        let n = geometry::face_normal(
            mesh.vertex(a).position(),
            mesh.vertex(b).position(),
            mesh.vertex(c).position(),
        );
        assert!(n.z > 0.0);
    }

    #[test]
    fn test_has_seed_leaves_graph_untouched() {
        let (mut index, mut mesh) = setup(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            0.8,
        );
        assert!(has_seed(&index, &mesh, TOL));
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(index.unused_cells().count(), index.cell_count());

        find_seed(&mut index, &mut mesh, TOL).unwrap().unwrap();
        assert!(!has_seed(&index, &mesh, TOL));
    }

    #[test]
    fn test_isolated_point_has_no_seed() {
        let (mut index, mut mesh) = setup(&[[0.0, 0.0, 0.0]], 0.5);
        assert!(find_seed(&mut index, &mut mesh, TOL).unwrap().is_none());
        assert_eq!(mesh.vertex(VertexId::new(0)).state(), VertexState::Orphan);
    }

    #[test]
    fn test_far_points_have_no_seed() {
        let (mut index, mut mesh) = setup(
            &[[0.0, 0.0, 0.0], [5.0, 0.0, 0.0], [0.0, 5.0, 0.0]],
            0.5,
        );
        assert!(find_seed(&mut index, &mut mesh, TOL).unwrap().is_none());
        // Every cell was tried and is now consumed.
        assert_eq!(index.unused_cells().count(), 0);
    }

    #[test]
    fn test_occupied_ball_is_rejected() {
        // The fourth point sits just above the triangle, inside every ball
        // resting on the other three.
        let (index, mesh) = setup(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.3, 0.3, 0.2]],
            0.8,
        );
        let center = geometry::ball_center(
            mesh.vertex(VertexId::new(0)).position(),
            &Vector3d::z(),
            mesh.vertex(VertexId::new(1)).position(),
            mesh.vertex(VertexId::new(2)).position(),
            0.8,
        )
        .unwrap();
        let corners = [VertexId::new(0), VertexId::new(1), VertexId::new(2)];
        assert!(!is_empty_ball(&center, 0.8, &corners, &index, &mesh, TOL));
    }

    #[test]
    fn test_sorted_neighbors_break_ties_by_id() {
        let (index, mesh) = setup(
            &[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.0, 0.0]],
            1.0,
        );
        let sorted = sorted_orphan_neighbors(VertexId::new(0), &index, &mesh);
        let ids: Vec<_> = sorted.iter().map(|v| v.index()).collect();
        assert_eq!(ids, vec![0, 3, 1, 2]);
    }
}
