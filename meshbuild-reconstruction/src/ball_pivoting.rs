//! Ball Pivoting Algorithm
//!
//! Drives seed search and front expansion over a schedule of ball radii. The
//! mesh graph and the accumulated triangle list persist across radii, so a
//! larger ball only fills the holes a smaller one left behind.

use crate::audit::AuditSummary;
use crate::geometry;
use crate::mesh_graph::{EdgeState, MeshGraph, TriangleId};
use crate::pivot;
use crate::progress::Progress;
use crate::seed;
use crate::spatial_index::SpatialIndex;
use meshbuild_core::{Error, NormalPoint3f, PointCloud, Result, TriangleMesh};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

/// Vertex order of the faces handed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FaceWinding {
    /// Counter-clockwise when seen from the side the point normals face
    #[default]
    CounterClockwise,
    /// Clockwise, for viewers that treat CW faces as front-facing
    Clockwise,
}

/// Configuration for Ball Pivoting Algorithm
#[derive(Debug, Clone, PartialEq)]
pub struct BallPivotingConfig {
    /// Ball radii, processed in order
    pub radii: Vec<f64>,
    /// Maximum seed/expansion cycles per radius
    pub max_iterations: usize,
    /// Fraction of the radius by which a point must be inside a ball to count
    pub empty_ball_tolerance: f64,
    pub output_winding: FaceWinding,
}

impl Default for BallPivotingConfig {
    fn default() -> Self {
        Self {
            radii: vec![0.1],
            max_iterations: 1000,
            empty_ball_tolerance: 1e-7,
            output_winding: FaceWinding::CounterClockwise,
        }
    }
}

impl BallPivotingConfig {
    pub fn with_radii(mut self, radii: impl Into<Vec<f64>>) -> Self {
        self.radii = radii.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_empty_ball_tolerance(mut self, tolerance: f64) -> Self {
        self.empty_ball_tolerance = tolerance;
        self
    }

    pub fn with_output_winding(mut self, winding: FaceWinding) -> Self {
        self.output_winding = winding;
        self
    }

    /// Check the radius schedule and tolerance
    pub fn validate(&self) -> Result<()> {
        if self.radii.is_empty() {
            return Err(Error::InvalidData("At least one ball radius is required".to_string()));
        }
        if let Some(bad) = self.radii.iter().find(|r| !r.is_finite() || **r <= 0.0) {
            return Err(Error::InvalidData(format!(
                "Ball radius must be positive and finite, got {}",
                bad
            )));
        }
        if !(0.0..1.0).contains(&self.empty_ball_tolerance) {
            return Err(Error::InvalidData(format!(
                "Empty ball tolerance must be in [0, 1), got {}",
                self.empty_ball_tolerance
            )));
        }
        Ok(())
    }
}

/// Outcome of one radius pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub radius: f64,
    /// Seed triangles found, i.e. iterations consumed
    pub seeds: usize,
    /// Triangles created during this pass, seeds included
    pub triangles_added: usize,
    /// Size of the accumulated triangle list after this pass
    pub total_triangles: usize,
    pub boundary_edges: usize,
    /// The pass stopped at `max_iterations` rather than running out of seeds
    pub hit_iteration_cap: bool,
}

/// Ball Pivoting Algorithm implementation
#[derive(Debug)]
pub struct BallPivoting {
    config: BallPivotingConfig,
    index: SpatialIndex,
    mesh: MeshGraph,
    triangles: Vec<TriangleId>,
    progress: Progress,
}

impl BallPivoting {
    /// Create a new Ball Pivoting Algorithm instance
    ///
    /// Fails on an invalid configuration, an empty cloud or non-finite points.
    pub fn new(cloud: &PointCloud<NormalPoint3f>, config: BallPivotingConfig) -> Result<Self> {
        config.validate()?;
        if cloud.is_empty() {
            return Err(Error::InvalidData("Point cloud is empty".to_string()));
        }
        if let Some(i) = cloud.iter().position(|p| !p.is_finite()) {
            return Err(Error::InvalidData(format!("Point {} has non-finite coordinates", i)));
        }

        let mesh = MeshGraph::new(cloud.iter().map(|p| (p.position_f64(), p.normal_f64())));
        let index = SpatialIndex::new(mesh.positions());

        Ok(Self {
            config,
            index,
            mesh,
            triangles: Vec::new(),
            progress: Progress::none(),
        })
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &BallPivotingConfig {
        &self.config
    }

    pub fn mesh(&self) -> &MeshGraph {
        &self.mesh
    }

    /// Triangles in creation order, across all passes so far
    pub fn triangles(&self) -> &[TriangleId] {
        &self.triangles
    }

    /// Run seed search and expansion at one radius
    pub fn run_pass(&mut self, radius: f64) -> Result<PassReport> {
        let span = info_span!("pivot_pass", radius);
        let _enter = span.enter();

        self.index.rebuild(radius)?;

        let max_iterations = self.config.max_iterations;
        let tolerance = self.config.empty_ball_tolerance;
        let before = self.triangles.len();
        let mut seeds = 0;
        let mut boundary_edges = 0;
        let mut exhausted = false;

        for iteration in 0..max_iterations {
            self.progress.report(iteration, max_iterations, "Expanding seed");

            let Some(seed) = seed::find_seed(&mut self.index, &mut self.mesh, tolerance)? else {
                exhausted = true;
                break;
            };
            seeds += 1;

            let stats = pivot::expand(seed, &mut self.index, &mut self.mesh, &mut self.triangles, tolerance)?;
            boundary_edges += stats.boundary_edges;
        }
        self.progress.report(max_iterations, max_iterations, "Pass complete");

        let report = PassReport {
            radius,
            seeds,
            triangles_added: self.triangles.len() - before,
            total_triangles: self.triangles.len(),
            boundary_edges,
            hit_iteration_cap: !exhausted && seed::has_seed(&self.index, &self.mesh, tolerance),
        };

        if report.hit_iteration_cap {
            warn!(max_iterations, "Pass stopped at the iteration cap");
        }
        info!(
            seeds = report.seeds,
            added = report.triangles_added,
            total = report.total_triangles,
            boundary = report.boundary_edges,
            "Pass complete"
        );
        Ok(report)
    }

    /// Run every radius of the configured schedule
    pub fn reconstruct(&mut self) -> Result<Vec<PassReport>> {
        let radii = self.config.radii.clone();
        radii.into_iter().map(|radius| self.run_pass(radius)).collect()
    }

    /// Accumulated faces in the configured output winding
    pub fn oriented_faces(&self) -> Vec<[usize; 3]> {
        self.faces_with_winding(self.config.output_winding)
    }

    /// Accumulated faces, each reordered to agree with its vertex normals
    ///
    /// A face whose normal points against the sum of its three vertex normals
    /// has its last two indices swapped; `Clockwise` then swaps the first two.
    pub fn faces_with_winding(&self, winding: FaceWinding) -> Vec<[usize; 3]> {
        let mesh = &self.mesh;
        self.triangles
            .iter()
            .map(|&t| {
                let [a, b, c] = mesh.triangle(t).vertices();
                let (va, vb, vc) = (mesh.vertex(a), mesh.vertex(b), mesh.vertex(c));
                let normal = geometry::face_normal(va.position(), vb.position(), vc.position());
                let reference = va.normal() + vb.normal() + vc.normal();

                let mut face = [a.index(), b.index(), c.index()];
                if normal.dot(&reference) < 0.0 {
                    face.swap(1, 2);
                }
                if winding == FaceWinding::Clockwise {
                    face.swap(0, 1);
                }
                face
            })
            .collect()
    }

    /// Number of edges that ended up on the mesh boundary
    pub fn boundary_edge_count(&self) -> usize {
        self.mesh
            .edges()
            .filter(|(_, e)| e.state() == EdgeState::Boundary)
            .count()
    }

    /// Topology, empty-ball and winding checks over the current result
    pub fn audit(&self) -> AuditSummary {
        let faces = self.faces_with_winding(FaceWinding::CounterClockwise);
        AuditSummary::collect(&self.mesh, &faces, self.config.empty_ball_tolerance)
    }

    /// All input vertices, with their normals, plus the oriented faces
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        let vertices = self
            .mesh
            .vertices()
            .map(|(_, v)| v.position().cast::<f32>())
            .collect();
        let normals = self.mesh.vertices().map(|(_, v)| v.normal().cast::<f32>()).collect();

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, self.oriented_faces());
        mesh.set_normals(normals);
        mesh
    }
}

/// Ball Pivoting Algorithm for surface reconstruction
///
/// # Arguments
/// * `cloud` - Point cloud with normal information
/// * `radii` - Ball radii, processed in order
/// * `max_iterations` - Seed/expansion cycles allowed per radius
///
/// # Returns
/// * `Result<TriangleMesh>` - Reconstructed triangle mesh; it may have no faces
pub fn ball_pivoting_algorithm(
    cloud: &PointCloud<NormalPoint3f>,
    radii: &[f64],
    max_iterations: usize,
) -> Result<TriangleMesh> {
    let config = BallPivotingConfig::default()
        .with_radii(radii)
        .with_max_iterations(max_iterations);
    ball_pivoting_algorithm_with_config(cloud, &config)
}

/// Ball Pivoting Algorithm with configuration
pub fn ball_pivoting_algorithm_with_config(
    cloud: &PointCloud<NormalPoint3f>,
    config: &BallPivotingConfig,
) -> Result<TriangleMesh> {
    let mut bpa = BallPivoting::new(cloud, config.clone())?;
    bpa.reconstruct()?;
    Ok(bpa.to_triangle_mesh())
}
