//! Vertex / edge / triangle graph grown by ball pivoting
//!
//! The graph is an arena: vertices, edges and triangles live in vectors owned
//! by [`MeshGraph`] and refer to each other through copyable handles. Nothing
//! is ever removed, so handles stay valid for the lifetime of the graph.
//!
//! [`MeshGraph::insert_triangle`] is the only operation that attaches
//! triangles; it keeps the state invariants below:
//!
//! - a vertex is `Orphan` iff it has no incident edge, `Inner` iff every
//!   incident edge is `Inner`, and `Front` otherwise;
//! - an edge with two triangles is `Inner`, an edge with one is `Active`
//!   unless the expander gave up on it (`Boundary`);
//! - no edge ever has more than two triangles.

use meshbuild_core::{Error, Point3d, Result, Vector3d};
use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(index)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

handle!(
    /// Handle of a vertex; equal to the index of its input point
    VertexId
);
handle!(
    /// Handle of an edge
    EdgeId
);
handle!(
    /// Handle of a triangle, in insertion order
    TriangleId
);

/// Meshing state of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexState {
    /// Not yet part of any triangle
    Orphan,
    /// On the boundary of the meshed region
    Front,
    /// Surrounded by triangles
    Inner,
}

/// Meshing state of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeState {
    /// Can still be pivoted around
    Active,
    /// Pivoting found no candidate; never revisited
    Boundary,
    /// Shared by two triangles
    Inner,
}

/// Ball that produced a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub center: Point3d,
    pub radius: f64,
}

impl Ball {
    pub fn new(center: Point3d, radius: f64) -> Self {
        Self { center, radius }
    }
}

#[derive(Debug, Clone)]
pub struct Vertex {
    position: Point3d,
    normal: Vector3d,
    state: VertexState,
    edges: Vec<EdgeId>,
}

impl Vertex {
    /// Input position, in double precision
    pub fn position(&self) -> &Point3d {
        &self.position
    }

    /// Input normal
    pub fn normal(&self) -> &Vector3d {
        &self.normal
    }

    /// Current meshing state
    pub fn state(&self) -> VertexState {
        self.state
    }

    /// Incident edges, in creation order
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    source: VertexId,
    target: VertexId,
    state: EdgeState,
    triangles: [Option<TriangleId>; 2],
}

impl Edge {
    /// Vertex the edge was first traversed from
    pub fn source(&self) -> VertexId {
        self.source
    }

    /// Vertex the edge was first traversed to
    pub fn target(&self) -> VertexId {
        self.target
    }

    /// Current meshing state
    pub fn state(&self) -> EdgeState {
        self.state
    }

    /// Adjacent triangles, filled in attachment order
    pub fn triangles(&self) -> impl Iterator<Item = TriangleId> + '_ {
        self.triangles.iter().flatten().copied()
    }

    /// Number of attached triangles, at most two
    pub fn triangle_count(&self) -> usize {
        self.triangles.iter().filter(|t| t.is_some()).count()
    }

    /// First attached triangle, the one an active edge pivots away from
    pub fn first_triangle(&self) -> Option<TriangleId> {
        self.triangles[0]
    }

    /// Whether the edge joins `u` and `v`, in either direction
    pub fn connects(&self, u: VertexId, v: VertexId) -> bool {
        (self.source == u && self.target == v) || (self.source == v && self.target == u)
    }

    fn attach(&mut self, triangle: TriangleId) {
        if self.triangles[0].is_none() {
            self.triangles[0] = Some(triangle);
        } else {
            self.triangles[1] = Some(triangle);
        }
        self.state = if self.triangle_count() == 2 {
            EdgeState::Inner
        } else {
            EdgeState::Active
        };
    }
}

#[derive(Debug, Clone)]
pub struct Triangle {
    vertices: [VertexId; 3],
    ball: Ball,
}

impl Triangle {
    /// Vertices in insertion order
    pub fn vertices(&self) -> [VertexId; 3] {
        self.vertices
    }

    /// Ball that produced the triangle
    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    /// Center of the triangle's ball
    pub fn center(&self) -> &Point3d {
        &self.ball.center
    }

    /// Whether `v` is a corner
    pub fn contains(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    /// The vertex not on the edge `(u, v)`, if `u` and `v` are both corners
    pub fn opposite(&self, u: VertexId, v: VertexId) -> Option<VertexId> {
        if !(self.contains(u) && self.contains(v)) {
            return None;
        }
        self.vertices.iter().copied().find(|&w| w != u && w != v)
    }
}

/// Topology of the mesh being reconstructed
#[derive(Debug, Clone, Default)]
pub struct MeshGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    triangles: Vec<Triangle>,
}

impl MeshGraph {
    /// Create a graph with one orphan vertex per oriented point
    pub fn new<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (Point3d, Vector3d)>,
    {
        let vertices = points
            .into_iter()
            .map(|(position, normal)| Vertex {
                position,
                normal,
                state: VertexState::Orphan,
                edges: Vec::new(),
            })
            .collect();

        Self {
            vertices,
            edges: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Get a vertex by handle
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get an edge by handle
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Get a triangle by handle
    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id.index()]
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Iterate over vertices with their handles
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices.iter().enumerate().map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over edges with their handles, in creation order
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeId::new(i), e))
    }

    /// Iterate over triangles with their handles, in insertion order
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> + '_ {
        self.triangles.iter().enumerate().map(|(i, t)| (TriangleId::new(i), t))
    }

    /// Positions of all vertices, in input order
    pub fn positions(&self) -> Vec<Point3d> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// The edge joining `u` and `v`, if one exists
    pub fn edge_between(&self, u: VertexId, v: VertexId) -> Option<EdgeId> {
        self.vertex(u)
            .edges
            .iter()
            .copied()
            .find(|&e| self.edge(e).connects(u, v))
    }

    /// Attach the triangle `(a, b, c)` produced by `ball`
    ///
    /// Reuses or creates the edges `ab`, `bc` and `ca`, registers the triangle
    /// on each of them and recomputes the state of the three vertices. Fails
    /// with [`Error::NonManifoldEdge`] before touching the graph if one of the
    /// edges already has two triangles, and with [`Error::InvalidData`] for
    /// a repeated or unknown vertex.
    pub fn insert_triangle(&mut self, a: VertexId, b: VertexId, c: VertexId, ball: Ball) -> Result<TriangleId> {
        if let Some(v) = [a, b, c].into_iter().find(|v| v.index() >= self.vertices.len()) {
            return Err(Error::InvalidData(format!(
                "Vertex {} is out of range for a graph of {} vertices",
                v.index(),
                self.vertices.len()
            )));
        }
        if a == b || b == c || c == a {
            return Err(Error::InvalidData(format!(
                "Triangle ({}, {}, {}) repeats a vertex",
                a.index(),
                b.index(),
                c.index()
            )));
        }

        let pairs = [(a, b), (b, c), (c, a)];
        for &(u, v) in &pairs {
            if let Some(e) = self.edge_between(u, v) {
                if self.edge(e).triangle_count() >= 2 {
                    return Err(Error::NonManifoldEdge {
                        v0: u.index(),
                        v1: v.index(),
                    });
                }
            }
        }

        let triangle = TriangleId::new(self.triangles.len());
        self.triangles.push(Triangle {
            vertices: [a, b, c],
            ball,
        });

        for &(u, v) in &pairs {
            let edge = match self.edge_between(u, v) {
                Some(e) => e,
                None => self.create_edge(u, v),
            };
            self.edges[edge.index()].attach(triangle);
        }

        for v in [a, b, c] {
            self.update_vertex_state(v);
        }

        Ok(triangle)
    }

    /// Edges `ab`, `bc`, `ca` of a triangle
    pub fn edges_of(&self, triangle: TriangleId) -> Result<[EdgeId; 3]> {
        let [a, b, c] = self.triangle(triangle).vertices;
        let find = |u: VertexId, v: VertexId| {
            self.edge_between(u, v).ok_or(Error::MissingEdge {
                v0: u.index(),
                v1: v.index(),
            })
        };
        Ok([find(a, b)?, find(b, c)?, find(c, a)?])
    }

    /// Close an active edge on which pivoting found no candidate
    pub fn mark_boundary(&mut self, edge: EdgeId) {
        let e = &mut self.edges[edge.index()];
        if e.state != EdgeState::Active {
            return;
        }
        e.state = EdgeState::Boundary;
        let (source, target) = (e.source, e.target);
        self.update_vertex_state(source);
        self.update_vertex_state(target);
    }

    fn create_edge(&mut self, source: VertexId, target: VertexId) -> EdgeId {
        let id = EdgeId::new(self.edges.len());
        self.edges.push(Edge {
            source,
            target,
            state: EdgeState::Active,
            triangles: [None, None],
        });
        self.vertices[source.index()].edges.push(id);
        self.vertices[target.index()].edges.push(id);
        id
    }

    fn update_vertex_state(&mut self, v: VertexId) {
        let vertex = &self.vertices[v.index()];
        let state = if vertex.edges.is_empty() {
            VertexState::Orphan
        } else if vertex
            .edges
            .iter()
            .any(|&e| self.edges[e.index()].state != EdgeState::Inner)
        {
            VertexState::Front
        } else {
            VertexState::Inner
        };
        self.vertices[v.index()].state = state;
    }
}
