//! Uniform voxel grid over the input points
//!
//! Cells have side `2 * radius`, so every point within `radius` of a query
//! position is found in the 3x3x3 block of cells around the query's cell.
//! Cells are kept in an ordered map: iterating cells (and hence searching for
//! seeds) visits them in key order, which keeps reconstruction deterministic.

use crate::mesh_graph::VertexId;
use meshbuild_core::{Error, Point3d, Result};
use std::collections::BTreeMap;

/// Integer coordinates of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CellKey {
    /// Key of the cell containing `position` for cells of side `side`
    pub fn containing(position: &Point3d, side: f64) -> Self {
        Self {
            x: (position.x / side).floor() as i64,
            y: (position.y / side).floor() as i64,
            z: (position.z / side).floor() as i64,
        }
    }

    /// This key and its 26 neighbours, in lexicographic order
    pub fn neighborhood(self) -> impl Iterator<Item = CellKey> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).map(move |dz| CellKey {
                    x: self.x + dx,
                    y: self.y + dy,
                    z: self.z + dz,
                })
            })
        })
    }
}

/// Points bucketed into one grid cell
#[derive(Debug, Clone, Default)]
pub struct Cell {
    points: Vec<VertexId>,
    used: bool,
}

impl Cell {
    /// Points in this cell, in input order
    pub fn points(&self) -> &[VertexId] {
        &self.points
    }

    /// Whether a seed search has already consumed this cell at the current radius
    pub fn is_used(&self) -> bool {
        self.used
    }
}

/// Voxel grid over a fixed set of point positions
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    positions: Vec<Point3d>,
    radius: f64,
    cells: BTreeMap<CellKey, Cell>,
    cell_of: Vec<Option<CellKey>>,
}

impl SpatialIndex {
    /// Create an index over `positions`; call [`SpatialIndex::rebuild`] before querying
    pub fn new(positions: Vec<Point3d>) -> Self {
        let cell_of = vec![None; positions.len()];
        Self {
            positions,
            radius: 0.0,
            cells: BTreeMap::new(),
            cell_of,
        }
    }

    /// Clear all cells and re-bucket every point for cells of side `2 * radius`
    ///
    /// Resets every "used" flag.
    pub fn rebuild(&mut self, radius: f64) -> Result<()> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Ball radius must be positive and finite, got {}",
                radius
            )));
        }

        self.radius = radius;
        self.cells.clear();

        let side = 2.0 * radius;
        for (i, position) in self.positions.iter().enumerate() {
            let key = CellKey::containing(position, side);
            self.cells.entry(key).or_default().points.push(VertexId::new(i));
            self.cell_of[i] = Some(key);
        }

        Ok(())
    }

    /// Radius the index was last rebuilt for
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// All points in the 27 cells around the cell containing `position`
    pub fn neighbors(&self, position: &Point3d) -> Vec<VertexId> {
        if self.cells.is_empty() {
            return Vec::new();
        }

        let key = CellKey::containing(position, 2.0 * self.radius);
        key.neighborhood()
            .filter_map(|k| self.cells.get(&k))
            .flat_map(|cell| cell.points.iter().copied())
            .collect()
    }

    /// Cell currently containing `vertex`
    pub fn cell_of(&self, vertex: VertexId) -> Option<CellKey> {
        self.cell_of.get(vertex.index()).copied().flatten()
    }

    pub fn cell(&self, key: CellKey) -> Option<&Cell> {
        self.cells.get(&key)
    }

    /// Cells not yet marked used, in key order
    pub fn unused_cells(&self) -> impl Iterator<Item = (CellKey, &Cell)> + '_ {
        self.cells
            .iter()
            .filter(|(_, cell)| !cell.used)
            .map(|(key, cell)| (*key, cell))
    }

    /// Mark a cell as consumed for the rest of the current pass
    pub fn mark_used(&mut self, key: CellKey) {
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.used = true;
        }
    }

    /// Mark the cells containing each of `vertices` as used
    pub fn mark_vertices_used(&mut self, vertices: &[VertexId]) {
        for &v in vertices {
            if let Some(key) = self.cell_of(v) {
                self.mark_used(key);
            }
        }
    }

    /// Position of a point
    pub fn position(&self, vertex: VertexId) -> &Point3d {
        &self.positions[vertex.index()]
    }
}
