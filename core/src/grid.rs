//! Cell coordinates, the grid model, the blocked-cell set and routes.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed so that points left of or above the grid map to
/// out-of-bounds cells instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Uniform square grid laid over the world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    columns: i32,
    rows: i32,
    cell_size: f32,
}

impl Grid {
    /// Lays a grid of `cell_size` cells over a `width` × `height` world.
    ///
    /// Partial cells along the right and bottom edges are dropped. A
    /// non-positive cell size produces an empty grid.
    #[must_use]
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        if cell_size <= 0.0 {
            return Self {
                columns: 0,
                rows: 0,
                cell_size,
            };
        }

        Self {
            columns: (width / cell_size).floor().max(0.0) as i32,
            rows: (height / cell_size).floor().max(0.0) as i32,
            cell_size,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> i32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> i32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let columns = usize::try_from(self.columns).unwrap_or(0);
        let rows = usize::try_from(self.rows).unwrap_or(0);
        columns.saturating_mul(rows)
    }

    /// Cell containing the world point.
    #[must_use]
    pub fn cell_from_point(&self, point: Vec2) -> CellCoord {
        CellCoord::new(
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    /// Centre of the cell in world units.
    #[must_use]
    pub fn point_from_cell(&self, cell: CellCoord) -> Vec2 {
        let half = self.cell_size / 2.0;
        Vec2::new(
            cell.column() as f32 * self.cell_size + half,
            cell.row() as f32 * self.cell_size + half,
        )
    }

    /// Snaps a world point to the centre of its cell.
    #[must_use]
    pub fn snap(&self, point: Vec2) -> Vec2 {
        self.point_from_cell(self.cell_from_point(point))
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.column() >= 0
            && cell.row() >= 0
            && cell.column() < self.columns
            && cell.row() < self.rows
    }

    /// Row-major dense index of an in-bounds cell.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Inverse of [`Grid::index`].
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        let width = usize::try_from(self.columns).ok().filter(|width| *width > 0)?;
        if index >= self.cell_count() {
            return None;
        }
        let column = i32::try_from(index % width).ok()?;
        let row = i32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// In-bounds cardinal neighbours in east, west, south, north order.
    #[must_use]
    pub fn neighbors(&self, cell: CellCoord) -> Neighbors {
        let mut neighbors = Neighbors::default();
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let candidate = CellCoord::new(cell.column() + dx, cell.row() + dy);
            if self.in_bounds(candidate) {
                neighbors.push(candidate);
            }
        }
        neighbors
    }

    /// Cells forming the outermost ring of the grid.
    #[must_use]
    pub fn border_cells(&self) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        if self.columns == 0 || self.rows == 0 {
            return cells;
        }
        for column in 0..self.columns {
            cells.push(CellCoord::new(column, 0));
            if self.rows > 1 {
                cells.push(CellCoord::new(column, self.rows - 1));
            }
        }
        for row in 1..self.rows - 1 {
            cells.push(CellCoord::new(0, row));
            if self.columns > 1 {
                cells.push(CellCoord::new(self.columns - 1, row));
            }
        }
        cells
    }
}

/// Up to four neighbouring cells stored inline.
#[derive(Clone, Copy, Debug, Default)]
pub struct Neighbors {
    buffer: [CellCoord; 4],
    len: usize,
}

impl Neighbors {
    fn push(&mut self, cell: CellCoord) {
        if let Some(slot) = self.buffer.get_mut(self.len) {
            *slot = cell;
            self.len += 1;
        }
    }

    /// Neighbours as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[CellCoord] {
        &self.buffer[..self.len]
    }

    /// Neighbours as a mutable slice, e.g. for shuffling.
    pub fn as_mut_slice(&mut self) -> &mut [CellCoord] {
        &mut self.buffer[..self.len]
    }
}

impl Default for CellCoord {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Set of impassable cells: border walls, player walls and towers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockedCells {
    cells: BTreeSet<CellCoord>,
}

impl BlockedCells {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether the cell is impassable.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }

    /// Marks the cell impassable, returning `false` when it already was.
    pub fn insert(&mut self, cell: CellCoord) -> bool {
        self.cells.insert(cell)
    }

    /// Clears the cell, returning `false` when it was not blocked.
    pub fn remove(&mut self, cell: CellCoord) -> bool {
        self.cells.remove(&cell)
    }

    /// Copy of the set with one more cell blocked.
    #[must_use]
    pub fn with(&self, cell: CellCoord) -> Self {
        let mut copy = self.clone();
        let _ = copy.insert(cell);
        copy
    }

    /// Number of blocked cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no cell is blocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Blocked cells in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().copied()
    }
}

impl FromIterator<CellCoord> for BlockedCells {
    fn from_iter<I: IntoIterator<Item = CellCoord>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Extend<CellCoord> for BlockedCells {
    fn extend<I: IntoIterator<Item = CellCoord>>(&mut self, iter: I) {
        self.cells.extend(iter);
    }
}

/// Ordered world points an agent walks from one end to the other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    points: Vec<Vec2>,
}

impl Route {
    /// Wraps an ordered list of waypoints.
    #[must_use]
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Waypoints in walking order.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Reports whether the route has no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Waypoint at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Vec2> {
        self.points.get(index).copied()
    }

    /// Waypoint halfway along the list.
    #[must_use]
    pub fn midpoint(&self) -> Option<Vec2> {
        self.get(self.points.len() / 2)
    }

    /// Appends another route's waypoints after this one's.
    #[must_use]
    pub fn concat(mut self, other: Route) -> Self {
        self.points.extend(other.points);
        self
    }

    /// Shortest distance from `point` to the polyline through the waypoints.
    ///
    /// Returns `f32::INFINITY` for an empty route.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        match self.points.as_slice() {
            [] => f32::INFINITY,
            [only] => only.distance(point),
            points => points
                .windows(2)
                .map(|pair| segment_distance(point, pair[0], pair[1]))
                .fold(f32::INFINITY, f32::min),
        }
    }
}

fn segment_distance(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}
