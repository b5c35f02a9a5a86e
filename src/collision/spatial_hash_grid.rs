//! Uniform spatial hash grid for broad-phase pair generation.
//!
//! Bodies are bucketed into every cell their AABB overlaps, keyed by
//! `floor(p / cell_size)`. Only bodies sharing a cell are paired.

use hashbrown::{HashMap, HashSet};
use tracing::trace;

use super::aabb::AABB;
use super::broad_phase::{should_pair, BodyPair, BroadPhaseEntry};
use crate::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;

/// Integer cell coordinates.
pub type CellCoord = (i32, i32);

/// Unbounded grid of square cells keyed by integer coordinates.
///
/// Every entry is inserted into each cell its AABB overlaps. Cells are kept in
/// a hash map, so only occupied regions cost memory.
#[derive(Debug, Clone)]
pub struct SpatialHashGrid {
    cell_size: f64,
    cells: HashMap<CellCoord, Vec<BroadPhaseEntry>>,
}

impl SpatialHashGrid {
    /// Creates an empty grid. The cell size must be finite and positive.
    pub fn new(cell_size: f64) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(PhysicsError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing a world position: `floor(pos / cell_size)`.
    pub fn cell_coord(&self, position: Vec2) -> CellCoord {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// World-space bounds of a cell.
    pub fn cell_bounds(&self, (x, y): CellCoord) -> AABB {
        let min = Vec2::new(x as f64 * self.cell_size, y as f64 * self.cell_size);
        AABB::new(min, min + Vec2::splat(self.cell_size))
    }

    /// Drops cells that stayed empty since the last rebuild and empties the rest.
    /// Storage of recently used cells is kept for the next pass.
    pub fn clear(&mut self) {
        self.cells.retain(|_, entries| !entries.is_empty());
        for entries in self.cells.values_mut() {
            entries.clear();
        }
    }

    /// Adds an entry to every cell its AABB overlaps.
    pub fn insert(&mut self, entry: BroadPhaseEntry) {
        if !entry.aabb.min.is_finite() || !entry.aabb.max.is_finite() {
            trace!(handle = ?entry.handle, "skipping non-finite AABB");
            return;
        }
        let (min_x, min_y) = self.cell_coord(entry.aabb.min);
        let (max_x, max_y) = self.cell_coord(entry.aabb.max);
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                self.cells.entry((x, y)).or_default().push(entry);
            }
        }
    }

    /// Clears the grid and inserts every entry.
    pub fn rebuild(&mut self, entries: &[BroadPhaseEntry]) {
        self.clear();
        for entry in entries {
            self.insert(*entry);
        }
        trace!(
            cells = self.cells.len(),
            occupied = self.occupied_cell_count(),
            "spatial hash grid rebuilt"
        );
    }

    /// Adds every pruned pair sharing at least one cell to `pairs`.
    pub fn potential_pairs(&self, pairs: &mut HashSet<BodyPair>) {
        for entries in self.cells.values().filter(|entries| entries.len() >= 2) {
            for (i, a) in entries.iter().enumerate() {
                for b in &entries[i + 1..] {
                    if should_pair(a, b) {
                        pairs.insert(BodyPair::new(a.handle, b.handle));
                    }
                }
            }
        }
    }

    /// Cells currently stored, occupied or not.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.cells.values().filter(|entries| !entries.is_empty()).count()
    }

    /// Bounds of every cell holding at least one body.
    pub fn active_cell_bounds(&self) -> Vec<AABB> {
        let mut coords: Vec<CellCoord> = self
            .cells
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(coord, _)| *coord)
            .collect();
        coords.sort_unstable();
        coords.into_iter().map(|c| self.cell_bounds(c)).collect()
    }

    /// Bounds of every cell covering `region`, occupied or not.
    pub fn all_cell_bounds(&self, region: &AABB) -> Vec<AABB> {
        let (min_x, min_y) = self.cell_coord(region.min);
        let (max_x, max_y) = self.cell_coord(region.max);
        let mut out = Vec::new();
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                out.push(self.cell_bounds((x, y)));
            }
        }
        out
    }
}
