//! Broad phase: cheap candidate-pair generation before the exact tests.
//!
//! Three interchangeable strategies share the same input (one
//! [`BroadPhaseEntry`] per body, rebuilt every pass) and the same pair pruning:
//! a pair is emitted only when at least one body is dynamic and the cached
//! AABBs overlap. Output pairs are ordered by handle, deduplicated and sorted.
//!
//! # Example
//!
//! ```
//! use rigid2d::collision::{BroadPhase, BroadPhaseEntry, BroadPhaseMethod, AABB};
//! use rigid2d::config::QuadtreeConfig;
//! use rigid2d::Vec2;
//!
//! let bounds = AABB::new(Vec2::new(-3.0, -3.0), Vec2::new(3.0, 3.0));
//! let mut broad_phase =
//!     BroadPhase::new(BroadPhaseMethod::Quadtree, bounds, QuadtreeConfig::default(), 0.5).unwrap();
//! let entries = [
//!     BroadPhaseEntry::dynamic(0, AABB::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0))),
//!     BroadPhaseEntry::dynamic(1, AABB::new(Vec2::new(0.5, 0.5), Vec2::new(1.5, 1.5))),
//! ];
//! let mut pairs = Vec::new();
//! broad_phase.collect_pairs(&entries, &mut pairs);
//! assert_eq!(pairs.len(), 1);
//! ```

use hashbrown::HashSet;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::aabb::AABB;
use super::quadtree::Quadtree;
use super::spatial_hash_grid::SpatialHashGrid;
use crate::config::QuadtreeConfig;
use crate::error::Result;
use crate::objects::BodyHandle;

/// Selects the broad-phase strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BroadPhaseMethod {
    /// Every pair is tested.
    BruteForce,
    /// Region quadtree over the world bounds.
    Quadtree,
    /// Uniform hashed grid.
    #[default]
    SpatialHashGrid,
}

/// What the broad phase knows about a body: its handle, current AABB and
/// whether it is static.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadPhaseEntry {
    pub handle: BodyHandle,
    pub aabb: AABB,
    pub is_static: bool,
}

impl BroadPhaseEntry {
    pub fn new(handle: BodyHandle, aabb: AABB, is_static: bool) -> Self {
        Self {
            handle,
            aabb,
            is_static,
        }
    }

    /// Entry for a dynamic body with the given index.
    pub fn dynamic(index: usize, aabb: AABB) -> Self {
        Self::new(BodyHandle(index), aabb, false)
    }

    /// Entry for a static body with the given index.
    pub fn fixed(index: usize, aabb: AABB) -> Self {
        Self::new(BodyHandle(index), aabb, true)
    }
}

/// Unordered body pair, stored with the smaller handle first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl BodyPair {
    pub fn new(x: BodyHandle, y: BodyHandle) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }
}

/// Pruning shared by every strategy: two static bodies never pair, and the
/// AABBs must overlap.
pub fn should_pair(a: &BroadPhaseEntry, b: &BroadPhaseEntry) -> bool {
    a.handle != b.handle && !(a.is_static && b.is_static) && a.aabb.intersects(&b.aabb)
}

/// O(n²) pair generation.
pub fn brute_force_pairs(entries: &[BroadPhaseEntry], pairs: &mut HashSet<BodyPair>) {
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            if should_pair(a, b) {
                pairs.insert(BodyPair::new(a.handle, b.handle));
            }
        }
    }
}

/// Owns both spatial indices and dispatches to the active strategy.
#[derive(Debug)]
pub struct BroadPhase {
    method: BroadPhaseMethod,
    quadtree: Quadtree,
    grid: SpatialHashGrid,
    pair_set: HashSet<BodyPair>,
}

impl BroadPhase {
    pub fn new(
        method: BroadPhaseMethod,
        world_bounds: AABB,
        quadtree: QuadtreeConfig,
        cell_size: f64,
    ) -> Result<Self> {
        Ok(Self {
            method,
            quadtree: Quadtree::new(world_bounds, quadtree),
            grid: SpatialHashGrid::new(cell_size)?,
            pair_set: HashSet::new(),
        })
    }

    pub fn method(&self) -> BroadPhaseMethod {
        self.method
    }

    pub fn set_method(&mut self, method: BroadPhaseMethod) {
        if method != self.method {
            debug!(from = ?self.method, to = ?method, "switching broad phase");
            self.method = method;
        }
    }

    pub fn quadtree(&self) -> &Quadtree {
        &self.quadtree
    }

    /// Mutable access to the quadtree, e.g. to preallocate its node pool.
    pub fn quadtree_mut(&mut self) -> &mut Quadtree {
        &mut self.quadtree
    }

    pub fn grid(&self) -> &SpatialHashGrid {
        &self.grid
    }

    /// Replaces the hash grid with one of a new cell size.
    pub fn set_cell_size(&mut self, cell_size: f64) -> Result<()> {
        self.grid = SpatialHashGrid::new(cell_size)?;
        debug!(cell_size, "spatial hash grid reconfigured");
        Ok(())
    }

    /// Rebuilds the active index from `entries` and writes the sorted,
    /// deduplicated candidate pairs into `out` (cleared first).
    pub fn collect_pairs(&mut self, entries: &[BroadPhaseEntry], out: &mut Vec<BodyPair>) {
        self.pair_set.clear();
        match self.method {
            BroadPhaseMethod::BruteForce => brute_force_pairs(entries, &mut self.pair_set),
            BroadPhaseMethod::Quadtree => {
                self.quadtree.rebuild(entries);
                self.quadtree.potential_pairs(&mut self.pair_set);
            }
            BroadPhaseMethod::SpatialHashGrid => {
                self.grid.rebuild(entries);
                self.grid.potential_pairs(&mut self.pair_set);
            }
        }
        out.clear();
        out.extend(self.pair_set.drain());
        out.sort_unstable();
        trace!(method = ?self.method, bodies = entries.len(), pairs = out.len(), "broad phase");
    }
}
