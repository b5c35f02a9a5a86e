//! Simulation configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::collision::{BroadPhaseMethod, AABB};
use crate::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;

/// Limits for quadtree subdivision.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadtreeConfig {
    /// Entries a node holds before it subdivides.
    pub max_objects: usize,
    /// Maximum depth; nodes at this level never subdivide.
    pub max_levels: usize,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_objects: 4,
            max_levels: 8,
        }
    }
}

/// Parameters of a [`PhysicsWorld`](crate::world::PhysicsWorld).
///
/// # Example
///
/// ```
/// use rigid2d::{BroadPhaseMethod, SimulationConfig, Vec2};
///
/// let config = SimulationConfig::default()
///     .with_gravity(Vec2::new(0.0, -1.62))
///     .with_broad_phase(BroadPhaseMethod::Quadtree);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Duration of one simulation step in seconds.
    pub fixed_time_step: f64,
    /// Detect/solve passes per step (early exit when a pass finds no contacts).
    pub collision_iterations: usize,
    /// Upper bound on steps run by a single `update` call.
    pub max_steps_per_frame: usize,
    /// Gravity acceleration in m/s².
    pub gravity: Vec2,
    /// Region covered by the quadtree root and the debug hash grid.
    pub world_bounds: AABB,
    /// Edge length of a spatial hash grid cell.
    pub hash_grid_cell_size: f64,
    /// Broad phase used at start-up.
    pub broad_phase: BroadPhaseMethod,
    /// Quadtree subdivision limits.
    pub quadtree: QuadtreeConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_time_step: 1.0 / 300.0,
            collision_iterations: 8,
            max_steps_per_frame: 32,
            gravity: Vec2::new(0.0, -9.81),
            world_bounds: AABB::new(Vec2::new(-3.0, -3.0), Vec2::new(3.0, 3.0)),
            hash_grid_cell_size: 0.1 * 1.41,
            broad_phase: BroadPhaseMethod::SpatialHashGrid,
            quadtree: QuadtreeConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Set the fixed time step.
    #[must_use]
    pub fn with_fixed_time_step(mut self, dt: f64) -> Self {
        self.fixed_time_step = dt;
        self
    }

    /// Set the number of detect/solve passes per step.
    #[must_use]
    pub fn with_collision_iterations(mut self, iterations: usize) -> Self {
        self.collision_iterations = iterations;
        self
    }

    /// Set the per-frame step cap.
    #[must_use]
    pub fn with_max_steps_per_frame(mut self, steps: usize) -> Self {
        self.max_steps_per_frame = steps;
        self
    }

    /// Set gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Vec2::ZERO;
        self
    }

    /// Set the world bounds.
    #[must_use]
    pub fn with_world_bounds(mut self, bounds: AABB) -> Self {
        self.world_bounds = bounds;
        self
    }

    /// Set the spatial hash grid cell size.
    #[must_use]
    pub fn with_hash_grid_cell_size(mut self, cell_size: f64) -> Self {
        self.hash_grid_cell_size = cell_size;
        self
    }

    /// Set the broad phase strategy.
    #[must_use]
    pub fn with_broad_phase(mut self, method: BroadPhaseMethod) -> Self {
        self.broad_phase = method;
        self
    }

    /// Set the quadtree limits.
    #[must_use]
    pub fn with_quadtree(mut self, quadtree: QuadtreeConfig) -> Self {
        self.quadtree = quadtree;
        self
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<()> {
        let dt = self.fixed_time_step;
        if !dt.is_finite() || dt <= 0.0 || dt > 1.0 {
            return Err(PhysicsError::InvalidTimestep(dt));
        }
        if self.collision_iterations == 0 {
            return Err(PhysicsError::invalid_config(
                "collision_iterations must be at least 1",
            ));
        }
        if self.max_steps_per_frame == 0 {
            return Err(PhysicsError::invalid_config(
                "max_steps_per_frame must be at least 1",
            ));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::invalid_config("gravity must be finite"));
        }
        let cell = self.hash_grid_cell_size;
        if !cell.is_finite() || cell <= 0.0 {
            return Err(PhysicsError::InvalidCellSize(cell));
        }
        let bounds = self.world_bounds;
        if !bounds.min.is_finite()
            || !bounds.max.is_finite()
            || bounds.width() <= 0.0
            || bounds.height() <= 0.0
        {
            return Err(PhysicsError::invalid_config(
                "world_bounds must be finite with positive extent",
            ));
        }
        if self.quadtree.max_objects == 0 {
            return Err(PhysicsError::invalid_config(
                "quadtree.max_objects must be at least 1",
            ));
        }
        Ok(())
    }
}
