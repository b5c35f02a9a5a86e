//! The simulation driver.
//!
//! [`PhysicsWorld`] owns the bodies, constraints and broad phase. Each fixed
//! step integrates bodies, applies constraints, then runs up to
//! `collision_iterations` passes of broad phase, narrow phase and contact
//! resolution, stopping early once a pass finds no contacts.
//! [`PhysicsWorld::update`] feeds variable frame times into fixed steps.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::contact_solver::resolve_manifold;
use crate::collision::{
    check_collision, BodyPair, BroadPhase, BroadPhaseEntry, BroadPhaseMethod, CollisionManifold,
    AABB,
};
use crate::common::Material;
use crate::config::SimulationConfig;
use crate::constraints::{AngularVelocityConstraint, AxisConstraint, Constraint, SpringConstraint};
use crate::error::{PhysicsError, Result};
use crate::integration::integrate;
use crate::math::vec2::Vec2;
use crate::objects::{BodyDesc, BodyHandle, RigidBody};
use crate::shapes::{Circle, Polygon, Shape};

/// Owns every body and constraint and advances them with a fixed time step.
///
/// Bodies are append-only: a [`BodyHandle`] returned by a factory stays valid
/// for the lifetime of the world.
#[derive(Debug)]
pub struct PhysicsWorld {
    config: SimulationConfig,
    bodies: Vec<RigidBody>,
    constraints: Vec<Box<dyn Constraint>>,
    broad_phase: BroadPhase,
    // Per-pass buffers, reused across steps.
    entries: Vec<BroadPhaseEntry>,
    pairs: Vec<BodyPair>,
    manifolds: Vec<CollisionManifold>,
    accumulator: f64,
}

impl PhysicsWorld {
    /// Creates an empty world after validating `config`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let broad_phase = BroadPhase::new(
            config.broad_phase,
            config.world_bounds,
            config.quadtree,
            config.hash_grid_cell_size,
        )?;
        debug!(
            dt = config.fixed_time_step,
            iterations = config.collision_iterations,
            broad_phase = ?config.broad_phase,
            "physics world created"
        );
        Ok(Self {
            config,
            bodies: Vec::new(),
            constraints: Vec::new(),
            broad_phase,
            entries: Vec::new(),
            pairs: Vec::new(),
            manifolds: Vec::new(),
            accumulator: 0.0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    // ---- Bodies ----

    /// Adds an already built body and returns its handle.
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len());
        debug!(
            handle = handle.index(),
            kind = ?body.kind(),
            mass = body.mass(),
            position = ?body.position(),
            "body added"
        );
        self.bodies.push(body);
        handle
    }

    /// Adds a body of the given shape.
    pub fn add_shape(&mut self, shape: Shape, material: Arc<Material>, desc: &BodyDesc) -> Result<BodyHandle> {
        let body = RigidBody::new(shape, material, desc)?;
        Ok(self.add_body(body))
    }

    pub fn add_circle(&mut self, desc: &BodyDesc, material: Arc<Material>, radius: f64) -> Result<BodyHandle> {
        self.add_shape(Shape::Circle(Circle::new(radius)?), material, desc)
    }

    /// Adds an axis-aligned box (in its local frame) of full size `size`.
    pub fn add_box(&mut self, desc: &BodyDesc, material: Arc<Material>, size: Vec2) -> Result<BodyHandle> {
        self.add_shape(Shape::Polygon(Polygon::rectangle(size.x, size.y)?), material, desc)
    }

    /// Adds a convex polygon with vertices given in the body's local frame.
    pub fn add_polygon(
        &mut self,
        desc: &BodyDesc,
        material: Arc<Material>,
        vertices: Vec<Vec2>,
    ) -> Result<BodyHandle> {
        self.add_shape(Shape::Polygon(Polygon::new(vertices)?), material, desc)
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.index())
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.index())
    }

    fn check_handle(&self, handle: BodyHandle) -> Result<()> {
        if handle.index() < self.bodies.len() {
            Ok(())
        } else {
            Err(PhysicsError::InvalidBodyHandle(handle.index()))
        }
    }

    // ---- Constraints ----

    /// Adds any constraint after checking the bodies it references.
    pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>) -> Result<()> {
        let (first, second) = constraint.bodies();
        self.check_handle(first)?;
        if let Some(second) = second {
            self.check_handle(second)?;
            if second == first {
                return Err(PhysicsError::SelfConstraint(first.index()));
            }
        }
        debug!(kind = ?constraint.kind(), body = first.index(), "constraint added");
        self.constraints.push(constraint);
        Ok(())
    }

    /// Pins the selected axes of `body` at its current position.
    pub fn add_axis_constraint(&mut self, body: BodyHandle, lock_x: bool, lock_y: bool) -> Result<()> {
        let position = self
            .body(body)
            .map(RigidBody::position)
            .ok_or(PhysicsError::InvalidBodyHandle(body.index()))?;
        let constraint = AxisConstraint::new(
            body,
            lock_x.then_some(position.x),
            lock_y.then_some(position.y),
        );
        self.add_constraint(Box::new(constraint))
    }

    pub fn add_angular_velocity_constraint(&mut self, body: BodyHandle, angular_velocity: f64) -> Result<()> {
        if !angular_velocity.is_finite() {
            return Err(PhysicsError::invalid_config("angular velocity must be finite"));
        }
        self.add_constraint(Box::new(AngularVelocityConstraint::new(body, angular_velocity)))
    }

    /// Connects two bodies with a spring between local anchor points.
    pub fn add_spring_constraint(
        &mut self,
        body_a: BodyHandle,
        body_b: BodyHandle,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
        rest_length: f64,
        stiffness: f64,
    ) -> Result<()> {
        if !(rest_length.is_finite() && rest_length >= 0.0) {
            return Err(PhysicsError::invalid_config(format!(
                "spring rest length must be finite and non-negative, got {rest_length}"
            )));
        }
        if !(stiffness.is_finite() && stiffness >= 0.0) {
            return Err(PhysicsError::invalid_config(format!(
                "spring stiffness must be finite and non-negative, got {stiffness}"
            )));
        }
        if !(local_anchor_a.is_finite() && local_anchor_b.is_finite()) {
            return Err(PhysicsError::invalid_config("spring anchors must be finite"));
        }
        self.add_constraint(Box::new(SpringConstraint::new(
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            rest_length,
            stiffness,
        )))
    }

    pub fn constraints(&self) -> impl Iterator<Item = &dyn Constraint> + '_ {
        self.constraints.iter().map(|c| c.as_ref())
    }

    // ---- Broad phase ----

    pub fn broad_phase_method(&self) -> BroadPhaseMethod {
        self.broad_phase.method()
    }

    pub fn set_broad_phase_method(&mut self, method: BroadPhaseMethod) {
        self.broad_phase.set_method(method);
        self.config.broad_phase = method;
    }

    pub fn set_hash_grid_cell_size(&mut self, cell_size: f64) -> Result<()> {
        self.broad_phase.set_cell_size(cell_size)?;
        self.config.hash_grid_cell_size = cell_size;
        Ok(())
    }

    pub fn broad_phase(&self) -> &BroadPhase {
        &self.broad_phase
    }

    pub fn broad_phase_mut(&mut self) -> &mut BroadPhase {
        &mut self.broad_phase
    }

    /// Bounds of every active quadtree node as of the last quadtree rebuild.
    pub fn quadtree_bounds(&self) -> Vec<AABB> {
        self.broad_phase.quadtree().node_bounds()
    }

    /// Hash grid cell bounds: only occupied cells, or every cell covering the
    /// world bounds.
    pub fn hash_grid_bounds(&self, only_active: bool) -> Vec<AABB> {
        let grid = self.broad_phase.grid();
        if only_active {
            grid.active_cell_bounds()
        } else {
            grid.all_cell_bounds(&self.config.world_bounds)
        }
    }

    /// Rebuilds the active broad phase from the current body state and returns
    /// the candidate pairs.
    pub fn candidate_pairs(&mut self) -> &[BodyPair] {
        self.collect_pairs();
        &self.pairs
    }

    /// Manifolds found by the last detection pass.
    pub fn manifolds(&self) -> &[CollisionManifold] {
        &self.manifolds
    }

    // ---- Stepping ----

    /// Feeds `dt` seconds of wall-clock time to the fixed-step accumulator and
    /// runs the resulting steps. Returns the number of steps executed.
    ///
    /// At most `max_steps_per_frame` steps run; time beyond that is dropped.
    pub fn update(&mut self, dt: f64) -> usize {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        let fixed = self.config.fixed_time_step;
        let max_steps = self.config.max_steps_per_frame;

        self.accumulator += dt;
        let available = (self.accumulator / fixed).floor();
        let steps = if available >= max_steps as f64 {
            if available > max_steps as f64 {
                warn!(
                    requested = available,
                    max_steps, "simulation falling behind, dropping accumulated time"
                );
            }
            self.accumulator %= fixed;
            max_steps
        } else {
            let steps = available as usize;
            self.accumulator -= steps as f64 * fixed;
            steps
        };

        for _ in 0..steps {
            self.step();
        }
        trace!(steps, remainder = self.accumulator, "update");
        steps
    }

    /// Time accumulated but not yet simulated.
    pub fn accumulated_time(&self) -> f64 {
        self.accumulator
    }

    /// Runs one fixed step: integration, constraints, then up to
    /// `collision_iterations` detect/solve passes.
    pub fn step(&mut self) {
        let dt = self.config.fixed_time_step;
        let gravity = self.config.gravity;

        for body in &mut self.bodies {
            integrate(body, gravity, dt);
        }
        for constraint in &self.constraints {
            constraint.apply(&mut self.bodies, dt);
        }

        for pass in 0..self.config.collision_iterations {
            self.detect_collisions();
            trace!(pass, manifolds = self.manifolds.len(), "detection pass");
            if self.manifolds.is_empty() {
                break;
            }
            for manifold in &self.manifolds {
                resolve_manifold(&mut self.bodies, manifold);
            }
        }
    }

    fn collect_pairs(&mut self) {
        self.entries.clear();
        for (index, body) in self.bodies.iter_mut().enumerate() {
            let aabb = body.aabb();
            self.entries
                .push(BroadPhaseEntry::new(BodyHandle(index), aabb, body.is_static()));
        }
        self.broad_phase.collect_pairs(&self.entries, &mut self.pairs);
    }

    /// Broad phase then narrow phase over fresh caches; fills `self.manifolds`.
    fn detect_collisions(&mut self) {
        for body in &mut self.bodies {
            body.transformed_vertices();
        }
        self.collect_pairs();

        self.manifolds.clear();
        for pair in &self.pairs {
            let body_a = &self.bodies[pair.a.index()];
            let body_b = &self.bodies[pair.b.index()];
            if let Some(manifold) = check_collision(pair.a, body_a, pair.b, body_b) {
                self.manifolds.push(manifold);
            }
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        let config = SimulationConfig::default();
        let broad_phase = match BroadPhase::new(
            config.broad_phase,
            config.world_bounds,
            config.quadtree,
            config.hash_grid_cell_size,
        ) {
            Ok(broad_phase) => broad_phase,
            Err(err) => unreachable!("default configuration is valid: {err}"),
        };
        Self {
            config,
            bodies: Vec::new(),
            constraints: Vec::new(),
            broad_phase,
            entries: Vec::new(),
            pairs: Vec::new(),
            manifolds: Vec::new(),
            accumulator: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintKind;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-9;

    fn material() -> Arc<Material> {
        Arc::new(Material::default())
    }

    fn world_with(config: SimulationConfig) -> PhysicsWorld {
        PhysicsWorld::new(config).unwrap()
    }

    fn dynamic(x: f64, y: f64) -> BodyDesc {
        BodyDesc::new(Vec2::new(x, y)).with_mass(1.0, 0.1)
    }

    #[test]
    fn test_world_new() {
        let world = PhysicsWorld::default();
        assert!(world.bodies().is_empty());
        assert_eq!(world.constraints().count(), 0);
        assert!(world.manifolds().is_empty());
        assert_eq!(world.broad_phase_method(), BroadPhaseMethod::SpatialHashGrid);
        assert_eq!(world.config(), &SimulationConfig::default());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimulationConfig::default().with_fixed_time_step(0.0);
        assert!(matches!(PhysicsWorld::new(config), Err(PhysicsError::InvalidTimestep(_))));
    }

    #[test]
    fn test_factories_return_sequential_handles() {
        let mut world = PhysicsWorld::default();
        let a = world.add_circle(&dynamic(0.0, 0.0), material(), 0.1).unwrap();
        let b = world.add_box(&BodyDesc::default(), material(), Vec2::new(1.0, 0.2)).unwrap();
        let c = world
            .add_polygon(
                &dynamic(1.0, 1.0),
                material(),
                vec![Vec2::new(0.0, 0.1), Vec2::new(-0.1, -0.1), Vec2::new(0.1, -0.1)],
            )
            .unwrap();

        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));
        assert_eq!(world.bodies().len(), 3);
        assert!(world.body(b).unwrap().is_static());
        assert_eq!(world.body(c).unwrap().position(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_factory_errors() {
        let mut world = PhysicsWorld::default();
        assert!(matches!(
            world.add_circle(&dynamic(0.0, 0.0), material(), -1.0),
            Err(PhysicsError::InvalidGeometry { .. })
        ));
        assert!(world.add_box(&dynamic(0.0, 0.0), material(), Vec2::new(0.0, 1.0)).is_err());
        assert!(world
            .add_polygon(&dynamic(0.0, 0.0), material(), vec![Vec2::ZERO, Vec2::new(1.0, 0.0)])
            .is_err());
        assert!(world.bodies().is_empty());
    }

    #[test]
    fn test_density_derives_mass() {
        let mut world = PhysicsWorld::default();
        let handle = world
            .add_box(
                &BodyDesc::new(Vec2::ZERO).with_density(2.0),
                material(),
                Vec2::new(1.0, 0.5),
            )
            .unwrap();
        let body = world.body(handle).unwrap();
        assert_relative_eq!(body.mass(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(body.inertia(), (1.0 + 0.25) / 12.0, epsilon = EPSILON);
    }

    #[test]
    fn test_step_gravity() {
        let config = SimulationConfig::default()
            .with_fixed_time_step(0.1)
            .with_gravity(Vec2::new(0.0, -10.0));
        let mut world = world_with(config);
        let handle = world.add_circle(&dynamic(0.0, 0.0), material(), 0.1).unwrap();

        world.step();
        let body = world.body(handle).unwrap();
        assert_relative_eq!(body.velocity.y, -1.0, epsilon = EPSILON);
        assert_relative_eq!(body.position().y, -0.1, epsilon = EPSILON);
        assert_relative_eq!(body.position().x, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_step_no_gravity_on_static() {
        let mut world = PhysicsWorld::default();
        let handle = world.add_circle(&BodyDesc::new(Vec2::new(0.5, 0.5)), material(), 0.1).unwrap();
        for _ in 0..10 {
            world.step();
        }
        let body = world.body(handle).unwrap();
        assert_eq!(body.position(), Vec2::new(0.5, 0.5));
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_update_runs_whole_steps() {
        let config = SimulationConfig::default().with_fixed_time_step(0.25).zero_gravity();
        let mut world = world_with(config);
        assert_eq!(world.update(1.0), 4);
        assert_eq!(world.accumulated_time(), 0.0);
        assert_eq!(world.update(0.125), 0);
        assert_eq!(world.update(0.125), 1);
        assert_eq!(world.accumulated_time(), 0.0);
    }

    #[test]
    fn test_update_caps_steps_and_drops_excess() {
        let config = SimulationConfig::default()
            .with_fixed_time_step(0.25)
            .with_max_steps_per_frame(2)
            .zero_gravity();
        let mut world = world_with(config);
        let handle = world
            .add_circle(&dynamic(0.0, 0.0).with_velocity(Vec2::new(1.0, 0.0)), material(), 0.1)
            .unwrap();

        assert_eq!(world.update(10.125), 2);
        assert_eq!(world.accumulated_time(), 0.125);
        assert_relative_eq!(world.body(handle).unwrap().position().x, 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_update_ignores_bad_dt() {
        let mut world = PhysicsWorld::default();
        assert_eq!(world.update(0.0), 0);
        assert_eq!(world.update(-1.0), 0);
        assert_eq!(world.update(f64::NAN), 0);
        assert_eq!(world.update(f64::INFINITY), 0);
        assert_eq!(world.accumulated_time(), 0.0);
    }

    #[test]
    fn test_constraint_validation() {
        let mut world = PhysicsWorld::default();
        let a = world.add_circle(&dynamic(0.0, 0.0), material(), 0.1).unwrap();
        let b = world.add_circle(&dynamic(1.0, 0.0), material(), 0.1).unwrap();
        let unknown = BodyHandle(7);

        assert_eq!(
            world.add_axis_constraint(unknown, true, true),
            Err(PhysicsError::InvalidBodyHandle(7))
        );
        assert_eq!(
            world.add_spring_constraint(a, a, Vec2::ZERO, Vec2::ZERO, 1.0, 1.0),
            Err(PhysicsError::SelfConstraint(0))
        );
        assert!(world
            .add_spring_constraint(a, b, Vec2::ZERO, Vec2::ZERO, -1.0, 1.0)
            .is_err());
        assert!(world.add_angular_velocity_constraint(a, f64::NAN).is_err());
        assert_eq!(world.constraints().count(), 0);

        world.add_spring_constraint(a, b, Vec2::ZERO, Vec2::ZERO, 1.0, 10.0).unwrap();
        world.add_angular_velocity_constraint(b, 2.0).unwrap();
        let kinds: Vec<_> = world.constraints().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![ConstraintKind::Spring, ConstraintKind::AngularVelocity]);
        assert_eq!(world.constraints().next().unwrap().bodies(), (a, Some(b)));
    }

    #[test]
    fn test_axis_constraint_pins_body_under_gravity() {
        let mut world = PhysicsWorld::default();
        let handle = world
            .add_box(&dynamic(0.2, 0.5).with_angular_velocity(1.0), material(), Vec2::new(0.5, 0.1))
            .unwrap();
        world.add_axis_constraint(handle, true, true).unwrap();
        for _ in 0..30 {
            world.step();
        }
        let body = world.body(handle).unwrap();
        assert_eq!(body.position(), Vec2::new(0.2, 0.5));
        assert_eq!(body.velocity, Vec2::ZERO);
        assert!(body.rotation() > 0.0);
    }

    #[test]
    fn test_motor_keeps_spinning() {
        let mut world = PhysicsWorld::default();
        let handle = world.add_box(&dynamic(0.0, 0.0), material(), Vec2::new(0.5, 0.1)).unwrap();
        world.add_axis_constraint(handle, true, true).unwrap();
        world.add_angular_velocity_constraint(handle, 3.0).unwrap();
        world.step();
        let body = world.body(handle).unwrap();
        assert_eq!(body.angular_velocity, 3.0);
        assert_relative_eq!(body.rotation(), 0.0, epsilon = EPSILON);
        world.step();
        assert_relative_eq!(
            world.body(handle).unwrap().rotation(),
            3.0 * world.config().fixed_time_step,
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_candidate_pairs_follow_method() {
        let mut world = PhysicsWorld::default();
        world.add_circle(&dynamic(0.0, 0.0), material(), 0.1).unwrap();
        world.add_circle(&dynamic(0.15, 0.0), material(), 0.1).unwrap();
        world.add_circle(&dynamic(2.0, 2.0), material(), 0.1).unwrap();
        world.add_box(&BodyDesc::new(Vec2::new(0.0, -0.5)), material(), Vec2::new(2.0, 0.2)).unwrap();
        world.add_box(&BodyDesc::new(Vec2::new(0.5, -0.5)), material(), Vec2::new(2.0, 0.2)).unwrap();

        for method in [
            BroadPhaseMethod::BruteForce,
            BroadPhaseMethod::Quadtree,
            BroadPhaseMethod::SpatialHashGrid,
        ] {
            world.set_broad_phase_method(method);
            let pairs = world.candidate_pairs().to_vec();
            assert_eq!(pairs, vec![BodyPair::new(BodyHandle(0), BodyHandle(1))], "{method:?}");
        }
        assert_eq!(world.config().broad_phase, BroadPhaseMethod::SpatialHashGrid);
    }

    #[test]
    fn test_debug_bounds() {
        let mut world = PhysicsWorld::default();
        world.set_hash_grid_cell_size(1.0).unwrap();
        assert!(world.set_hash_grid_cell_size(0.0).is_err());
        assert_eq!(world.config().hash_grid_cell_size, 1.0);

        world.add_circle(&dynamic(0.5, 0.5), material(), 0.1).unwrap();
        world.candidate_pairs();
        assert_eq!(world.hash_grid_bounds(true).len(), 1);
        // Cells -3..=3 on both axes.
        assert_eq!(world.hash_grid_bounds(false).len(), 49);

        world.set_broad_phase_method(BroadPhaseMethod::Quadtree);
        world.candidate_pairs();
        assert_eq!(world.quadtree_bounds(), vec![world.config().world_bounds]);
    }

    #[test]
    fn test_step_records_manifolds() {
        let config = SimulationConfig::default().zero_gravity().with_collision_iterations(1);
        let mut world = world_with(config);
        world.add_circle(&dynamic(0.0, 0.0), material(), 0.1).unwrap();
        world.add_circle(&dynamic(0.15, 0.0), material(), 0.1).unwrap();
        world.step();

        assert_eq!(world.manifolds().len(), 1);
        let manifold = world.manifolds()[0];
        assert_eq!((manifold.body_a.index(), manifold.body_b.index()), (0, 1));
        assert_relative_eq!(manifold.normal.x, 1.0, epsilon = EPSILON);
        let distance = world.bodies()[0].position().distance(world.bodies()[1].position());
        assert_relative_eq!(distance, 0.2, epsilon = EPSILON);
    }
}
