//! Discrete-time 2D rigid-body physics for circles and convex polygons.
//!
//! A [`PhysicsWorld`] owns bodies and constraints and advances them with a
//! fixed time step: semi-implicit Euler integration, per-step constraints,
//! then repeated broad phase (brute force, quadtree or spatial hash grid),
//! narrow phase (SAT) and sequential-impulse contact solving with friction.
//!
//! ```
//! use std::sync::Arc;
//! use rigid2d::{BodyDesc, Material, PhysicsWorld, SimulationConfig, Vec2};
//!
//! let mut world = PhysicsWorld::new(SimulationConfig::default()).unwrap();
//! let ground = Arc::new(Material::new(0.5, 0.4, 0.3));
//! world
//!     .add_box(&BodyDesc::new(Vec2::new(0.0, -1.0)), ground.clone(), Vec2::new(4.0, 0.2))
//!     .unwrap();
//! let ball = world
//!     .add_circle(&BodyDesc::new(Vec2::new(0.0, 0.0)).with_density(1.0), ground, 0.1)
//!     .unwrap();
//!
//! let steps = world.update(1.0 / 60.0);
//! assert!(steps > 0);
//! assert!(world.body(ball).unwrap().velocity.y < 0.0);
//! ```

pub mod collision;
pub mod common;
pub mod config;
pub mod constraints;
pub mod error;
pub mod integration;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod world;

// Re-export key types for easier use
pub use collision::{BroadPhaseMethod, CollisionManifold, AABB};
pub use common::Material;
pub use config::{QuadtreeConfig, SimulationConfig};
pub use constraints::{
    AngularVelocityConstraint, AxisConstraint, Constraint, ConstraintKind, SpringConstraint,
};
pub use error::{PhysicsError, Result};
pub use math::{Transform, Vec2};
pub use objects::{BodyDesc, BodyHandle, RigidBody};
pub use shapes::{Circle, MassProperties, Polygon, Shape, ShapeKind};
pub use world::PhysicsWorld;
