use std::fmt::Debug;

use crate::objects::{BodyHandle, RigidBody};

pub mod angular_velocity_constraint;
pub mod axis_constraint;
pub mod spring_constraint;

pub use angular_velocity_constraint::AngularVelocityConstraint;
pub use axis_constraint::AxisConstraint;
pub use spring_constraint::SpringConstraint;

/// Kind of a constraint, for callers that draw or inspect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Axis,
    AngularVelocity,
    Spring,
}

/// A per-step corrective rule applied after integration, independently of
/// contact solving.
pub trait Constraint: Debug {
    /// Applies the constraint to the bodies it references.
    fn apply(&self, bodies: &mut [RigidBody], dt: f64);

    fn kind(&self) -> ConstraintKind;

    /// The constrained body, and the second body for two-body constraints.
    fn bodies(&self) -> (BodyHandle, Option<BodyHandle>);
}
