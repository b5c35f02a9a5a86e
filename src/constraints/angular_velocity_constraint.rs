use super::{Constraint, ConstraintKind};
use crate::objects::{BodyHandle, RigidBody};

/// Drives a body at a constant angular velocity (a motor).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularVelocityConstraint {
    pub body: BodyHandle,
    pub angular_velocity: f64,
}

impl AngularVelocityConstraint {
    pub fn new(body: BodyHandle, angular_velocity: f64) -> Self {
        Self {
            body,
            angular_velocity,
        }
    }
}

impl Constraint for AngularVelocityConstraint {
    fn apply(&self, bodies: &mut [RigidBody], _dt: f64) {
        if let Some(body) = bodies.get_mut(self.body.index()) {
            body.angular_velocity = self.angular_velocity;
        }
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::AngularVelocity
    }

    fn bodies(&self) -> (BodyHandle, Option<BodyHandle>) {
        (self.body, None)
    }
}
