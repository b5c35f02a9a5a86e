use super::{Constraint, ConstraintKind};
use crate::math::vec2::Vec2;
use crate::objects::{BodyHandle, RigidBody};

/// Pins one or both position axes of a body to a fixed coordinate and zeroes
/// the matching velocity component. Rotation stays free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConstraint {
    pub body: BodyHandle,
    pub locked_x: Option<f64>,
    pub locked_y: Option<f64>,
}

impl AxisConstraint {
    pub fn new(body: BodyHandle, locked_x: Option<f64>, locked_y: Option<f64>) -> Self {
        Self {
            body,
            locked_x,
            locked_y,
        }
    }

    /// Moves the pin of every locked axis to the matching coordinate of `position`.
    #[must_use]
    pub fn with_locked_position(mut self, position: Vec2) -> Self {
        if self.locked_x.is_some() {
            self.locked_x = Some(position.x);
        }
        if self.locked_y.is_some() {
            self.locked_y = Some(position.y);
        }
        self
    }
}

impl Constraint for AxisConstraint {
    fn apply(&self, bodies: &mut [RigidBody], _dt: f64) {
        let Some(body) = bodies.get_mut(self.body.index()) else {
            return;
        };
        let mut position = body.position();
        if let Some(x) = self.locked_x {
            position.x = x;
            body.velocity.x = 0.0;
        }
        if let Some(y) = self.locked_y {
            position.y = y;
            body.velocity.y = 0.0;
        }
        if position != body.position() {
            body.set_position(position);
        }
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Axis
    }

    fn bodies(&self) -> (BodyHandle, Option<BodyHandle>) {
        (self.body, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Material;
    use crate::objects::BodyDesc;
    use crate::shapes::{Polygon, Shape};
    use std::sync::Arc;

    fn spinning_box() -> RigidBody {
        RigidBody::new(
            Shape::Polygon(Polygon::rectangle(1.0, 0.2).unwrap()),
            Arc::new(Material::default()),
            &BodyDesc::new(Vec2::new(0.3, 0.4))
                .with_mass(1.0, 1.0)
                .with_velocity(Vec2::new(2.0, -3.0))
                .with_angular_velocity(1.5),
        )
        .unwrap()
    }

    #[test]
    fn test_axis_constraint_locks_both_axes() {
        let mut bodies = vec![spinning_box()];
        bodies[0].translate(Vec2::new(0.1, -0.2));
        let c = AxisConstraint::new(BodyHandle(0), Some(0.3), Some(0.4));
        c.apply(&mut bodies, 0.01);

        assert_eq!(bodies[0].position(), Vec2::new(0.3, 0.4));
        assert_eq!(bodies[0].velocity, Vec2::ZERO);
        assert_eq!(bodies[0].angular_velocity, 1.5);
    }

    #[test]
    fn test_axis_constraint_single_axis() {
        let mut bodies = vec![spinning_box()];
        let c = AxisConstraint::new(BodyHandle(0), None, Some(0.0));
        c.apply(&mut bodies, 0.01);

        assert_eq!(bodies[0].position(), Vec2::new(0.3, 0.0));
        assert_eq!(bodies[0].velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_with_locked_position_only_touches_locked_axes() {
        let c = AxisConstraint::new(BodyHandle(0), Some(0.0), None)
            .with_locked_position(Vec2::new(5.0, 6.0));
        assert_eq!(c.locked_x, Some(5.0));
        assert_eq!(c.locked_y, None);
        assert_eq!(c.kind(), ConstraintKind::Axis);
        assert_eq!(c.bodies(), (BodyHandle(0), None));
    }

    #[test]
    fn test_unknown_body_is_ignored() {
        let mut bodies = vec![spinning_box()];
        let c = AxisConstraint::new(BodyHandle(3), Some(0.0), Some(0.0));
        c.apply(&mut bodies, 0.01);
        assert_eq!(bodies[0].position(), Vec2::new(0.3, 0.4));
    }
}
