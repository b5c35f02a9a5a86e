use super::{Constraint, ConstraintKind};
use crate::math::vec2::Vec2;
use crate::objects::{body_pair_mut, BodyHandle, RigidBody};

/// Hookean spring between two anchor points given in each body's local frame.
///
/// Each step both anchors receive an impulse of `(rest_length - distance) *
/// stiffness * dt` along the line between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConstraint {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub rest_length: f64,
    pub stiffness: f64,
}

impl SpringConstraint {
    pub fn new(
        body_a: BodyHandle,
        body_b: BodyHandle,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
        rest_length: f64,
        stiffness: f64,
    ) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            rest_length,
            stiffness,
        }
    }

    /// World positions of both anchors.
    pub fn world_anchors(&self, bodies: &[RigidBody]) -> Option<(Vec2, Vec2)> {
        let a = bodies.get(self.body_a.index())?;
        let b = bodies.get(self.body_b.index())?;
        Some((
            a.transform().apply(self.local_anchor_a),
            b.transform().apply(self.local_anchor_b),
        ))
    }
}

impl Constraint for SpringConstraint {
    fn apply(&self, bodies: &mut [RigidBody], dt: f64) {
        let Some((a, b)) = body_pair_mut(bodies, self.body_a, self.body_b) else {
            return;
        };
        let anchor_a = a.transform().apply(self.local_anchor_a);
        let anchor_b = b.transform().apply(self.local_anchor_b);

        let delta = anchor_b - anchor_a;
        let distance = delta.magnitude();
        if distance == 0.0 {
            return;
        }

        let direction = delta / distance;
        let impulse = direction * ((self.rest_length - distance) * self.stiffness * dt);
        a.apply_impulse_at(-impulse, anchor_a);
        b.apply_impulse_at(impulse, anchor_b);
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Spring
    }

    fn bodies(&self) -> (BodyHandle, Option<BodyHandle>) {
        (self.body_a, Some(self.body_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Material;
    use crate::objects::BodyDesc;
    use crate::shapes::{Circle, Shape};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    const EPSILON: f64 = 1e-12;

    fn ball(x: f64, mass: f64) -> RigidBody {
        RigidBody::new(
            Shape::Circle(Circle::new(0.1).unwrap()),
            Arc::new(Material::default()),
            &BodyDesc::new(Vec2::new(x, 0.0)).with_mass(mass, 0.01),
        )
        .unwrap()
    }

    #[test]
    fn test_stretched_spring_pulls_bodies_together() {
        let mut bodies = vec![ball(0.0, 1.0), ball(2.0, 1.0)];
        let spring = SpringConstraint::new(BodyHandle(0), BodyHandle(1), Vec2::ZERO, Vec2::ZERO, 1.0, 100.0);
        spring.apply(&mut bodies, 0.01);

        // (1 - 2) * 100 * 0.01 = -1 along +x
        assert_relative_eq!(bodies[0].velocity.x, 1.0, epsilon = EPSILON);
        assert_relative_eq!(bodies[1].velocity.x, -1.0, epsilon = EPSILON);
        // Anchors at the centers produce no spin.
        assert_eq!(bodies[0].angular_velocity, 0.0);
    }

    #[test]
    fn test_compressed_spring_pushes_apart() {
        let mut bodies = vec![ball(0.0, 1.0), ball(0.5, 2.0)];
        let spring = SpringConstraint::new(BodyHandle(0), BodyHandle(1), Vec2::ZERO, Vec2::ZERO, 1.0, 10.0);
        spring.apply(&mut bodies, 0.1);
        assert_relative_eq!(bodies[0].velocity.x, -0.5, epsilon = EPSILON);
        assert_relative_eq!(bodies[1].velocity.x, 0.25, epsilon = EPSILON);
    }

    #[test]
    fn test_spring_against_static_body() {
        let mut bodies = vec![ball(0.0, 0.0), ball(0.0, 1.0)];
        bodies[1].set_position(Vec2::new(0.0, -1.5));
        let spring = SpringConstraint::new(BodyHandle(0), BodyHandle(1), Vec2::ZERO, Vec2::ZERO, 1.0, 50.0);
        spring.apply(&mut bodies, 0.02);
        assert_eq!(bodies[0].velocity, Vec2::ZERO);
        // (1 - 1.5) * 50 * 0.02 = -0.5 along -y, i.e. +0.5 upward
        assert_relative_eq!(bodies[1].velocity.y, 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_offset_anchor_spins_body() {
        let mut bodies = vec![ball(0.0, 0.0), ball(1.0, 1.0)];
        let spring = SpringConstraint::new(
            BodyHandle(0),
            BodyHandle(1),
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.1),
            0.5,
            10.0,
        );
        spring.apply(&mut bodies, 0.1);
        assert!(bodies[1].angular_velocity != 0.0);
        let (a, b) = spring.world_anchors(&bodies).unwrap();
        assert_eq!(a, Vec2::new(0.0, 1.0));
        assert_eq!(b, Vec2::new(1.0, 0.1));
    }

    #[test]
    fn test_coincident_anchors_do_nothing() {
        let mut bodies = vec![ball(0.0, 1.0), ball(0.0, 1.0)];
        let spring = SpringConstraint::new(BodyHandle(0), BodyHandle(1), Vec2::ZERO, Vec2::ZERO, 1.0, 10.0);
        spring.apply(&mut bodies, 0.1);
        assert_eq!(bodies[0].velocity, Vec2::ZERO);
        assert_eq!(bodies[1].velocity, Vec2::ZERO);
    }
}
