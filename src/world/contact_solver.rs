//! Sequential-impulse contact resolution for a single manifold.
//!
//! Each call runs three stages on the manifold's two bodies: normal impulses,
//! friction impulses, then positional depenetration along the normal. Impulses
//! of a two-point manifold are averaged over the approaching contacts.

use crate::collision::manifold::{CollisionManifold, MAX_CONTACTS};
use crate::math::vec2::Vec2;
use crate::objects::{body_pair_mut, RigidBody};

/// Tangents shorter than this (squared) carry no friction.
const MIN_TANGENT_SQUARED: f64 = 1e-16;

/// Per-contact data gathered by the normal stage and reused for friction.
#[derive(Debug, Clone, Copy, Default)]
struct ContactImpulse {
    point: Vec2,
    r_a: Vec2,
    r_b: Vec2,
    normal_impulse: f64,
}

/// Velocity of B relative to A at the lever arms `r_a` and `r_b`.
fn relative_velocity(a: &RigidBody, b: &RigidBody, r_a: Vec2, r_b: Vec2) -> Vec2 {
    let v_a = a.velocity + r_a.perpendicular() * a.angular_velocity;
    let v_b = b.velocity + r_b.perpendicular() * b.angular_velocity;
    v_b - v_a
}

/// Effective inverse mass of the pair along `direction`.
fn effective_inverse_mass(a: &RigidBody, b: &RigidBody, r_a: Vec2, r_b: Vec2, direction: Vec2) -> f64 {
    let ra_n = r_a.cross(direction);
    let rb_n = r_b.cross(direction);
    a.inv_mass() + b.inv_mass() + ra_n * ra_n * a.inv_inertia() + rb_n * rb_n * b.inv_inertia()
}

/// Resolves one manifold in place. Manifolds naming an unknown body, or the
/// same body twice, are ignored.
pub fn resolve_manifold(bodies: &mut [RigidBody], manifold: &CollisionManifold) {
    let Some((a, b)) = body_pair_mut(bodies, manifold.body_a, manifold.body_b) else {
        return;
    };
    resolve_velocities(a, b, manifold);
    separate(a, b, manifold.normal * manifold.depth);
}

fn resolve_velocities(a: &mut RigidBody, b: &mut RigidBody, manifold: &CollisionManifold) {
    let normal = manifold.normal;
    let restitution = 1.0 + a.material().combined_elasticity(b.material());
    let (static_friction, dynamic_friction) = a.material().combined_friction(b.material());

    let com_a = a.center_of_mass();
    let com_b = b.center_of_mass();

    let mut contacts = [ContactImpulse::default(); MAX_CONTACTS];
    let mut count = 0;
    for &point in manifold.contacts() {
        let r_a = point - com_a;
        let r_b = point - com_b;
        let velocity_along_normal = relative_velocity(a, b, r_a, r_b).dot(normal);
        if velocity_along_normal > 0.0 {
            continue;
        }
        let denominator = effective_inverse_mass(a, b, r_a, r_b, normal);
        if denominator <= 0.0 {
            continue;
        }
        contacts[count] = ContactImpulse {
            point,
            r_a,
            r_b,
            normal_impulse: -restitution * velocity_along_normal / denominator,
        };
        count += 1;
    }
    if count == 0 {
        return;
    }
    let contacts = &contacts[..count];
    let share = 1.0 / count as f64;

    for contact in contacts {
        let impulse = normal * (contact.normal_impulse * share);
        a.apply_impulse_at(-impulse, contact.point);
        b.apply_impulse_at(impulse, contact.point);
    }

    // All friction impulses are computed from the post-normal velocities
    // before any of them is applied.
    let mut friction = [Vec2::ZERO; MAX_CONTACTS];
    for (slot, contact) in friction.iter_mut().zip(contacts) {
        let relative = relative_velocity(a, b, contact.r_a, contact.r_b);
        let tangent = relative - normal * relative.dot(normal);
        if tangent.magnitude_squared() < MIN_TANGENT_SQUARED {
            continue;
        }
        let tangent = tangent.normalize();
        let denominator = effective_inverse_mass(a, b, contact.r_a, contact.r_b, tangent);
        if denominator <= 0.0 {
            continue;
        }
        let jt = -relative.dot(tangent) / denominator;
        let jn = contact.normal_impulse;
        *slot = if jt.abs() <= jn * static_friction {
            tangent * jt
        } else {
            tangent * (-jn * dynamic_friction)
        };
    }

    for (impulse, contact) in friction.iter().zip(contacts) {
        let impulse = *impulse * share;
        a.apply_impulse_at(-impulse, contact.point);
        b.apply_impulse_at(impulse, contact.point);
    }
}

/// Moves the bodies apart by `displacement` (the normal scaled by the depth),
/// all of it on the dynamic side when the other body is static.
fn separate(a: &mut RigidBody, b: &mut RigidBody, displacement: Vec2) {
    if a.is_static() {
        b.translate(displacement);
    } else if b.is_static() {
        a.translate(-displacement);
    } else {
        let ratio = a.mass() / (a.mass() + b.mass());
        a.translate(displacement * -(1.0 - ratio));
        b.translate(displacement * ratio);
    }
}
