use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;

/// Advances a body by `dt` with semi-implicit Euler: gravity updates the
/// velocity first, then the new velocity moves the body. Static bodies are
/// left untouched.
pub fn integrate(body: &mut RigidBody, gravity: Vec2, dt: f64) {
    if body.is_static() {
        return;
    }

    body.velocity += gravity * dt;
    let shift = body.velocity * dt;
    let turn = body.angular_velocity * dt;
    body.move_and_rotate(shift, turn);

    let wrapped = wrap_angle(body.rotation());
    if wrapped != body.rotation() {
        body.set_rotation(wrapped);
    }
}

/// Wraps an angle in radians to [-PI, PI].
fn wrap_angle(angle: f64) -> f64 {
    angle.sin().atan2(angle.cos())
}
