use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::collision::AABB;
use crate::common::Material;
use crate::error::{PhysicsError, Result};
use crate::math::{Transform, Vec2};
use crate::shapes::{MassProperties, Shape, ShapeKind};

/// Stable identifier of a body inside a [`PhysicsWorld`](crate::world::PhysicsWorld).
///
/// Bodies are never removed, so a handle stays valid for the lifetime of the
/// world that issued it. Handles order by creation, which gives candidate
/// pairs a canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyHandle(pub(crate) usize);

impl BodyHandle {
    /// Index of the body in [`PhysicsWorld::bodies`](crate::world::PhysicsWorld::bodies).
    pub fn index(self) -> usize {
        self.0
    }
}

/// Initial state and mass parameters for a new body.
///
/// When `density` is set, mass and inertia are derived from the shape and the
/// explicit `mass`/`inertia` are ignored. A mass of zero makes the body static.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyDesc {
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f64,
    pub angular_velocity: f64,
    pub mass: f64,
    pub inertia: f64,
    pub density: Option<f64>,
}

impl Default for BodyDesc {
    /// A static body at the origin.
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            mass: 0.0,
            inertia: 0.0,
            density: None,
        }
    }
}

impl BodyDesc {
    /// A static body at `position`.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_angular_velocity(mut self, angular_velocity: f64) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Explicit mass and inertia (used when no density is given).
    #[must_use]
    pub fn with_mass(mut self, mass: f64, inertia: f64) -> Self {
        self.mass = mass;
        self.inertia = inertia;
        self
    }

    /// Derive mass properties from the shape's geometry.
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = Some(density);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.position.is_finite()
            || !self.velocity.is_finite()
            || !self.rotation.is_finite()
            || !self.angular_velocity.is_finite()
        {
            return Err(PhysicsError::invalid_config(
                "body state must be finite",
            ));
        }
        let mut checks = vec![("mass", self.mass), ("inertia", self.inertia)];
        if let Some(density) = self.density {
            checks.push(("density", density));
        }
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(PhysicsError::invalid_mass_properties(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// A rigid body: shape, material, kinematic state and mass properties.
///
/// `position` is the origin of the shape's local frame; rotation happens about it.
/// The world-space AABB and, for polygons, the world-space vertex list are
/// cached and recomputed lazily after the body moves.
#[derive(Debug, Clone)]
pub struct RigidBody {
    shape: Shape,
    material: Arc<Material>,

    position: Vec2,
    rotation: f64,
    pub velocity: Vec2,
    pub angular_velocity: f64,

    mass: f64,
    inv_mass: f64,
    inertia: f64,
    inv_inertia: f64,
    local_center_of_mass: Vec2,

    aabb: AABB,
    aabb_dirty: bool,
    world_vertices: Vec<Vec2>,
    vertices_dirty: bool,
}

impl RigidBody {
    /// Builds a body from a shape, a shared material and its initial description.
    pub fn new(shape: Shape, material: Arc<Material>, desc: &BodyDesc) -> Result<Self> {
        desc.validate()?;

        let mut body = Self {
            shape,
            material,
            position: desc.position,
            rotation: desc.rotation,
            velocity: desc.velocity,
            angular_velocity: desc.angular_velocity,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            local_center_of_mass: Vec2::ZERO,
            aabb: AABB::new(desc.position, desc.position),
            aabb_dirty: true,
            world_vertices: Vec::new(),
            vertices_dirty: true,
        };

        let props = match desc.density {
            Some(density) => body.calculate_properties(density),
            None => MassProperties {
                mass: desc.mass,
                inertia: desc.inertia,
                center_of_mass: Vec2::ZERO,
            },
        };
        body.set_mass_properties(props);
        body.update_caches();
        Ok(body)
    }

    /// Mass properties this body would have at the given density.
    pub fn calculate_properties(&self, density: f64) -> MassProperties {
        self.shape.mass_properties(density)
    }

    /// Replaces mass, inertia and local center of mass.
    ///
    /// Zero mass makes the body static, which also zeroes its inverse inertia.
    pub fn set_mass_properties(&mut self, props: MassProperties) {
        self.mass = props.mass.max(0.0);
        self.inertia = props.inertia.max(0.0);
        self.local_center_of_mass = props.center_of_mass;
        self.inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
        self.inv_inertia = if self.mass > 0.0 && self.inertia > 0.0 {
            1.0 / self.inertia
        } else {
            0.0
        };
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// The shared material handle.
    pub fn material_arc(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    pub fn local_center_of_mass(&self) -> Vec2 {
        self.local_center_of_mass
    }

    /// True for infinite-mass bodies (`inv_mass == 0`).
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Local-to-world transform of the shape.
    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }

    /// World-space center of mass.
    pub fn center_of_mass(&self) -> Vec2 {
        self.position + self.local_center_of_mass.rotate(self.rotation)
    }

    /// Shifts the body by `shift`.
    pub fn translate(&mut self, shift: Vec2) {
        self.position += shift;
        self.mark_dirty();
    }

    /// Rotates the body by `angle` radians about its position.
    pub fn rotate(&mut self, angle: f64) {
        self.rotation += angle;
        self.mark_dirty();
    }

    pub fn move_and_rotate(&mut self, shift: Vec2, angle: f64) {
        self.position += shift;
        self.rotation += angle;
        self.mark_dirty();
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.mark_dirty();
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.aabb_dirty = true;
        self.vertices_dirty = true;
    }

    /// Applies an impulse at a world-space point, changing both linear and
    /// angular velocity. No effect on static bodies.
    pub fn apply_impulse_at(&mut self, impulse: Vec2, world_point: Vec2) {
        let r = world_point - self.center_of_mass();
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += r.cross(impulse) * self.inv_inertia;
    }

    /// World-space AABB, recomputed if the body moved since the last call.
    pub fn aabb(&mut self) -> AABB {
        if self.aabb_dirty {
            self.refresh_aabb();
        }
        self.aabb
    }

    /// Last computed AABB, possibly stale.
    pub fn cached_aabb(&self) -> AABB {
        self.aabb
    }

    /// True when neither cache needs recomputation.
    pub fn caches_valid(&self) -> bool {
        !self.aabb_dirty && !self.vertices_dirty
    }

    /// World-space polygon vertices, recomputed if stale. Empty for circles.
    pub fn transformed_vertices(&mut self) -> &[Vec2] {
        if self.vertices_dirty {
            self.refresh_vertices();
        }
        &self.world_vertices
    }

    /// Last computed world-space vertices, possibly stale.
    pub fn world_vertices(&self) -> &[Vec2] {
        debug_assert!(!self.vertices_dirty, "world vertices read while stale");
        &self.world_vertices
    }

    /// Recomputes both caches unconditionally.
    pub fn update_caches(&mut self) {
        self.refresh_vertices();
        self.refresh_aabb();
    }

    fn refresh_vertices(&mut self) {
        if let Shape::Polygon(polygon) = &self.shape {
            let transform = Transform::new(self.position, self.rotation);
            transform.apply_all(&polygon.vertices, &mut self.world_vertices);
        }
        self.vertices_dirty = false;
    }

    fn refresh_aabb(&mut self) {
        self.aabb = match &self.shape {
            Shape::Circle(circle) => {
                AABB::from_center(self.position, Vec2::splat(circle.radius))
            }
            Shape::Polygon(_) => {
                if self.vertices_dirty {
                    self.refresh_vertices();
                }
                AABB::from_points(&self.world_vertices)
                    .unwrap_or_else(|| AABB::new(self.position, self.position))
            }
        };
        self.aabb_dirty = false;
    }
}
