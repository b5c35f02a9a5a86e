//! Physical material shared between bodies.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// Surface coefficients used by the contact solver.
///
/// Materials are immutable and shared: bodies hold an `Arc<Material>`, so one
/// "ground" material can back any number of static bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coefficient of restitution. 0 = no bounce, 1 = perfectly elastic.
    /// A contact uses the smaller value of the pair.
    pub elasticity: f64,
    /// Friction coefficient bounding the sticking impulse.
    pub static_friction: f64,
    /// Friction coefficient applied while sliding.
    pub dynamic_friction: f64,
}

impl Material {
    /// Creates a material, clamping negative coefficients to zero.
    pub fn new(elasticity: f64, static_friction: f64, dynamic_friction: f64) -> Self {
        Material {
            elasticity: elasticity.max(0.0),
            static_friction: static_friction.max(0.0),
            dynamic_friction: dynamic_friction.max(0.0),
        }
    }

    /// Creates a material, rejecting negative or non-finite coefficients.
    pub fn try_new(elasticity: f64, static_friction: f64, dynamic_friction: f64) -> Result<Self> {
        let fields = [
            ("elasticity", elasticity),
            ("static_friction", static_friction),
            ("dynamic_friction", dynamic_friction),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PhysicsError::invalid_material(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(Material {
            elasticity,
            static_friction,
            dynamic_friction,
        })
    }

    /// Restitution of a contact between two materials.
    pub fn combined_elasticity(&self, other: &Material) -> f64 {
        self.elasticity.min(other.elasticity)
    }

    /// Static and dynamic friction of a contact, averaged over the pair.
    pub fn combined_friction(&self, other: &Material) -> (f64, f64) {
        (
            (self.static_friction + other.static_friction) * 0.5,
            (self.dynamic_friction + other.dynamic_friction) * 0.5,
        )
    }
}

impl Default for Material {
    /// Perfectly elastic and frictionless.
    fn default() -> Self {
        Material {
            elasticity: 1.0,
            static_friction: 0.0,
            dynamic_friction: 0.0,
        }
    }
}
