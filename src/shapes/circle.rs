use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::MassProperties;
use crate::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Circle {
    pub radius: f64,
}

impl Circle {
    /// Creates a circle. The radius must be finite and positive.
    pub fn new(radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhysicsError::invalid_geometry(format!(
                "circle radius must be finite and positive, got {radius}"
            )));
        }
        Ok(Self { radius })
    }

    /// Mass = πr²ρ, inertia = ½mr², centered on the local origin.
    pub fn mass_properties(&self, density: f64) -> MassProperties {
        let mass = PI * self.radius * self.radius * density;
        MassProperties {
            mass,
            inertia: 0.5 * mass * self.radius * self.radius,
            center_of_mass: Vec2::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circle_new() {
        let c = Circle::new(5.0).unwrap();
        assert_eq!(c.radius, 5.0);
    }

    #[test]
    fn test_circle_rejects_bad_radius() {
        assert!(Circle::new(-1.0).is_err());
        assert!(Circle::new(0.0).is_err());
        assert!(Circle::new(f64::NAN).is_err());
    }

    #[test]
    fn test_circle_mass_properties() {
        let c = Circle::new(0.1).unwrap();
        let props = c.mass_properties(600.0);
        assert_relative_eq!(props.mass, PI * 0.01 * 600.0, epsilon = 1e-12);
        assert_relative_eq!(props.inertia, 0.5 * props.mass * 0.01, epsilon = 1e-12);
        assert_eq!(props.center_of_mass, Vec2::ZERO);
    }
}
