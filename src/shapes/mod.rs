pub mod circle;
pub mod polygon;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::vec2::Vec2;

pub use circle::Circle;
pub use polygon::Polygon;

/// Collision geometry of a body, in the body's local frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    Circle(Circle),
    Polygon(Polygon),
}

/// Shape discriminant. The ordering defines the canonical pair order used by
/// narrow-phase dispatch (circles first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeKind {
    Circle,
    Polygon,
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// Mass properties for a uniform density.
    pub fn mass_properties(&self, density: f64) -> MassProperties {
        match self {
            Shape::Circle(circle) => circle.mass_properties(density),
            Shape::Polygon(polygon) => polygon.mass_properties(density),
        }
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Shape::Circle(circle)
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Shape::Polygon(polygon)
    }
}

/// Mass, moment of inertia about the center of mass, and the local center of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    pub mass: f64,
    pub inertia: f64,
    pub center_of_mass: Vec2,
}
