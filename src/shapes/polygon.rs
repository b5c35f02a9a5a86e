use crate::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::MassProperties;

/// Areas below this are treated as degenerate.
const DEGENERATE_AREA: f64 = 1e-12;

/// A convex polygon defined by its vertices in local space.
/// Either winding order is accepted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
}

impl Polygon {
    /// Creates a polygon from at least 3 finite vertices.
    ///
    /// Convexity is assumed, not checked.
    pub fn new(vertices: Vec<Vec2>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(PhysicsError::invalid_geometry(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::invalid_geometry(
                "polygon vertices must be finite",
            ));
        }
        Ok(Polygon { vertices })
    }

    /// Axis-aligned rectangle centered on the origin.
    ///
    /// Vertices are `(-w, h), (w, h), (w, -h), (-w, -h)` for half extents `w, h`.
    pub fn rectangle(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(PhysicsError::invalid_geometry(format!(
                "box size must be finite and positive, got {width} x {height}"
            )));
        }
        let (w, h) = (width * 0.5, height * 0.5);
        Self::new(vec![
            Vec2::new(-w, h),
            Vec2::new(w, h),
            Vec2::new(w, -h),
            Vec2::new(-w, -h),
        ])
    }

    /// Iterates over the edges as `(start, end)` pairs, closing the loop.
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        edges_of(&self.vertices)
    }

    /// Shoelace signed area. Positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        self.edges().map(|(a, b)| a.cross(b)).sum::<f64>() * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area centroid. Falls back to the vertex average for degenerate polygons.
    pub fn centroid(&self) -> Vec2 {
        let signed_area = self.signed_area();
        if signed_area.abs() < DEGENERATE_AREA {
            return self.vertex_average();
        }
        let sum = self
            .edges()
            .fold(Vec2::ZERO, |acc, (a, b)| acc + (a + b) * a.cross(b));
        sum / (6.0 * signed_area)
    }

    fn vertex_average(&self) -> Vec2 {
        let sum = self.vertices.iter().fold(Vec2::ZERO, |acc, &v| acc + v);
        sum / self.vertices.len() as f64
    }

    /// Mass, inertia about the centroid, and centroid for a uniform density.
    ///
    /// A degenerate (near-zero-area) polygon gets zero mass and inertia.
    pub fn mass_properties(&self, density: f64) -> MassProperties {
        let area = self.area();
        let center_of_mass = self.centroid();
        if area < DEGENERATE_AREA {
            return MassProperties {
                mass: 0.0,
                inertia: 0.0,
                center_of_mass,
            };
        }

        let second_moment: f64 = self
            .edges()
            .map(|(a, b)| {
                let (a, b) = (a - center_of_mass, b - center_of_mass);
                a.cross(b) * (a.dot(a) + a.dot(b) + b.dot(b))
            })
            .sum();

        MassProperties {
            mass: area * density,
            inertia: (second_moment / 12.0).abs() * density,
            center_of_mass,
        }
    }

    /// Unit normals of every edge. Orientation depends on the winding.
    pub fn edge_normals(&self) -> Vec<Vec2> {
        self.edges()
            .map(|(a, b)| (b - a).perpendicular().normalize())
            .collect()
    }
}

/// Edges of a closed vertex loop.
pub(crate) fn edges_of(vertices: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-9;

    fn square(side: f64) -> Polygon {
        Polygon::rectangle(side, side).unwrap()
    }

    #[test]
    fn test_polygon_new_requires_three_vertices() {
        let ok = Polygon::new(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)]);
        assert!(ok.is_ok());

        let err = Polygon::new(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)]);
        assert!(matches!(err, Err(PhysicsError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_rectangle_vertex_layout() {
        let r = Polygon::rectangle(2.0, 1.0).unwrap();
        assert_eq!(
            r.vertices,
            vec![
                Vec2::new(-1.0, 0.5),
                Vec2::new(1.0, 0.5),
                Vec2::new(1.0, -0.5),
                Vec2::new(-1.0, -0.5),
            ]
        );
        assert!(Polygon::rectangle(0.0, 1.0).is_err());
    }

    #[test]
    fn test_area_is_winding_independent() {
        let cw = square(2.0);
        assert!(cw.signed_area() < 0.0);
        assert_relative_eq!(cw.area(), 4.0, epsilon = EPSILON);

        let mut ccw = cw.clone();
        ccw.vertices.reverse();
        assert!(ccw.signed_area() > 0.0);
        assert_relative_eq!(ccw.area(), 4.0, epsilon = EPSILON);
    }

    #[test]
    fn test_centroid_offset_triangle() {
        let tri = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(0.0, 3.0),
        ])
        .unwrap();
        let c = tri.centroid();
        assert_relative_eq!(c.x, 1.0, epsilon = EPSILON);
        assert_relative_eq!(c.y, 1.0, epsilon = EPSILON);

        let mut reversed = tri.clone();
        reversed.vertices.reverse();
        let c2 = reversed.centroid();
        assert_relative_eq!(c2.x, 1.0, epsilon = EPSILON);
        assert_relative_eq!(c2.y, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_rectangle_mass_properties() {
        // Solid rectangle: I = m (w² + h²) / 12
        let r = Polygon::rectangle(2.0, 1.0).unwrap();
        let props = r.mass_properties(3.0);
        assert_relative_eq!(props.mass, 6.0, epsilon = EPSILON);
        assert_relative_eq!(props.inertia, 6.0 * (4.0 + 1.0) / 12.0, epsilon = EPSILON);
        assert_relative_eq!(props.center_of_mass.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(props.center_of_mass.y, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_inertia_is_about_centroid() {
        let mut shifted = square(1.0);
        for v in &mut shifted.vertices {
            *v += Vec2::new(5.0, -2.0);
        }
        let base = square(1.0).mass_properties(1.0);
        let moved = shifted.mass_properties(1.0);
        assert_relative_eq!(moved.inertia, base.inertia, epsilon = 1e-9);
        assert_relative_eq!(moved.center_of_mass.x, 5.0, epsilon = EPSILON);
        assert_relative_eq!(moved.center_of_mass.y, -2.0, epsilon = EPSILON);
    }

    #[test]
    fn test_degenerate_polygon_has_zero_mass() {
        let line = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
        ])
        .unwrap();
        let props = line.mass_properties(10.0);
        assert_eq!(props.mass, 0.0);
        assert_eq!(props.inertia, 0.0);
        assert_relative_eq!(props.center_of_mass.x, 1.0, epsilon = EPSILON);
        assert!(props.center_of_mass.is_finite());
    }

    #[test]
    fn test_edge_normals_are_unit() {
        let tri = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(0.0, 3.0),
        ])
        .unwrap();
        let normals = tri.edge_normals();
        assert_eq!(normals.len(), 3);
        for n in normals {
            assert_relative_eq!(n.magnitude(), 1.0, epsilon = EPSILON);
        }
    }
}
