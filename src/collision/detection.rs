//! Narrow phase: exact intersection tests between shape pairs.
//!
//! The geometric tests take world-space data and return a [`Contact`] whose
//! normal points from the first shape towards the second. [`check_collision`]
//! dispatches on the shape pair of two bodies and wraps the result in a
//! [`CollisionManifold`].

use super::manifold::{CollisionManifold, Contact};
use crate::math::vec2::Vec2;
use crate::objects::{BodyHandle, RigidBody};
use crate::shapes::polygon::edges_of;
use crate::shapes::Shape;

/// Two contact distances closer than this are considered equal.
const CONTACT_DISTANCE_TOLERANCE: f64 = 1e-6;
/// Contact points closer than this are considered the same point.
const CONTACT_POINT_TOLERANCE: f64 = 1e-6;

/// Finds the point on segment `a`-`b` closest to `point`.
pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let segment = b - a;
    let length_sq = segment.magnitude_squared();
    if length_sq == 0.0 {
        return a;
    }
    let t = ((point - a).dot(segment) / length_sq).clamp(0.0, 1.0);
    a + segment * t
}

/// Projects a vertex set onto `axis`, returning `(min, max)`.
fn project_vertices(vertices: &[Vec2], axis: Vec2) -> (f64, f64) {
    vertices
        .iter()
        .map(|v| v.dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p), hi.max(p)))
}

/// Overlaps, excesses and alignments closer than this are treated as ties.
const AXIS_TIE_TOLERANCE: f64 = 1e-10;

/// Mean of a vertex set.
fn vertex_mean(vertices: &[Vec2]) -> Vec2 {
    if vertices.is_empty() {
        return Vec2::ZERO;
    }
    vertices.iter().fold(Vec2::ZERO, |sum, &v| sum + v) / vertices.len() as f64
}

/// Lexicographic order of two vertex lists: `1.0` when `a` comes first or the
/// lists are equal, `-1.0` otherwise.
fn list_order(a: &[Vec2], b: &[Vec2]) -> f64 {
    for (p, q) in a.iter().zip(b) {
        if p.x != q.x {
            return if p.x < q.x { 1.0 } else { -1.0 };
        }
        if p.y != q.y {
            return if p.y < q.y { 1.0 } else { -1.0 };
        }
    }
    if a.len() <= b.len() {
        1.0
    } else {
        -1.0
    }
}

/// Sign-independent representative of an axis: the direction with a positive
/// x component, or straight up for vertical axes.
fn canonical_axis(axis: Vec2) -> Vec2 {
    if axis.x > AXIS_TIE_TOLERANCE || (axis.x.abs() <= AXIS_TIE_TOLERANCE && axis.y > 0.0) {
        axis
    } else {
        -axis
    }
}

/// Fixed ranking of canonical axes: larger x first, then larger y.
fn axis_precedes(a: Vec2, b: Vec2) -> bool {
    if (a.x - b.x).abs() > AXIS_TIE_TOLERANCE {
        a.x > b.x
    } else {
        a.y > b.y + AXIS_TIE_TOLERANCE
    }
}

/// Running minimum-overlap search over candidate axes.
///
/// Ties are resolved without looking at the order in which axes are fed, so
/// swapping A and B yields the same depth and the negated normal:
/// - equal excesses on an axis orient the normal along `offset`, then by
///   `order`;
/// - equal overlaps prefer the normal most aligned with `offset`, then the
///   first axis in [`axis_precedes`] order.
struct AxisSearch {
    depth: f64,
    normal: Vec2,
    axis: Vec2,
    alignment: f64,
    /// Reference direction from A towards B.
    offset: Vec2,
    /// `1.0` or `-1.0`; flips when A and B are swapped.
    order: f64,
}

impl AxisSearch {
    fn new(offset: Vec2, order: f64) -> Self {
        Self {
            depth: f64::INFINITY,
            normal: Vec2::ZERO,
            axis: Vec2::ZERO,
            alignment: f64::NEG_INFINITY,
            offset,
            order,
        }
    }

    /// Feeds the projection intervals of A and B on a unit `axis`.
    /// Returns `false` when the axis separates the shapes.
    fn test(&mut self, axis: Vec2, (min_a, max_a): (f64, f64), (min_b, max_b): (f64, f64)) -> bool {
        if min_a >= max_b || min_b >= max_a {
            return false;
        }
        let b_over_a = max_b - min_a;
        let a_over_b = max_a - min_b;
        let overlap = b_over_a.min(a_over_b);
        if overlap > self.depth + AXIS_TIE_TOLERANCE {
            return true;
        }

        let canonical = canonical_axis(axis);
        let normal = if b_over_a < a_over_b - AXIS_TIE_TOLERANCE {
            // B sits on the low side of A along the axis.
            -axis
        } else if a_over_b < b_over_a - AXIS_TIE_TOLERANCE {
            axis
        } else {
            let along = self.offset.dot(canonical);
            if along.abs() > AXIS_TIE_TOLERANCE {
                canonical * along.signum()
            } else {
                canonical * self.order
            }
        };
        let alignment = normal.dot(self.offset);

        let better = overlap < self.depth - AXIS_TIE_TOLERANCE
            || alignment > self.alignment + AXIS_TIE_TOLERANCE
            || ((alignment - self.alignment).abs() <= AXIS_TIE_TOLERANCE
                && axis_precedes(canonical, self.axis));
        if better {
            self.normal = normal;
            self.axis = canonical;
            self.alignment = alignment;
        }
        self.depth = self.depth.min(overlap);
        true
    }
}

/// Circle-circle test. Coincident centers use the normal `(0, 1)`.
pub fn circle_circle(center_a: Vec2, radius_a: f64, center_b: Vec2, radius_b: f64) -> Option<Contact> {
    let offset = center_b - center_a;
    let distance = offset.magnitude();
    let radius_sum = radius_a + radius_b;
    if distance >= radius_sum {
        return None;
    }
    let normal = if distance > 0.0 {
        offset / distance
    } else {
        Vec2::UP
    };
    Some(Contact::single(
        normal,
        radius_sum - distance,
        center_a + normal * radius_a,
    ))
}

/// Separating-axis test between two convex polygons given in world space.
///
/// Produces one or two contact points: the closest points between each
/// polygon's vertices and the other polygon's edges.
pub fn polygon_polygon(vertices_a: &[Vec2], vertices_b: &[Vec2]) -> Option<Contact> {
    let mut search = AxisSearch::new(
        vertex_mean(vertices_b) - vertex_mean(vertices_a),
        list_order(vertices_a, vertices_b),
    );
    for vertices in [vertices_a, vertices_b] {
        for (start, end) in edges_of(vertices) {
            let axis = (end - start).perpendicular().normalize();
            if axis == Vec2::ZERO {
                continue;
            }
            let range_a = project_vertices(vertices_a, axis);
            let range_b = project_vertices(vertices_b, axis);
            if !search.test(axis, range_a, range_b) {
                return None;
            }
        }
    }
    if !search.depth.is_finite() {
        return None;
    }

    let mut contact = Contact::single(search.normal, search.depth, Vec2::ZERO);
    contact.contact_count = 0;
    let mut best = f64::INFINITY;

    for (points, edges) in [(vertices_a, vertices_b), (vertices_b, vertices_a)] {
        for &point in points {
            for (start, end) in edges_of(edges) {
                let candidate = closest_point_on_segment(point, start, end);
                let distance = point.distance(candidate);
                if (distance - best).abs() < CONTACT_DISTANCE_TOLERANCE {
                    if contact.contact_count == 1
                        && candidate.distance(contact.points[0]) > CONTACT_POINT_TOLERANCE
                    {
                        contact.points[1] = candidate;
                        contact.contact_count = 2;
                    }
                } else if distance < best {
                    best = distance;
                    contact.points[0] = candidate;
                    contact.contact_count = 1;
                }
            }
        }
    }
    Some(contact)
}

/// Separating-axis test between a circle and a convex polygon (world space).
///
/// Axes are the polygon's edge normals plus the direction from the circle
/// center to the nearest polygon vertex. The normal points from the circle
/// towards the polygon.
pub fn circle_polygon(center: Vec2, radius: f64, vertices: &[Vec2]) -> Option<Contact> {
    let nearest_vertex = vertices
        .iter()
        .copied()
        .min_by(|a, b| a.distance_squared(center).total_cmp(&b.distance_squared(center)))?;

    let mut search = AxisSearch::new(vertex_mean(vertices) - center, 1.0);
    let edge_axes = edges_of(vertices).map(|(start, end)| (end - start).perpendicular().normalize());
    let vertex_axis = std::iter::once((nearest_vertex - center).normalize());

    for axis in edge_axes.chain(vertex_axis) {
        if axis == Vec2::ZERO {
            continue;
        }
        let projected = center.dot(axis);
        let range_circle = (projected - radius, projected + radius);
        let range_polygon = project_vertices(vertices, axis);
        if !search.test(axis, range_circle, range_polygon) {
            return None;
        }
    }
    if !search.depth.is_finite() {
        return None;
    }

    let point = edges_of(vertices)
        .map(|(start, end)| closest_point_on_segment(center, start, end))
        .min_by(|a, b| a.distance_squared(center).total_cmp(&b.distance_squared(center)))?;

    Some(Contact::single(search.normal, search.depth, point))
}

/// Runs the narrow-phase test for two bodies.
///
/// Pairs are evaluated in canonical order (circle before polygon); when that
/// requires swapping, the normal is flipped back so the returned manifold
/// always refers to `body_a` and `body_b` as given, with the normal pointing
/// from A to B.
///
/// Polygon bodies must have fresh vertex caches (see
/// [`RigidBody::update_caches`]).
pub fn check_collision(
    handle_a: BodyHandle,
    body_a: &RigidBody,
    handle_b: BodyHandle,
    body_b: &RigidBody,
) -> Option<CollisionManifold> {
    let swapped = body_b.kind() < body_a.kind();
    let (first, second) = if swapped { (body_b, body_a) } else { (body_a, body_b) };

    let contact = match (first.shape(), second.shape()) {
        (Shape::Circle(a), Shape::Circle(b)) => {
            circle_circle(first.position(), a.radius, second.position(), b.radius)
        }
        (Shape::Circle(circle), Shape::Polygon(_)) => {
            circle_polygon(first.position(), circle.radius, second.world_vertices())
        }
        (Shape::Polygon(_), Shape::Polygon(_)) => {
            polygon_polygon(first.world_vertices(), second.world_vertices())
        }
        (Shape::Polygon(_), Shape::Circle(_)) => {
            unreachable!("narrow phase received a non-canonical shape pair")
        }
    }?;

    let contact = if swapped { contact.flipped() } else { contact };
    Some(CollisionManifold::new(handle_a, handle_b, contact))
}
