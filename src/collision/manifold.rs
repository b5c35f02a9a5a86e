use crate::math::vec2::Vec2;
use crate::objects::BodyHandle;

/// Maximum contact points in a manifold.
pub const MAX_CONTACTS: usize = 2;

/// Pure geometric result of a narrow-phase test between two shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first shape towards the second.
    pub normal: Vec2,
    /// Penetration depth along the normal (positive).
    pub depth: f64,
    /// World-space contact points; only the first `contact_count` are valid.
    pub points: [Vec2; MAX_CONTACTS],
    pub contact_count: usize,
}

impl Contact {
    pub(crate) fn single(normal: Vec2, depth: f64, point: Vec2) -> Self {
        Self {
            normal,
            depth,
            points: [point, Vec2::ZERO],
            contact_count: 1,
        }
    }

    /// Valid contact points.
    pub fn points(&self) -> &[Vec2] {
        &self.points[..self.contact_count]
    }

    /// Same contact seen from the other shape.
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// A colliding pair of bodies, rebuilt on every detection pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionManifold {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    /// Unit normal pointing from body A towards body B.
    pub normal: Vec2,
    pub depth: f64,
    pub contacts: [Vec2; MAX_CONTACTS],
    pub contact_count: usize,
}

impl CollisionManifold {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, contact: Contact) -> Self {
        Self {
            body_a,
            body_b,
            normal: contact.normal,
            depth: contact.depth,
            contacts: contact.points,
            contact_count: contact.contact_count,
        }
    }

    /// Valid contact points.
    pub fn contacts(&self) -> &[Vec2] {
        &self.contacts[..self.contact_count]
    }
}
