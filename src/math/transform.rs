use super::vec2::Vec2;

/// Rigid transform (rotation about the origin followed by translation).
///
/// Sine and cosine are computed once so that transforming a whole vertex list
/// costs one trig evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f64,
    sin: f64,
    cos: f64,
}

impl Transform {
    /// Creates a new transform.
    pub fn new(position: Vec2, rotation: f64) -> Self {
        let (sin, cos) = rotation.sin_cos();
        Self {
            position,
            rotation,
            sin,
            cos,
        }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }

    /// Rotates a direction without translating it.
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.cos - v.y * self.sin, v.x * self.sin + v.y * self.cos)
    }

    /// Maps a local point to world space.
    pub fn apply(&self, point: Vec2) -> Vec2 {
        self.rotate(point) + self.position
    }

    /// Maps a world point back to local space.
    pub fn apply_inverse(&self, point: Vec2) -> Vec2 {
        let p = point - self.position;
        Vec2::new(p.x * self.cos + p.y * self.sin, -p.x * self.sin + p.y * self.cos)
    }

    /// Transforms every point of `local` into `out`, reusing its allocation.
    pub fn apply_all(&self, local: &[Vec2], out: &mut Vec<Vec2>) {
        out.clear();
        out.extend(local.iter().map(|&v| self.apply(v)));
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
