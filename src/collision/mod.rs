pub mod aabb;
pub mod broad_phase;
pub mod detection;
pub mod manifold;
pub mod quadtree;
pub mod spatial_hash_grid;

pub use aabb::AABB;
pub use broad_phase::{BodyPair, BroadPhase, BroadPhaseEntry, BroadPhaseMethod};
pub use detection::check_collision;
pub use manifold::{CollisionManifold, Contact};
pub use quadtree::Quadtree;
pub use spatial_hash_grid::SpatialHashGrid;
