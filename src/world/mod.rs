pub mod contact_solver;
pub mod physics_world;

pub use contact_solver::resolve_manifold;
pub use physics_world::PhysicsWorld;
