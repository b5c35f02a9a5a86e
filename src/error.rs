//! Error types for the engine's public boundary.
//!
//! Only misuse of the API (bad geometry, unknown handles, invalid configuration)
//! is reported through [`PhysicsError`]. Numerical degeneracy inside a step is
//! handled by fallback values and never surfaces as an error.

use thiserror::Error;

/// Errors returned by body factories, constraint factories and configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// Shape geometry cannot describe a convex body.
    #[error("invalid geometry: {reason}")]
    InvalidGeometry {
        /// Description of the problem.
        reason: String,
    },

    /// Mass, inertia or density is negative or not finite.
    #[error("invalid mass properties: {reason}")]
    InvalidMassProperties {
        /// Description of the problem.
        reason: String,
    },

    /// Material coefficients are negative or not finite.
    #[error("invalid material: {reason}")]
    InvalidMaterial {
        /// Description of the problem.
        reason: String,
    },

    /// A handle does not refer to a body of this world.
    #[error("invalid body handle: {0}")]
    InvalidBodyHandle(usize),

    /// A two-body constraint was given the same body twice.
    #[error("constraint connects body {0} to itself")]
    SelfConstraint(usize),

    /// Fixed time step must be finite and in (0, 1].
    #[error("invalid timestep: {0}")]
    InvalidTimestep(f64),

    /// Hash grid cells must have a finite, positive size.
    #[error("invalid hash grid cell size: {0}")]
    InvalidCellSize(f64),

    /// Any other configuration problem.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
}

impl PhysicsError {
    /// Create an invalid geometry error.
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }

    /// Create an invalid mass properties error.
    pub fn invalid_mass_properties(reason: impl Into<String>) -> Self {
        Self::InvalidMassProperties {
            reason: reason.into(),
        }
    }

    /// Create an invalid material error.
    pub fn invalid_material(reason: impl Into<String>) -> Self {
        Self::InvalidMaterial {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, PhysicsError>;
