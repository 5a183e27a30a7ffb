//! Defines [`BoundsError`], representing all errors returned by this crate.

use thiserror::Error;

/// Enum with all errors in this crate.
///
/// Coordinate and radius types are constrained statically through
/// [`geo::CoordFloat`], so a non-floating or mixed-width call never compiles and has no runtime
/// variant here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BoundsError {
    /// Offsets, ids or vertices disagree about how many elements they describe.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The expansion radius is negative or NaN.
    #[error("Invalid expansion radius: {0}")]
    InvalidExpansionRadius(String),
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, BoundsError>;
