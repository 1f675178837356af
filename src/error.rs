use thiserror::Error;

/// Errors raised while configuring a school. Ticks themselves never fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchoolError {
    /// Agent parameters that would produce unusable speeds or radii.
    #[error("invalid boid parameters: {0}")]
    InvalidParams(&'static str),
    /// Spatial grid layout that cannot bucket any position.
    #[error("invalid spatial grid: {0}")]
    InvalidGrid(&'static str),
}
