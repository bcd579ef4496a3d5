//! Error types for voroflux.

use thiserror::Error;

/// Errors reported by the container kernel.
///
/// Degenerate geometry (a cell clipped away entirely) and lookup misses are
/// not errors; they are reported through empty cells and the sentinel cell.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoronoiError {
    /// Domain bounds are inverted, empty or not finite.
    #[error("invalid bounds on axis {axis}: min {min} must be finite and below max {max}")]
    InvalidBounds {
        /// Offending axis (0 = x, 1 = y, 2 = z).
        axis: usize,
        /// Lower bound on that axis.
        min: f64,
        /// Upper bound on that axis.
        max: f64,
    },

    /// A grid block count is zero.
    #[error("invalid block count {blocks:?}: every axis needs at least one block")]
    InvalidBlockCount {
        /// The requested block counts.
        blocks: [usize; 3],
    },

    /// Batched insertion received sequences of different lengths.
    #[error(
        "add_points failed because of mismatch in ids and xyz sizes: ids {ids}, x {xs}, y {ys}, z {zs}"
    )]
    BatchLengthMismatch {
        /// Number of ids.
        ids: usize,
        /// Number of x coordinates.
        xs: usize,
        /// Number of y coordinates.
        ys: usize,
        /// Number of z coordinates.
        zs: usize,
    },

    /// A cutting plane was given a zero-length or non-finite normal.
    #[error("cutting plane normal {normal:?} is zero-length or not finite")]
    DegenerateNormal {
        /// The rejected normal.
        normal: [f64; 3],
    },

    /// A wall was tagged with an id that collides with particle or box ids.
    #[error("wall id {id} must be <= {max}")]
    InvalidWallId {
        /// The rejected id.
        id: i32,
        /// Largest permitted wall id.
        max: i32,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, VoronoiError>;
