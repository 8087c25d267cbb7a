//! Error types for cell-list construction and neighbor queries.

use std::fmt;

/// Errors reported by index construction, query entry, and the pair driver.
///
/// Configuration errors are raised when an index or pool is built; query-argument
/// errors are raised before any per-point iterator is created. Both are fatal to
/// the call that produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalityError {
    /// Box lengths must be finite and strictly positive (z is ignored for 2D boxes).
    InvalidBox { lengths: [f32; 3] },

    /// Minimum cell width must be finite and strictly positive.
    InvalidCellWidth(f32),

    /// The grid would need more cells than the cell list can address.
    TooManyCells { cells: u64 },

    /// More reference points than the cell chains can address.
    TooManyPoints { points: usize, limit: usize },

    /// A reference point lies outside a non-periodic box.
    PointOutsideBox { index: usize },

    /// Parallel arrays handed to a constructor disagree in length.
    LengthMismatch { expected: usize, actual: usize },

    /// k-NN queries need at least one neighbor.
    InvalidNumNeighbors(usize),

    /// Query cutoff must be strictly positive (and finite for ball queries).
    InvalidRMax(f32),

    /// Query cutoff exceeds what minimum-image wrapping supports on a periodic axis.
    RMaxTooLarge { r_max: f32, limit: f32 },

    /// The worker pool could not be created.
    ThreadPool(String),
}

impl fmt::Display for LocalityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalityError::InvalidBox { lengths } => {
                write!(
                    f,
                    "invalid box: lengths must be positive, got ({}, {}, {})",
                    lengths[0], lengths[1], lengths[2]
                )
            }
            LocalityError::InvalidCellWidth(w) => {
                write!(f, "invalid cell width: must be positive, got {}", w)
            }
            LocalityError::TooManyCells { cells } => {
                write!(f, "too many cells: grid would need {} cells", cells)
            }
            LocalityError::TooManyPoints { points, limit } => {
                write!(f, "too many points: got {}, cell list holds at most {}", points, limit)
            }
            LocalityError::PointOutsideBox { index } => {
                write!(f, "point {} lies outside the non-periodic box", index)
            }
            LocalityError::LengthMismatch { expected, actual } => {
                write!(f, "length mismatch: expected {}, got {}", expected, actual)
            }
            LocalityError::InvalidNumNeighbors(k) => {
                write!(f, "invalid num_neighbors: need at least 1, got {}", k)
            }
            LocalityError::InvalidRMax(r) => {
                write!(f, "invalid r_max: must be positive, got {}", r)
            }
            LocalityError::RMaxTooLarge { r_max, limit } => {
                write!(
                    f,
                    "r_max {} exceeds half the periodic box length ({})",
                    r_max, limit
                )
            }
            LocalityError::ThreadPool(msg) => {
                write!(f, "thread pool construction failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for LocalityError {}

impl From<rayon::ThreadPoolBuildError> for LocalityError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        LocalityError::ThreadPool(err.to_string())
    }
}
