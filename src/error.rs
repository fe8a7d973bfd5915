use thiserror::Error;

/// The error type used by path editing and traversal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Node index {index} is out of bounds for a path with {len} nodes")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("The segment iterator is already done")]
    IteratorDone,

    #[error("A moveto is only allowed on an empty path")]
    NotEmpty,

    #[error("The path has no current point to continue from")]
    NoCurrentPoint,

    #[error("Flattening tolerance must be finite and greater than zero")]
    InvalidTolerance,
}

pub type Result<T> = std::result::Result<T, PathError>;

/// Fails unless `index < len`
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(PathError::IndexOutOfBounds { index, len })
    }
}

/// Fails unless `index <= len`
pub(crate) fn check_insert_index(index: usize, len: usize) -> Result<()> {
    if index <= len {
        Ok(())
    } else {
        Err(PathError::IndexOutOfBounds { index, len })
    }
}

/// Fails unless `tolerance` is a usable flattening distance
pub(crate) fn check_tolerance(tolerance: f64) -> Result<()> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(PathError::InvalidTolerance)
    }
}
