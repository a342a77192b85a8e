use crate::config::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HologramError>;

/// Errors raised while building grids, encoding or displaying holograms.
#[derive(Error, Debug)]
pub enum HologramError {
    /// An inverse function was evaluated outside of the interval it was tabulated on.
    #[error("value {value} lies outside of the inverse function domain [{lo}, {hi}]")]
    Domain { value: f64, lo: f64, hi: f64 },

    /// Unknown method or basis name, or a numeric parameter that cannot be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Arrays that should share a shape do not.
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub(crate) fn incompatible_shape() -> HologramError {
    HologramError::Shape(ndarray::ShapeError::from_kind(
        ndarray::ErrorKind::IncompatibleShape,
    ))
}
