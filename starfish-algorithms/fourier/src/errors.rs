//! Error type for the `fourier_shift` algorithm.

use starfish_core::StackError;
use thiserror::Error;

/// Errors raised while running [`crate::FourierShiftRegistration`].
#[derive(Debug, Error)]
pub enum FourierShiftError {
    /// The reference stack could not be loaded.
    #[error("failed to load reference stack: {0}")]
    Reference(#[source] StackError),
    /// The reference tiles do not have the same geometry as the input tiles.
    #[error("reference tiles are {reference_height}x{reference_width} but input tiles are {height}x{width}")]
    GeometryMismatch {
        /// Reference tile height.
        reference_height: usize,
        /// Reference tile width.
        reference_width: usize,
        /// Input tile height.
        height: usize,
        /// Input tile width.
        width: usize,
    },
    /// Tile access failed while registering the stack.
    #[error(transparent)]
    Stack(#[from] StackError),
}
