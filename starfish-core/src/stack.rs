//! In-memory image stack shared by every registration algorithm.
//!
//! A stack holds one `height x width` tile per `(round, channel)` pair in a
//! single contiguous row-major buffer. Persistence lives in [`crate::ingest`].

use std::path::Path;

use tracing::{Span, field, instrument};

use crate::{error::StackError, ingest};

/// File name used when a stack is read from or written to a directory.
pub const STACK_FILE_NAME: &str = "stack.parquet";

/// Geometry of an [`ImageStack`].
///
/// # Examples
/// ```
/// use starfish_core::StackShape;
///
/// let shape = StackShape::new(2, 3, 4, 5);
/// assert_eq!(shape.tile_len(), 20);
/// assert_eq!(shape.tile_count(), 6);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StackShape {
    /// Number of imaging rounds.
    pub rounds: usize,
    /// Number of channels per round.
    pub channels: usize,
    /// Tile height in pixels.
    pub height: usize,
    /// Tile width in pixels.
    pub width: usize,
}

impl StackShape {
    /// Creates a shape from its four dimensions.
    #[must_use]
    pub const fn new(rounds: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            rounds,
            channels,
            height,
            width,
        }
    }

    /// Number of pixels in one tile.
    #[must_use]
    pub const fn tile_len(&self) -> usize {
        self.height.saturating_mul(self.width)
    }

    /// Number of tiles in the stack.
    #[must_use]
    pub const fn tile_count(&self) -> usize {
        self.rounds.saturating_mul(self.channels)
    }

    pub(crate) fn validate(&self) -> Result<usize, StackError> {
        if self.rounds == 0 || self.channels == 0 || self.height == 0 || self.width == 0 {
            return Err(StackError::ZeroDimension {
                rounds: self.rounds,
                channels: self.channels,
                height: self.height,
                width: self.width,
            });
        }
        self.height
            .checked_mul(self.width)
            .and_then(|tile| tile.checked_mul(self.rounds))
            .and_then(|len| len.checked_mul(self.channels))
            .ok_or(StackError::CapacityOverflow)
    }

    pub(crate) fn tile_index(&self, round: usize, channel: usize) -> Result<usize, StackError> {
        if round >= self.rounds || channel >= self.channels {
            return Err(StackError::TileOutOfBounds {
                round,
                channel,
                rounds: self.rounds,
                channels: self.channels,
            });
        }
        Ok(round * self.channels + channel)
    }
}

/// Multi-round, multi-channel image stack.
///
/// # Examples
/// ```
/// use starfish_core::{ImageStack, StackShape};
///
/// let stack = ImageStack::from_tiles(StackShape::new(1, 2, 1, 2), vec![1.0, 2.0, 5.0, 0.0])?;
/// assert_eq!(stack.tile(0, 1)?, &[5.0, 0.0]);
/// assert_eq!(stack.max_projection(0)?, vec![5.0, 2.0]);
/// # Ok::<(), starfish_core::StackError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ImageStack {
    shape: StackShape,
    values: Vec<f32>,
}

impl ImageStack {
    /// Builds a stack from a row-major buffer ordered by round, then channel.
    ///
    /// # Errors
    /// Returns [`StackError::ZeroDimension`] when any dimension is zero and
    /// [`StackError::ValueCountMismatch`] when `values` does not match `shape`.
    pub fn from_tiles(shape: StackShape, values: Vec<f32>) -> Result<Self, StackError> {
        let expected = shape.validate()?;
        if values.len() != expected {
            return Err(StackError::ValueCountMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    /// Builds a zero-filled stack.
    ///
    /// # Errors
    /// Returns [`StackError::ZeroDimension`] or [`StackError::CapacityOverflow`]
    /// for shapes that cannot be allocated.
    pub fn zeros(shape: StackShape) -> Result<Self, StackError> {
        let len = shape.validate()?;
        Ok(Self {
            shape,
            values: vec![0.0; len],
        })
    }

    /// Returns the stack geometry.
    #[must_use]
    pub const fn shape(&self) -> StackShape {
        self.shape
    }

    /// Returns the full row-major pixel buffer.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns the pixels of one tile.
    ///
    /// # Errors
    /// Returns [`StackError::TileOutOfBounds`] for an invalid round or channel.
    pub fn tile(&self, round: usize, channel: usize) -> Result<&[f32], StackError> {
        let range = self.tile_range(round, channel)?;
        Ok(&self.values[range])
    }

    /// Returns the pixels of one tile for in-place modification.
    ///
    /// # Errors
    /// Returns [`StackError::TileOutOfBounds`] for an invalid round or channel.
    pub fn tile_mut(&mut self, round: usize, channel: usize) -> Result<&mut [f32], StackError> {
        let range = self.tile_range(round, channel)?;
        Ok(&mut self.values[range])
    }

    /// Pixel-wise maximum over every channel of `round`.
    ///
    /// # Errors
    /// Returns [`StackError::TileOutOfBounds`] when `round` is outside the stack.
    pub fn max_projection(&self, round: usize) -> Result<Vec<f32>, StackError> {
        let mut projection = self.tile(round, 0)?.to_vec();
        for channel in 1..self.shape.channels {
            for (acc, &value) in projection.iter_mut().zip(self.tile(round, channel)?) {
                *acc = acc.max(value);
            }
        }
        Ok(projection)
    }

    /// Loads a stack from a Parquet file or a directory containing
    /// [`STACK_FILE_NAME`].
    ///
    /// # Errors
    /// Returns [`StackError`] when the file cannot be opened or decoded, or
    /// when its contents do not describe a complete stack.
    #[instrument(name = "stack.read", err, skip(path), fields(path = field::Empty))]
    pub fn read(path: impl AsRef<Path>) -> Result<Self, StackError> {
        let path = ingest::resolve_stack_path(path.as_ref());
        Span::current().record("path", field::display(path.display()));
        ingest::read_parquet(&path)
    }

    /// Persists the stack to a directory (as [`STACK_FILE_NAME`]) or to an
    /// explicit `.parquet` file path.
    ///
    /// The data is staged in a temporary file next to the destination and
    /// moved into place only once fully written, so a failed write leaves no
    /// artifact behind.
    ///
    /// # Errors
    /// Returns [`StackError`] when the destination is not writable or encoding
    /// fails.
    #[instrument(name = "stack.write", err, skip(self, path), fields(path = field::Empty))]
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), StackError> {
        let path = ingest::resolve_stack_path(path.as_ref());
        Span::current().record("path", field::display(path.display()));
        ingest::write_parquet(self, &path)
    }

    fn tile_range(
        &self,
        round: usize,
        channel: usize,
    ) -> Result<std::ops::Range<usize>, StackError> {
        let index = self.shape.tile_index(round, channel)?;
        let tile_len = self.shape.tile_len();
        let start = index * tile_len;
        Ok(start..start + tile_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn two_by_two() -> ImageStack {
        let values = (0..16).map(|v| v as f32).collect();
        ImageStack::from_tiles(StackShape::new(2, 2, 2, 2), values).expect("valid stack")
    }

    #[rstest]
    #[case::rounds(StackShape::new(0, 1, 1, 1))]
    #[case::channels(StackShape::new(1, 0, 1, 1))]
    #[case::height(StackShape::new(1, 1, 0, 1))]
    #[case::width(StackShape::new(1, 1, 1, 0))]
    fn from_tiles_rejects_zero_dimensions(#[case] shape: StackShape) {
        let err = ImageStack::from_tiles(shape, Vec::new()).expect_err("zero dimension");
        assert!(matches!(err, StackError::ZeroDimension { .. }));
    }

    #[rstest]
    fn from_tiles_rejects_short_buffers() {
        let err = ImageStack::from_tiles(StackShape::new(1, 1, 2, 2), vec![0.0; 3])
            .expect_err("buffer too short");
        assert!(matches!(
            err,
            StackError::ValueCountMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[rstest]
    #[case(0, 0, [0.0, 1.0, 2.0, 3.0])]
    #[case(0, 1, [4.0, 5.0, 6.0, 7.0])]
    #[case(1, 0, [8.0, 9.0, 10.0, 11.0])]
    #[case(1, 1, [12.0, 13.0, 14.0, 15.0])]
    fn tiles_are_ordered_by_round_then_channel(
        #[case] round: usize,
        #[case] channel: usize,
        #[case] expected: [f32; 4],
    ) {
        let stack = two_by_two();
        assert_eq!(stack.tile(round, channel).expect("tile exists"), &expected);
    }

    #[rstest]
    fn tile_rejects_out_of_bounds_indices() {
        let stack = two_by_two();
        let err = stack.tile(2, 0).expect_err("round 2 does not exist");
        assert!(matches!(
            err,
            StackError::TileOutOfBounds {
                round: 2,
                channel: 0,
                ..
            }
        ));
    }

    #[rstest]
    fn tile_mut_writes_through() {
        let mut stack = two_by_two();
        stack.tile_mut(1, 0).expect("tile exists").fill(-1.0);
        assert_eq!(stack.tile(1, 0).expect("tile exists"), &[-1.0; 4]);
        assert_eq!(stack.tile(1, 1).expect("tile exists"), &[12.0, 13.0, 14.0, 15.0]);
    }

    #[rstest]
    fn max_projection_takes_channel_maximum() {
        let values = vec![1.0, 9.0, 3.0, 4.0, 2.0, 0.0];
        let stack =
            ImageStack::from_tiles(StackShape::new(1, 3, 1, 2), values).expect("valid stack");
        assert_eq!(stack.max_projection(0).expect("round exists"), vec![3.0, 9.0]);
    }

    #[rstest]
    fn zeros_allocates_the_full_shape() {
        let stack = ImageStack::zeros(StackShape::new(2, 3, 4, 5)).expect("valid shape");
        assert_eq!(stack.values().len(), 120);
        assert!(stack.values().iter().all(|&v| v == 0.0));
    }
}
