//! `translate` algorithm definition and command-line surface.
use clap::Args;
use starfish_core::{
    AlgorithmError, ClapAlgorithm, ImageStack, NamedAlgorithm, RegistrationAlgorithm, StackError,
};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::shift::PixelShift;

/// Descriptor registering [`TranslateRegistration`] with the dispatcher.
pub static DESCRIPTOR: ClapAlgorithm<TranslateRegistration> = ClapAlgorithm::new();

/// Errors raised while running [`TranslateRegistration`].
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The shift would move every pixel out of the tile.
    #[error("shift {shift} does not overlap a {height}x{width} tile")]
    NoOverlap {
        /// Requested shift.
        shift: PixelShift,
        /// Tile height.
        height: usize,
        /// Tile width.
        width: usize,
    },
    /// Tile access failed.
    #[error(transparent)]
    Stack(#[from] StackError),
}

/// Translates every tile of the stack by the same whole-pixel offset.
///
/// Pixels uncovered by the move take the `fill` value.
///
/// # Examples
/// ```
/// use starfish_core::{ImageStack, StackShape};
/// use starfish_registration_translate::{PixelShift, TranslateRegistration};
///
/// let mut stack = ImageStack::from_tiles(StackShape::new(1, 1, 1, 3), vec![1.0, 2.0, 3.0])?;
/// let algorithm = TranslateRegistration { shift: PixelShift::new(0, 1), fill: 0.0 };
/// algorithm.translate(&mut stack)?;
/// assert_eq!(stack.values(), &[0.0, 1.0, 2.0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Args, Clone, Debug, PartialEq)]
pub struct TranslateRegistration {
    /// Offset applied to every tile, as `DY,DX` pixels.
    #[arg(long, value_name = "DY,DX", allow_hyphen_values = true)]
    pub shift: PixelShift,

    /// Value written into pixels uncovered by the translation.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub fill: f32,
}

impl NamedAlgorithm for TranslateRegistration {
    const NAME: &'static str = "translate";
    const ABOUT: &'static str = "Translate every tile by a fixed whole-pixel offset.";
}

impl RegistrationAlgorithm for TranslateRegistration {
    fn run(&self, stack: &mut ImageStack) -> Result<(), AlgorithmError> {
        self.translate(stack)
            .map_err(|err| AlgorithmError::failed(Self::NAME, err))
    }
}

impl TranslateRegistration {
    /// Applies the configured shift to every tile in place.
    ///
    /// # Errors
    /// Returns [`TranslateError::NoOverlap`] when the shift is at least as
    /// large as the tile along either axis.
    #[instrument(
        name = "translate.apply",
        err,
        skip(self, stack),
        fields(shift = %self.shift, tiles = stack.shape().tile_count()),
    )]
    pub fn translate(&self, stack: &mut ImageStack) -> Result<(), TranslateError> {
        let shape = stack.shape();
        let (height, width) = (shape.height, shape.width);
        let (Some(dy), Some(dx)) = (
            overlapping_offset(self.shift.dy, height),
            overlapping_offset(self.shift.dx, width),
        ) else {
            return Err(TranslateError::NoOverlap {
                shift: self.shift,
                height,
                width,
            });
        };

        let mut scratch = vec![self.fill; shape.tile_len()];
        for round in 0..shape.rounds {
            for channel in 0..shape.channels {
                let tile = stack.tile_mut(round, channel)?;
                scratch.fill(self.fill);
                for row in 0..height {
                    let Some(target_row) = row.checked_add_signed(dy).filter(|&r| r < height) else {
                        continue;
                    };
                    for column in 0..width {
                        if let Some(target_column) =
                            column.checked_add_signed(dx).filter(|&c| c < width)
                        {
                            scratch[target_row * width + target_column] = tile[row * width + column];
                        }
                    }
                }
                tile.copy_from_slice(&scratch);
                debug!(round, channel, "translated tile");
            }
        }
        Ok(())
    }
}

fn overlapping_offset(offset: i64, extent: usize) -> Option<isize> {
    let offset = isize::try_from(offset).ok()?;
    (offset.unsigned_abs() < extent).then_some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Command;
    use rstest::rstest;
    use starfish_core::{AlgorithmDescriptor, StackShape};
    use starfish_test_support::images::{gaussian_spots, roll};

    fn parse(args: &[&str]) -> clap::error::Result<clap::ArgMatches> {
        DESCRIPTOR
            .declare_arguments(Command::new(DESCRIPTOR.name()))
            .try_get_matches_from(std::iter::once("translate").chain(args.iter().copied()))
    }

    #[rstest]
    fn shift_flag_is_required() {
        let err = parse(&[]).expect_err("--shift is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[rstest]
    #[case(&["--shift", "-2,3"], PixelShift::new(-2, 3), 0.0)]
    #[case(&["--shift=1,1", "--fill", "-1.5"], PixelShift::new(1, 1), -1.5)]
    fn flags_construct_the_algorithm(
        #[case] args: &[&str],
        #[case] shift: PixelShift,
        #[case] fill: f32,
    ) {
        let matches = parse(args).expect("valid flags");
        let algorithm = DESCRIPTOR
            .from_parsed_arguments(&matches)
            .expect("constructs");
        assert_eq!(
            format!("{algorithm:?}"),
            format!("{:?}", TranslateRegistration { shift, fill })
        );
    }

    #[rstest]
    fn malformed_shift_is_rejected_while_parsing() {
        let err = parse(&["--shift", "1"]).expect_err("needs two components");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[rstest]
    fn interior_content_matches_a_circular_roll() {
        let image = gaussian_spots(16, 16, &[(8.0, 8.0)], 1.0);
        let mut stack = ImageStack::from_tiles(StackShape::new(1, 1, 16, 16), image.clone())
            .expect("valid stack");
        let algorithm = TranslateRegistration {
            shift: PixelShift::new(2, -3),
            fill: 0.0,
        };
        algorithm.translate(&mut stack).expect("translates");

        let rolled = roll(&image, 16, 16, 2, -3);
        let translated = stack.tile(0, 0).expect("tile");
        for row in 2..16 {
            for column in 0..13 {
                let index = row * 16 + column;
                assert_eq!(translated[index], rolled[index], "pixel ({row}, {column})");
            }
        }
        assert!(translated[..16].iter().all(|&v| v == 0.0));
    }

    #[rstest]
    fn every_tile_is_translated() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let mut stack =
            ImageStack::from_tiles(StackShape::new(2, 2, 1, 2), values).expect("valid stack");
        let algorithm = TranslateRegistration {
            shift: PixelShift::new(0, -1),
            fill: 9.0,
        };
        algorithm.translate(&mut stack).expect("translates");
        assert_eq!(stack.values(), &[2.0, 9.0, 4.0, 9.0, 6.0, 9.0, 8.0, 9.0]);
    }

    #[rstest]
    #[case(PixelShift::new(4, 0))]
    #[case(PixelShift::new(0, -5))]
    #[case(PixelShift::new(i64::MIN, 0))]
    fn shifts_without_overlap_fail(#[case] shift: PixelShift) {
        let mut stack = ImageStack::zeros(StackShape::new(1, 1, 4, 5)).expect("valid stack");
        let algorithm = TranslateRegistration { shift, fill: 0.0 };
        let err = algorithm.translate(&mut stack).expect_err("no overlap");
        assert!(matches!(err, TranslateError::NoOverlap { .. }));

        let err = RegistrationAlgorithm::run(&algorithm, &mut stack).expect_err("wrapped");
        assert!(matches!(
            err,
            AlgorithmError::Failed {
                algorithm: "translate",
                ..
            }
        ));
    }
}
