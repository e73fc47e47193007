//! `fourier_shift` algorithm definition and command-line surface.
use std::path::PathBuf;

use clap::Args;
use starfish_core::{
    AlgorithmError, ClapAlgorithm, ImageStack, NamedAlgorithm, RegistrationAlgorithm,
    existing_path,
};
use tracing::{info, instrument};

use crate::{
    errors::FourierShiftError,
    fft::Fft2d,
    phase::{Shift, apply_shift, estimate_shift},
};

/// Descriptor registering [`FourierShiftRegistration`] with the dispatcher.
pub static DESCRIPTOR: ClapAlgorithm<FourierShiftRegistration> = ClapAlgorithm::new();

/// Registers each round against a reference image by phase correlation.
///
/// The reference is the maximum projection over channels of the first round,
/// taken from `reference_stack` when supplied and from the input stack
/// otherwise. Every channel of a round is translated by the shift estimated
/// for that round's maximum projection.
///
/// # Examples
/// ```
/// use starfish_core::{ImageStack, StackShape};
/// use starfish_registration_fourier::FourierShiftRegistration;
///
/// let mut stack = ImageStack::zeros(StackShape::new(2, 1, 4, 4))?;
/// stack.tile_mut(0, 0)?[5] = 1.0;
/// stack.tile_mut(1, 0)?[6] = 1.0;
///
/// let algorithm = FourierShiftRegistration { upsampling: 1, reference_stack: None };
/// let shifts = algorithm.register(&mut stack)?;
/// assert_eq!((shifts[1].dy, shifts[1].dx), (0.0, -1.0));
/// assert!((stack.tile(1, 0)?[5] - 1.0).abs() < 1e-5);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct FourierShiftRegistration {
    /// Sub-pixel resolution of the shift estimate (1 = whole pixels).
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..),
    )]
    pub upsampling: u32,

    /// Stack whose first round provides the reference image.
    #[arg(long = "reference-stack", value_name = "PATH", value_parser = existing_path)]
    pub reference_stack: Option<PathBuf>,
}

impl NamedAlgorithm for FourierShiftRegistration {
    const NAME: &'static str = "fourier_shift";
    const ABOUT: &'static str = "Align rounds to a reference image by phase correlation.";
}

impl RegistrationAlgorithm for FourierShiftRegistration {
    fn run(&self, stack: &mut ImageStack) -> Result<(), AlgorithmError> {
        self.register(stack)
            .map(|_| ())
            .map_err(|err| AlgorithmError::failed(Self::NAME, err))
    }
}

impl FourierShiftRegistration {
    /// Registers `stack` in place and returns the shift applied to each round.
    ///
    /// # Errors
    /// Returns [`FourierShiftError::Reference`] when the reference stack
    /// cannot be read and [`FourierShiftError::GeometryMismatch`] when its
    /// tiles differ in size from the input tiles.
    #[instrument(
        name = "fourier_shift.register",
        err,
        skip(self, stack),
        fields(upsampling = self.upsampling, rounds = stack.shape().rounds),
    )]
    pub fn register(&self, stack: &mut ImageStack) -> Result<Vec<Shift>, FourierShiftError> {
        let shape = stack.shape();
        let fft = Fft2d::new(shape.height, shape.width);
        let reference = fft.forward(&self.reference_image(stack)?);

        let mut shifts = Vec::with_capacity(shape.rounds);
        for round in 0..shape.rounds {
            let projection = stack.max_projection(round)?;
            let shift = estimate_shift(&fft, &reference, &projection, self.upsampling);
            info!(round, dy = shift.dy, dx = shift.dx, "estimated round shift");
            for channel in 0..shape.channels {
                let tile = stack.tile_mut(round, channel)?;
                let shifted = apply_shift(&fft, tile, shift);
                tile.copy_from_slice(&shifted);
            }
            shifts.push(shift);
        }
        Ok(shifts)
    }

    fn reference_image(&self, stack: &ImageStack) -> Result<Vec<f32>, FourierShiftError> {
        let Some(path) = &self.reference_stack else {
            return Ok(stack.max_projection(0)?);
        };
        let reference = ImageStack::read(path).map_err(FourierShiftError::Reference)?;
        let (expected, actual) = (stack.shape(), reference.shape());
        if (expected.height, expected.width) != (actual.height, actual.width) {
            return Err(FourierShiftError::GeometryMismatch {
                reference_height: actual.height,
                reference_width: actual.width,
                height: expected.height,
                width: expected.width,
            });
        }
        Ok(reference.max_projection(0)?)
    }
}
