//! Fourier-shift registration: aligns every imaging round to a reference
//! image using phase correlation and translates the tiles in frequency space.

mod algorithm;
mod errors;
mod fft;
mod phase;

pub use algorithm::{DESCRIPTOR, FourierShiftRegistration};
pub use errors::FourierShiftError;
pub use phase::Shift;
