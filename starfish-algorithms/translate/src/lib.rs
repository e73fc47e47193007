//! Fixed-offset registration: translates every tile by a user-supplied
//! whole-pixel shift.

mod algorithm;
mod shift;

pub use algorithm::{DESCRIPTOR, TranslateError, TranslateRegistration};
pub use shift::{ParsePixelShiftError, PixelShift};
