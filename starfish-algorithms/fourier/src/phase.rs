//! Phase correlation shift estimation and Fourier-domain translation.
use std::f64::consts::TAU;

use rustfft::num_complex::Complex;

use crate::fft::{Fft2d, Spectrum, signed_frequency};

/// Translation in pixels, `dy` along rows and `dx` along columns.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Shift {
    /// Row offset.
    pub dy: f64,
    /// Column offset.
    pub dx: f64,
}

impl Shift {
    /// Creates a shift from its two components.
    #[must_use]
    pub const fn new(dy: f64, dx: f64) -> Self {
        Self { dy, dx }
    }

    /// Returns whether both components are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.dy == 0.0 && self.dx == 0.0
    }
}

const MAGNITUDE_FLOOR: f64 = 1e-12;

/// Estimates the translation that aligns `moving` onto the reference.
///
/// `reference` is the forward transform of the reference image. The result is
/// quantised to `1 / upsampling` pixels; an upsampling of one yields whole
/// pixel shifts.
pub(crate) fn estimate_shift(
    fft: &Fft2d,
    reference: &Spectrum,
    moving: &[f32],
    upsampling: u32,
) -> Shift {
    let moving = fft.forward(moving);
    let mut cross: Spectrum = reference
        .iter()
        .zip(&moving)
        .map(|(r, m)| {
            let product = r * m.conj();
            let magnitude = product.norm();
            if magnitude > MAGNITUDE_FLOOR {
                product / magnitude
            } else {
                Complex::new(0.0, 0.0)
            }
        })
        .collect();
    fft.inverse(&mut cross);
    let surface: Vec<f64> = cross.iter().map(|value| value.re).collect();

    let (height, width) = (fft.height(), fft.width());
    let peak = surface
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (index, &value)| {
            if value > best.1 { (index, value) } else { best }
        })
        .0;
    let (peak_row, peak_column) = (peak / width, peak % width);

    let mut shift = Shift::new(
        signed_frequency(peak_row, height),
        signed_frequency(peak_column, width),
    );
    if upsampling > 1 {
        let at = |row: usize, column: usize| surface[row * width + column];
        if height > 2 {
            let offset = parabolic_offset(
                at((peak_row + height - 1) % height, peak_column),
                at(peak_row, peak_column),
                at((peak_row + 1) % height, peak_column),
            );
            shift.dy += quantise(offset, upsampling);
        }
        if width > 2 {
            let offset = parabolic_offset(
                at(peak_row, (peak_column + width - 1) % width),
                at(peak_row, peak_column),
                at(peak_row, (peak_column + 1) % width),
            );
            shift.dx += quantise(offset, upsampling);
        }
    }
    shift
}

/// Translates `image` by `shift` using the Fourier shift theorem.
///
/// Content leaving one edge re-enters on the opposite edge.
pub(crate) fn apply_shift(fft: &Fft2d, image: &[f32], shift: Shift) -> Vec<f32> {
    if shift.is_zero() {
        return image.to_vec();
    }
    let (height, width) = (fft.height(), fft.width());
    let mut spectrum = fft.forward(image);
    for row in 0..height {
        let fy = signed_frequency(row, height) / height as f64;
        for column in 0..width {
            let fx = signed_frequency(column, width) / width as f64;
            let phase = -TAU * (fy * shift.dy + fx * shift.dx);
            spectrum[row * width + column] *= Complex::from_polar(1.0, phase);
        }
    }
    fft.inverse(&mut spectrum);
    spectrum.iter().map(|value| value.re as f32).collect()
}

fn parabolic_offset(before: f64, peak: f64, after: f64) -> f64 {
    let curvature = before - 2.0 * peak + after;
    if curvature.abs() < MAGNITUDE_FLOOR {
        return 0.0;
    }
    (0.5 * (before - after) / curvature).clamp(-0.5, 0.5)
}

fn quantise(offset: f64, upsampling: u32) -> f64 {
    let steps = f64::from(upsampling);
    (offset * steps).round() / steps
}
