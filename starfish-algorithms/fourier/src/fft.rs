//! Two-dimensional FFT over row-major buffers.
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

pub(crate) type Spectrum = Vec<Complex<f64>>;

/// Forward and inverse plans for one tile geometry.
pub(crate) struct Fft2d {
    height: usize,
    width: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    column_forward: Arc<dyn Fft<f64>>,
    column_inverse: Arc<dyn Fft<f64>>,
}

impl Fft2d {
    pub(crate) fn new(height: usize, width: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            height,
            width,
            row_forward: planner.plan_fft_forward(width),
            row_inverse: planner.plan_fft_inverse(width),
            column_forward: planner.plan_fft_forward(height),
            column_inverse: planner.plan_fft_inverse(height),
        }
    }

    pub(crate) const fn height(&self) -> usize {
        self.height
    }

    pub(crate) const fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn forward(&self, image: &[f32]) -> Spectrum {
        debug_assert_eq!(image.len(), self.height * self.width);
        let mut buffer: Spectrum = image
            .iter()
            .map(|&value| Complex::new(f64::from(value), 0.0))
            .collect();
        self.transform(&mut buffer, &self.row_forward, &self.column_forward);
        buffer
    }

    /// Inverse transform, normalised so `inverse(forward(x)) == x`.
    pub(crate) fn inverse(&self, spectrum: &mut Spectrum) {
        self.transform(spectrum, &self.row_inverse, &self.column_inverse);
        let scale = 1.0 / (self.height * self.width) as f64;
        for value in spectrum.iter_mut() {
            *value *= scale;
        }
    }

    fn transform(&self, buffer: &mut Spectrum, rows: &Arc<dyn Fft<f64>>, columns: &Arc<dyn Fft<f64>>) {
        rows.process(buffer);
        let mut transposed = transpose(buffer, self.height, self.width);
        columns.process(&mut transposed);
        *buffer = transpose(&transposed, self.width, self.height);
    }
}

fn transpose(buffer: &[Complex<f64>], height: usize, width: usize) -> Spectrum {
    let mut out = vec![Complex::new(0.0, 0.0); buffer.len()];
    for row in 0..height {
        for column in 0..width {
            out[column * height + row] = buffer[row * width + column];
        }
    }
    out
}

/// Signed frequency index for bin `index` of an `extent`-point transform.
pub(crate) fn signed_frequency(index: usize, extent: usize) -> f64 {
    if index > extent / 2 {
        index as f64 - extent as f64
    } else {
        index as f64
    }
}
