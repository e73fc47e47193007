//! Synthetic single-tile images for registration tests.
//!
//! Images are row-major `f32` buffers of `height * width` pixels.

/// Renders isotropic Gaussian spots centred at `(row, column)` positions.
///
/// # Examples
/// ```
/// use starfish_test_support::images::{brightest_pixel, gaussian_spots};
///
/// let image = gaussian_spots(16, 16, &[(4.0, 9.0)], 1.5);
/// assert_eq!(brightest_pixel(&image, 16), (4, 9));
/// ```
#[must_use]
pub fn gaussian_spots(height: usize, width: usize, spots: &[(f32, f32)], sigma: f32) -> Vec<f32> {
    let denominator = 2.0 * sigma * sigma;
    let mut image = vec![0.0_f32; height * width];
    for (index, pixel) in image.iter_mut().enumerate() {
        let row = (index / width) as f32;
        let column = (index % width) as f32;
        *pixel = spots
            .iter()
            .map(|&(spot_row, spot_column)| {
                let dy = row - spot_row;
                let dx = column - spot_column;
                (-(dy * dy + dx * dx) / denominator).exp()
            })
            .sum();
    }
    image
}

/// Circularly shifts `image` by `(dy, dx)` pixels.
///
/// A pixel at `(r, c)` moves to `((r + dy) mod height, (c + dx) mod width)`.
///
/// # Examples
/// ```
/// use starfish_test_support::images::roll;
///
/// let image = vec![1.0, 2.0, 3.0, 4.0];
/// assert_eq!(roll(&image, 2, 2, 1, 0), vec![3.0, 4.0, 1.0, 2.0]);
/// ```
#[must_use]
pub fn roll(image: &[f32], height: usize, width: usize, dy: isize, dx: isize) -> Vec<f32> {
    assert_eq!(image.len(), height * width, "image does not match geometry");
    let mut out = vec![0.0_f32; image.len()];
    for row in 0..height {
        for column in 0..width {
            let target_row = wrap(row, dy, height);
            let target_column = wrap(column, dx, width);
            out[target_row * width + target_column] = image[row * width + column];
        }
    }
    out
}

/// Location `(row, column)` of the largest pixel; ties keep the first.
#[must_use]
pub fn brightest_pixel(image: &[f32], width: usize) -> (usize, usize) {
    let index = image
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (index, &value)| {
            if value > best.1 { (index, value) } else { best }
        })
        .0;
    (index / width, index % width)
}

fn wrap(position: usize, offset: isize, extent: usize) -> usize {
    let extent = extent as isize;
    (position as isize + offset).rem_euclid(extent) as usize
}
