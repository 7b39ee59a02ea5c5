use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, Axis};

/// Normalized 1D gaussian kernel truncated at 4 standard deviations
fn gaussian_kernel(sigma: f64) -> Array1<f64> {
    let radius = (4. * sigma + 0.5) as isize;
    let kernel = Array1::from_shape_fn((2 * radius + 1) as usize, |i| {
        let x = (i as isize - radius) as f64;
        (-0.5 * x * x / (sigma * sigma)).exp()
    });
    let sum = kernel.sum();
    kernel / sum
}

/// Reflects an out of bounds index: `d c b a | a b c d | d c b a`
fn reflect(index: isize, n: isize) -> usize {
    let period = 2 * n;
    let m = index.rem_euclid(period);
    (if m >= n { period - m - 1 } else { m }) as usize
}

fn convolve_line(input: ArrayView1<f64>, mut output: ArrayViewMut1<f64>, kernel: &Array1<f64>) {
    let n = input.len() as isize;
    let radius = (kernel.len() / 2) as isize;
    for (i, value) in output.iter_mut().enumerate() {
        *value = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * input[reflect(i as isize + k as isize - radius, n)])
            .sum();
    }
}

/// Separable gaussian filter with reflective boundaries
pub fn gaussian_filter(image: &Array2<f64>, sigma: f64) -> Array2<f64> {
    if sigma <= 0. || image.is_empty() {
        return image.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let mut rows = Array2::<f64>::zeros(image.raw_dim());
    for (input, output) in image.axis_iter(Axis(0)).zip(rows.axis_iter_mut(Axis(0))) {
        convolve_line(input, output, &kernel);
    }
    let mut filtered = Array2::<f64>::zeros(image.raw_dim());
    for (input, output) in rows.axis_iter(Axis(1)).zip(filtered.axis_iter_mut(Axis(1))) {
        convolve_line(input, output, &kernel);
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized() {
        let kernel = gaussian_kernel(3.);
        assert_eq!(kernel.len(), 25);
        assert!((kernel.sum() - 1.).abs() < 1e-12);
        assert_eq!(kernel[0], kernel[24]);
    }

    #[test]
    fn reflective_indices() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(9, 4), 1);
        assert_eq!(reflect(2, 4), 2);
    }

    #[test]
    fn preserves_constant_image() {
        let image = Array2::from_elem((16, 16), 1.);
        let filtered = gaussian_filter(&image, 3.);
        assert!(filtered.iter().all(|v| (v - 1.).abs() < 1e-12));
    }

    #[test]
    fn smooths_a_step() {
        let image = Array2::from_shape_fn((32, 32), |(_, j)| if j < 16 { 1. } else { 0. });
        let filtered = gaussian_filter(&image, 3.);
        // edge value at the step is halfway
        assert!((filtered[[10, 15]] + filtered[[10, 16]] - 1.).abs() < 1e-12);
        assert!(filtered[[10, 15]] < 1. && filtered[[10, 15]] > 0.5);
        // far from the step the image is unchanged
        assert!((filtered[[10, 0]] - 1.).abs() < 1e-6);
        assert!(filtered[[10, 31]].abs() < 1e-6);
        // no smoothing across rows
        assert!((filtered[[0, 15]] - filtered[[31, 15]]).abs() < 1e-12);
    }
}
