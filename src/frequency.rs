//! Spatial frequency grids
//!
//! A frequency map holds, at every sample of a square (or cubic) grid, the
//! magnitude of the spatial frequency vector. Each axis spans
//! `[-nyquist, nyquist)` with `size` evenly spaced samples.

use ndarray::{Array1, Array2, ArrayD, Dimension, IxDyn, Zip};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GridError {
    #[error("the grid shape is empty")]
    Empty,
    #[error("too many dimensions ({0}), 3 is max")]
    TooManyDimensions(usize),
    #[error("dimensions are not identical: {0:?}")]
    Unequal(Vec<usize>),
    #[error("the grid size must be strictly positive")]
    ZeroSize,
    #[error("the Nyquist frequency must be finite and strictly positive, found {0}")]
    InvalidNyquist(f64),
}
pub type Result<T> = std::result::Result<T, GridError>;

/// Validates a square/cubic grid shape and returns the common size
pub fn grid_size(shape: &[usize]) -> Result<usize> {
    let size = *shape.first().ok_or(GridError::Empty)?;
    if shape.len() > 3 {
        return Err(GridError::TooManyDimensions(shape.len()));
    }
    if shape.iter().any(|&n| n != size) {
        return Err(GridError::Unequal(shape.to_vec()));
    }
    if size == 0 {
        return Err(GridError::ZeroSize);
    }
    Ok(size)
}

/// Frequency samples along one axis: `-nyquist + i * 2 * nyquist / size`
pub fn frequency_axis(size: usize, nyquist: f64) -> Array1<f64> {
    let step = 2. * nyquist / size as f64;
    Array1::from_shape_fn(size, |i| -nyquist + i as f64 * step)
}

/// Returns the spatial frequency magnitude over a grid of the given `shape`
pub fn fourier_array(shape: &[usize], nyquist: f64) -> Result<ArrayD<f64>> {
    let size = grid_size(shape)?;
    if !nyquist.is_finite() || nyquist <= 0. {
        return Err(GridError::InvalidNyquist(nyquist));
    }
    log::debug!(
        "building {}D frequency grid of size {} (Nyquist: {:e})",
        shape.len(),
        size,
        nyquist
    );
    let axis = frequency_axis(size, nyquist);
    let mut k = ArrayD::<f64>::zeros(IxDyn(shape));
    for (index, value) in k.indexed_iter_mut() {
        *value = index
            .slice()
            .iter()
            .map(|&i| axis[i] * axis[i])
            .sum::<f64>()
            .sqrt();
    }
    Ok(k)
}

/// Returns the spatial frequency magnitude over a `size`x`size` grid
pub fn fourier_array_2d(size: usize, nyquist: f64) -> Result<Array2<f64>> {
    if size == 0 {
        return Err(GridError::ZeroSize);
    }
    if !nyquist.is_finite() || nyquist <= 0. {
        return Err(GridError::InvalidNyquist(nyquist));
    }
    let axis = frequency_axis(size, nyquist);
    let mut k = Array2::<f64>::zeros((size, size));
    Zip::indexed(&mut k).for_each(|(i, j), value| {
        *value = (axis[i] * axis[i] + axis[j] * axis[j]).sqrt();
    });
    Ok(k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Ix2;

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(fourier_array(&[], 1.).unwrap_err(), GridError::Empty);
        assert_eq!(
            fourier_array(&[4, 4, 4, 4], 1.).unwrap_err(),
            GridError::TooManyDimensions(4)
        );
        assert_eq!(
            fourier_array(&[4, 5], 1.).unwrap_err(),
            GridError::Unequal(vec![4, 5])
        );
        assert_eq!(fourier_array(&[0, 0], 1.).unwrap_err(), GridError::ZeroSize);
        assert!(matches!(
            fourier_array(&[4, 4], 0.).unwrap_err(),
            GridError::InvalidNyquist(_)
        ));
    }

    #[test]
    fn axis_covers_half_open_range() {
        let axis = frequency_axis(8, 1.);
        assert_eq!(axis.len(), 8);
        assert_eq!(axis[0], -1.);
        assert_eq!(axis[4], 0.);
        assert_eq!(axis[7], 0.75);
    }

    #[test]
    fn center_is_zero_frequency() {
        let k = fourier_array(&[16, 16], 0.5).unwrap();
        assert_eq!(k[[8, 8]], 0.);
        let k = fourier_array(&[8, 8, 8], 2.).unwrap();
        assert_eq!(k[[4, 4, 4]], 0.);
        let min = k.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(min, 0.);
    }

    #[test]
    fn odd_grid_minimum_near_center() {
        let k = fourier_array(&[7, 7], 1.).unwrap();
        let min = k.iter().cloned().fold(f64::INFINITY, f64::min);
        // samples are -1 + 2i/7, the smallest magnitude is 1/7 on each axis
        assert!((k[[3, 3]] - min).abs() < 1e-12);
        assert!((min - (2f64).sqrt() / 7.).abs() < 1e-12);
    }

    #[test]
    fn symmetric_about_center() {
        let n = 12;
        let k = fourier_array(&[n, n], 3.).unwrap();
        for i in 1..n {
            for j in 1..n {
                assert!((k[[i, j]] - k[[n - i, j]]).abs() < 1e-12);
                assert!((k[[i, j]] - k[[i, n - j]]).abs() < 1e-12);
            }
        }
        let n = 9;
        let k = fourier_array(&[n, n, n], 1.).unwrap();
        for i in 1..n {
            assert!((k[[i, 2, 5]] - k[[n - i, 2, 5]]).abs() < 1e-12);
            assert!((k[[2, i, 5]] - k[[2, n - i, 5]]).abs() < 1e-12);
            assert!((k[[2, 5, i]] - k[[2, 5, n - i]]).abs() < 1e-12);
        }
    }

    #[test]
    fn corner_magnitude() {
        let k = fourier_array(&[10, 10, 10], 1.).unwrap();
        assert!((k[[0, 0, 0]] - 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn two_dimensional_shortcut_matches() {
        let k = fourier_array(&[32, 32], 5e9)
            .unwrap()
            .into_dimensionality::<Ix2>()
            .unwrap();
        let k2 = fourier_array_2d(32, 5e9).unwrap();
        assert_eq!(k, k2);
    }

    #[test]
    fn one_dimensional_profile() {
        let k = fourier_array(&[4], 1.).unwrap();
        assert_eq!(k.as_slice().unwrap(), &[1., 0.5, 0., 0.5]);
    }
}
