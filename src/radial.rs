//! Radial averaging of square 2D arrays
//!
//! Used to inspect frequency domain functions (CTF, DQE, MTF, ...) as 1D
//! profiles.

use ndarray::{ArrayBase, Data, Dimension, Ix2};
use serde::Serialize;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RadialError {
    #[error("radial average calculation only works for 2d arrays, found {0} dimensions")]
    NotTwoDimensional(usize),
    #[error("differently sized dimensions ({0}x{1}), cannot perform radial averaging")]
    NotSquare(usize, usize),
}
pub type Result<T> = std::result::Result<T, RadialError>;

/// Radial profile: mean values of concentric 1 pixel wide rings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RadialProfile {
    /// ring radius [pixel]
    pub radius: Vec<f64>,
    /// mean value within the ring
    pub mean: Vec<f64>,
}
impl RadialProfile {
    pub fn len(&self) -> usize {
        self.radius.len()
    }
    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }
    /// Iterator over the (radius, mean) pairs
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.radius.iter().cloned().zip(self.mean.iter().cloned())
    }
}

/// Computes the radial average of a square image
///
/// For each radius `r` in `1..=size/2`, averages the samples at a distance
/// in `[r-0.5, r+0.5)` from the image center `(size-1)/2`.
/// Rings without any sample have a NaN mean.
pub fn radial_average<S, D>(image: &ArrayBase<S, D>) -> Result<RadialProfile>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let image = image
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| RadialError::NotTwoDimensional(image.ndim()))?;
    let (rows, cols) = image.dim();
    if rows != cols {
        return Err(RadialError::NotSquare(rows, cols));
    }
    let size = rows;
    let center = (size as f64 - 1.) / 2.;
    let n_ring = size / 2;

    let mut sum = vec![0f64; n_ring];
    let mut count = vec![0usize; n_ring];
    for ((i, j), &value) in image.indexed_iter() {
        let radius = (i as f64 - center).hypot(j as f64 - center);
        // ring r holds radius in [r-0.5, r+0.5)
        let ring = (radius + 0.5).floor();
        if ring < 1. || ring > n_ring as f64 {
            continue;
        }
        let k = ring as usize - 1;
        sum[k] += value;
        count[k] += 1;
    }

    let (radius, mean) = sum
        .into_iter()
        .zip(count)
        .enumerate()
        .map(|(k, (s, c))| {
            (
                (k + 1) as f64,
                if c > 0 { s / c as f64 } else { f64::NAN },
            )
        })
        .unzip();
    Ok(RadialProfile { radius, mean })
}
