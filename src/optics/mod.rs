//! Electron optics of the microscope
//!
//! The [Microscope] gathers the physical constants and an optional diagnostic
//! renderer, and provides:
//!  - the specimen [transmission function](Microscope::transmission_function),
//!  - the [Fresnel propagator](Microscope::fresnel_propagator),
//!  - the real [CTF](Microscope::create_ctf) after detection,
//!  - the phase only [complex CTF](Microscope::create_simple_complex_ctf),
//!  - the [complex CTF](Microscope::create_complex_ctf) with astigmatism,
//!    partial coherence envelopes and objective aperture.

use crate::{display::Render, frequency, frequency::GridError, physics::PhysicsConstants};
use ndarray::{Array, Array2, ArrayBase, Data, Dimension};
use num_complex::Complex64;
use std::f64::consts::PI;

mod ctf;
mod parameters;
mod smoothing;
pub use parameters::OpticalParameters;
pub use smoothing::gaussian_filter;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum OpticsError {
    #[error("failed to build the frequency grid")]
    Grid(#[from] GridError),
    #[error("the image shape must have 2 identical dimensions, found {0:?}")]
    NotSquareImage(Vec<usize>),
    #[error(
        "invalid astigmatism {astigmatism:e}m for a defocus of {defocus:e}m, \
         the astigmatic defoci must have the sign of the defocus"
    )]
    Astigmatism { defocus: f64, astigmatism: f64 },
}
pub type Result<T> = std::result::Result<T, OpticsError>;

/// Microscope electron optics
#[derive(Default, Clone, Copy)]
pub struct Microscope<'a> {
    constants: PhysicsConstants,
    renderer: Option<&'a dyn Render>,
}
impl<'a> Microscope<'a> {
    pub fn new(constants: PhysicsConstants) -> Self {
        Self {
            constants,
            renderer: None,
        }
    }
    /// Renders the radial profiles of the contrast transfer functions
    pub fn display(self, renderer: &'a dyn Render) -> Self {
        Self {
            renderer: Some(renderer),
            ..self
        }
    }
    pub fn constants(&self) -> &PhysicsConstants {
        &self.constants
    }
    /// Electron wavelength [m]
    pub fn wavelength(&self, voltage: f64) -> f64 {
        self.constants.wavelength(voltage)
    }
    /// Specimen transmission function `exp(iσV dz)` of a potential slice `V` [V] of thickness `dz` [m]
    pub fn transmission_function<S, D>(
        &self,
        sliced_potential: &ArrayBase<S, D>,
        voltage: f64,
        dz: f64,
    ) -> Array<Complex64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let sigma = self.constants.interaction_constant(voltage);
        sliced_potential.mapv(|v| Complex64::from_polar(1., sigma * v * dz))
    }
    /// Fresnel propagator `exp(-iπλk²dz)` over a distance `dz` [m]
    pub fn fresnel_propagator(
        &self,
        image_size: usize,
        pixel_size: f64,
        voltage: f64,
        dz: f64,
    ) -> Result<Array2<Complex64>> {
        let lambda = self.wavelength(voltage);
        let k = frequency::fourier_array_2d(image_size, 1. / (2. * pixel_size))?;
        Ok(k.mapv(|k| Complex64::from_polar(1., -PI * lambda * k * k * dz)))
    }
}

impl std::fmt::Debug for Microscope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Microscope")
            .field("constants", &self.constants)
            .field("display", &self.renderer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn transmission_is_a_phase_object() {
        let microscope = Microscope::default();
        let potential = Array3::from_shape_fn((4, 4, 4), |(i, j, k)| (i + j + k) as f64);
        let t = microscope.transmission_function(&potential, 300e3, 1e-10);
        assert_eq!(t.dim(), (4, 4, 4));
        assert!(t.iter().all(|t| (t.norm() - 1.).abs() < 1e-12));
        assert_eq!(t[[0, 0, 0]], Complex64::new(1., 0.));
        let sigma = microscope.constants().interaction_constant(300e3);
        let phase = t[[1, 2, 0]].arg();
        assert!((phase - sigma * 3. * 1e-10).abs() < 1e-12);
    }

    #[test]
    fn interaction_constant_300kv() {
        // σ = 6.526e-3 rad/(V.nm) at 300kV
        let sigma = Microscope::default().constants().interaction_constant(300e3);
        assert!((sigma * 1e-9 - 6.526e-3).abs() < 1e-6, "{sigma}");
    }

    #[test]
    fn propagator_has_unit_modulus() {
        let microscope = Microscope::default();
        let p = microscope
            .fresnel_propagator(64, 1e-10, 300e3, 5e-9)
            .unwrap();
        assert_eq!(p.dim(), (64, 64));
        assert!(p.iter().all(|p| (p.norm() - 1.).abs() < 1e-12));
        assert_eq!(p[[32, 32]], Complex64::new(1., 0.));
        let lambda = microscope.wavelength(300e3);
        let k = 1. / (2. * 1e-10) / 32.;
        let expected = Complex64::from_polar(1., -PI * lambda * k * k * 5e-9);
        assert!((p[[32, 33]] - expected).norm() < 1e-9);
    }

    #[test]
    fn propagation_over_zero_distance_is_identity() {
        let p = Microscope::default()
            .fresnel_propagator(16, 1e-10, 200e3, 0.)
            .unwrap();
        assert!(p.iter().all(|&p| p == Complex64::new(1., 0.)));
        assert!(Microscope::default()
            .fresnel_propagator(16, -1e-10, 200e3, 1e-9)
            .is_err());
    }
}
