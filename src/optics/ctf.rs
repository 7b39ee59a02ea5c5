use super::{smoothing, Microscope, OpticalParameters, OpticsError, Result};
use crate::{
    display::{self, Metadata, Series},
    frequency,
};
use ndarray::{Array2, ArrayD, Axis, Zip};
use num_complex::Complex64;
use std::f64::consts::{LN_2, PI};

/// Gaussian decay envelope, 1 if `sigma_decay <= 0`
fn decay(k: f64, sigma_decay: f64, nyquist: f64) -> f64 {
    if sigma_decay <= 0. {
        1.
    } else {
        (-(k / (sigma_decay * nyquist)).powi(2)).exp()
    }
}

/// Returns the size of a square 2D image shape
fn square_image(shape: &[usize]) -> Result<usize> {
    match shape {
        [n, m] if n == m => Ok(*n),
        _ => Err(OpticsError::NotSquareImage(shape.to_vec())),
    }
}

fn metadata(title: &str, params: &OpticalParameters) -> Metadata {
    Metadata::new(title).description(format!(
        "defocus: {:.2}µm, {:.0}kV",
        params.defocus * 1e6,
        params.voltage * 1e-3
    ))
}

impl Microscope<'_> {
    /// Real contrast transfer function after detection
    ///
    /// `shape` is either 2D or 3D with identical dimensions.
    /// The CTF is `-sqrt(1-A²)sin(χ) - A cos(χ)` with the phase
    /// `χ = πλΔf k² - π/2 C_s λ³ k⁴`, damped by the gaussian decay
    /// `exp(-(k/(σ k_N))²)` if `σ > 0`.
    pub fn create_ctf(&self, shape: &[usize], params: &OpticalParameters) -> Result<ArrayD<f64>> {
        let nyquist = params.nyquist();
        let k = frequency::fourier_array(shape, nyquist)?;
        let lambda = self.wavelength(params.voltage);
        let amplitude = params.amplitude_contrast;
        let phase = (1. - amplitude * amplitude).sqrt();
        let ctf = k.mapv(|k| {
            let k2 = k * k;
            let chi = PI * lambda * params.defocus * k2
                - 0.5 * PI * params.spherical_aberration * lambda.powi(3) * k2 * k2;
            (-phase * chi.sin() - amplitude * chi.cos()) * decay(k, params.sigma_decay, nyquist)
        });
        display::render_or_warn(
            self.renderer,
            || {
                // volumes are profiled through their central z-slice
                let series = if ctf.ndim() == 3 {
                    Series::from_real("ctf", &ctf.index_axis(Axis(2), shape[2] / 2))?
                } else {
                    Series::from_real("ctf", &ctf)?
                };
                Ok(vec![series])
            },
            metadata("ctf", params),
        );
        Ok(ctf)
    }

    /// Phase only complex contrast transfer function of a square image
    ///
    /// `exp(-iπ/2 (C_s λ³ k⁴ - 2Δf λ k²))` damped by the gaussian decay if `σ > 0`.
    pub fn create_simple_complex_ctf(
        &self,
        shape: &[usize],
        params: &OpticalParameters,
    ) -> Result<Array2<Complex64>> {
        let size = square_image(shape)?;
        let nyquist = params.nyquist();
        let k = frequency::fourier_array_2d(size, nyquist)?;
        let lambda = self.wavelength(params.voltage);
        let ctf = k.mapv(|k| {
            let k2 = k * k;
            let chi = 0.5
                * PI
                * (params.spherical_aberration * lambda.powi(3) * k2 * k2
                    - 2. * params.defocus * lambda * k2);
            Complex64::from_polar(decay(k, params.sigma_decay, nyquist), -chi)
        });
        display::render_or_warn(
            self.renderer,
            || Series::from_complex("ctf", &ctf),
            metadata("ctf", params),
        );
        Ok(ctf)
    }

    /// Complex contrast transfer function of a square image
    ///
    /// The defocus is modulated by the astigmatism, the defoci along the
    /// astigmatism axes being `Δf ± Δf_a`.
    /// The phase term `exp(-iχ)` is multiplied by:
    ///  - the chromatic envelope from the energy spread and the chromatic aberration,
    ///  - the spatial coherence envelope from the illumination aperture,
    ///  - the objective aperture cutting frequencies above `2πD/(λf)`, with its edge
    ///    smoothed by a gaussian filter.
    pub fn create_complex_ctf(
        &self,
        shape: &[usize],
        params: &OpticalParameters,
    ) -> Result<Array2<Complex64>> {
        let size = square_image(shape)?;
        let &OpticalParameters {
            voltage,
            pixel_size,
            defocus,
            spherical_aberration: cs,
            chromatic_aberration: cc,
            energy_spread,
            illumination_aperture,
            objective_diameter,
            focal_length,
            astigmatism,
            astigmatism_angle,
            aperture_smoothing,
            ..
        } = params;
        let lambda = self.wavelength(voltage);
        let q_true = 1. / (size as f64 * pixel_size);

        let ratio_short = (defocus + astigmatism) / defocus;
        let ratio_long = defocus / (defocus - astigmatism);
        if !(ratio_short.is_finite() && ratio_short > 0. && ratio_long.is_finite() && ratio_long > 0.)
        {
            return Err(OpticsError::Astigmatism {
                defocus,
                astigmatism,
            });
        }
        let (stretch_short, stretch_long) = (ratio_short.sqrt(), ratio_long.sqrt());
        let (sin, cos) = astigmatism_angle.to_radians().sin_cos();

        // anisotropic (q) and symmetric (q_sym) frequency magnitudes
        let half = (size / 2) as f64;
        let mut q = Array2::<f64>::zeros((size, size));
        let mut q_sym = Array2::<f64>::zeros((size, size));
        Zip::indexed(&mut q)
            .and(&mut q_sym)
            .for_each(|(i, j), q, q_sym| {
                let (x, y) = (j as f64 - half, i as f64 - half);
                let x_rot = x * cos - y * sin;
                let y_rot = x * sin - y * cos;
                *q = (x_rot / stretch_long).hypot(y_rot * stretch_short) * q_true;
                *q_sym = x_rot.hypot(y_rot) * q_true;
            });

        let q_max = 2. * PI * objective_diameter / (lambda * focal_length);
        let aperture = smoothing::gaussian_filter(
            &q.mapv(|q| if q > q_max { 0. } else { 1. }),
            aperture_smoothing,
        );

        let h = cc * energy_spread / voltage;
        let chromatic_denominator = 4. * LN_2.sqrt();
        let mut ctf = Array2::<Complex64>::zeros((size, size));
        Zip::from(&mut ctf)
            .and(&q)
            .and(&q_sym)
            .and(&aperture)
            .for_each(|ctf, &q, &q_sym, &aperture| {
                let q2 = q * q;
                let chi = 0.5 * PI * (cs * lambda.powi(3) * q_sym.powi(4) - 2. * defocus * lambda * q2);
                let chromatic = (-(PI * lambda * q2 * h / chromatic_denominator).powi(2)).exp();
                let spatial = (-(PI * cs * lambda * lambda * q2 * q - PI * defocus * q).powi(2)
                    * illumination_aperture.powi(2)
                    / LN_2)
                    .exp();
                *ctf = Complex64::from_polar(chromatic * spatial * aperture, -chi);
            });

        display::render_or_warn(
            self.renderer,
            || Series::from_complex("ctf", &ctf),
            metadata("ctf", params),
        );
        Ok(ctf)
    }
}
