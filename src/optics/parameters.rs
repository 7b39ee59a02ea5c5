use serde::{Deserialize, Serialize};

/// Microscope optical parameters
///
/// All values are in SI units except the energy spread [eV] and the
/// astigmatism angle [degree].
/// The defaults are the InSilicoTEM parameters of a 300kV microscope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalParameters {
    /// acceleration voltage [V]
    pub voltage: f64,
    /// pixel or voxel size [m]
    pub pixel_size: f64,
    /// defocus [m]
    pub defocus: f64,
    /// amplitude contrast fraction
    pub amplitude_contrast: f64,
    /// spherical aberration C_s [m]
    pub spherical_aberration: f64,
    /// chromatic aberration C_c [m]
    pub chromatic_aberration: f64,
    /// energy spread [eV]
    pub energy_spread: f64,
    /// illumination aperture [rad]
    pub illumination_aperture: f64,
    /// objective aperture diameter [m]
    pub objective_diameter: f64,
    /// focal length [m]
    pub focal_length: f64,
    /// astigmatism magnitude [m]
    pub astigmatism: f64,
    /// astigmatism angle [degree]
    pub astigmatism_angle: f64,
    /// gaussian decay width as a fraction of Nyquist, no decay if <= 0
    pub sigma_decay: f64,
    /// width of the gaussian filter smoothing the aperture edge [pixel], no smoothing if <= 0
    pub aperture_smoothing: f64,
}
impl Default for OpticalParameters {
    fn default() -> Self {
        Self {
            voltage: 300e3,
            pixel_size: 1e-10,
            defocus: 3e-6,
            amplitude_contrast: 0.1,
            spherical_aberration: 2.7e-3,
            chromatic_aberration: 2.7e-3,
            energy_spread: 0.7,
            illumination_aperture: 0.030e-3,
            objective_diameter: 100e-6,
            focal_length: 4.7e-3,
            astigmatism: 0.,
            astigmatism_angle: 0.,
            sigma_decay: 0.4,
            aperture_smoothing: 3.,
        }
    }
}
impl OpticalParameters {
    /// Creates the default parameters for a given pixel size and defocus [m]
    pub fn new(pixel_size: f64, defocus: f64) -> Self {
        Self {
            pixel_size,
            defocus,
            ..Default::default()
        }
    }
    pub fn voltage(self, voltage: f64) -> Self {
        Self { voltage, ..self }
    }
    pub fn amplitude_contrast(self, amplitude_contrast: f64) -> Self {
        Self {
            amplitude_contrast,
            ..self
        }
    }
    pub fn spherical_aberration(self, spherical_aberration: f64) -> Self {
        Self {
            spherical_aberration,
            ..self
        }
    }
    pub fn chromatic_aberration(self, chromatic_aberration: f64) -> Self {
        Self {
            chromatic_aberration,
            ..self
        }
    }
    pub fn energy_spread(self, energy_spread: f64) -> Self {
        Self {
            energy_spread,
            ..self
        }
    }
    pub fn illumination_aperture(self, illumination_aperture: f64) -> Self {
        Self {
            illumination_aperture,
            ..self
        }
    }
    /// Sets the objective aperture diameter and the focal length [m]
    pub fn objective(self, objective_diameter: f64, focal_length: f64) -> Self {
        Self {
            objective_diameter,
            focal_length,
            ..self
        }
    }
    /// Sets the astigmatism magnitude [m] and angle [degree]
    pub fn astigmatism(self, astigmatism: f64, astigmatism_angle: f64) -> Self {
        Self {
            astigmatism,
            astigmatism_angle,
            ..self
        }
    }
    pub fn sigma_decay(self, sigma_decay: f64) -> Self {
        Self {
            sigma_decay,
            ..self
        }
    }
    pub fn aperture_smoothing(self, aperture_smoothing: f64) -> Self {
        Self {
            aperture_smoothing,
            ..self
        }
    }
    /// Nyquist frequency [1/m]
    pub fn nyquist(&self) -> f64 {
        1. / (2. * self.pixel_size)
    }
}
