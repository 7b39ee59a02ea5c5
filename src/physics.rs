//! Physical constants of the electron beam
//!
//! The constants are gathered in [PhysicsConstants], built once and shared
//! read-only by every optics computation.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Electron rest mass [kg]
pub const ELECTRON_MASS: f64 = 9.10938356e-31;
/// Elementary charge [C]
pub const ELEMENTARY_CHARGE: f64 = 1.60217662e-19;
/// Speed of light in vacuum [m/s]
pub const SPEED_OF_LIGHT: f64 = 299792458.;
/// Planck constant [J.s]
pub const PLANCK: f64 = 6.62607004e-34;

/// Physical constants used to derive the electron wave properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConstants {
    /// electron rest mass [kg]
    pub electron_mass: f64,
    /// elementary charge [C]
    pub elementary_charge: f64,
    /// speed of light [m/s]
    pub speed_of_light: f64,
    /// Planck constant [J.s]
    pub planck: f64,
}
impl Default for PhysicsConstants {
    fn default() -> Self {
        Self {
            electron_mass: ELECTRON_MASS,
            elementary_charge: ELEMENTARY_CHARGE,
            speed_of_light: SPEED_OF_LIGHT,
            planck: PLANCK,
        }
    }
}
impl PhysicsConstants {
    /// Relativistic electron wavelength [m] for an acceleration `voltage` [V]
    pub fn wavelength(&self, voltage: f64) -> f64 {
        let Self {
            electron_mass: m,
            elementary_charge: e,
            speed_of_light: c,
            planck: h,
        } = *self;
        h / (2. * m * e * voltage * (1. + e * voltage / (2. * m * c * c))).sqrt()
    }
    /// Relativistic electron mass [kg] at the acceleration `voltage` [V]
    pub fn relativistic_mass(&self, voltage: f64) -> f64 {
        self.electron_mass + self.elementary_charge * voltage / self.speed_of_light.powi(2)
    }
    /// Interaction constant of the transmission function [1/(V.m)]
    pub fn interaction_constant(&self, voltage: f64) -> f64 {
        2. * PI * self.relativistic_mass(voltage) * self.elementary_charge * self.wavelength(voltage)
            / self.planck.powi(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wavelength_300kv() {
        let lambda = PhysicsConstants::default().wavelength(300e3);
        // 1.9687 pm at 300kV
        assert!((lambda - 1.9687e-12).abs() < 1e-15, "{lambda}");
    }

    #[test]
    fn wavelength_200kv() {
        let lambda = PhysicsConstants::default().wavelength(200e3);
        assert!((lambda - 2.5079e-12).abs() < 1e-15, "{lambda}");
    }

    #[test]
    fn mass_increases_with_voltage() {
        let constants = PhysicsConstants::default();
        assert_eq!(constants.relativistic_mass(0.), ELECTRON_MASS);
        assert!(constants.relativistic_mass(300e3) > constants.relativistic_mass(100e3));
    }
}
