//! # Transmission electron microscope optics
//!
//! Fourier-domain models for the image simulation of a transmission electron microscope:
//!  - [frequency]: spatial frequency magnitude grids,
//!  - [optics]: contrast transfer functions, specimen transmission function and Fresnel propagator,
//!  - [detector]: detector DQE/MTF response maps fitted from empirical curves,
//!  - [fit]: the sinc-squared model and its least-squares fit,
//!  - [radial]: radial profiles of square 2D maps,
//!  - [display]: optional rendering of the radial profiles.
//!
//! ```no_run
//! use tem_optics::{Microscope, OpticalParameters};
//!
//! let params = OpticalParameters::new(1e-10, 2e-6).sigma_decay(0.4);
//! let ctf = Microscope::default().create_ctf(&[128, 128], &params)?;
//! # Ok::<(), tem_optics::Error>(())
//! ```

pub mod detector;
pub mod display;
mod error;
pub mod fit;
pub mod frequency;
pub mod optics;
pub mod physics;
pub mod radial;

pub use detector::{CurveFolder, CurveSource, DetectorCurve, DetectorResponse, ResponseFunction};
pub use display::{Metadata, Render, Series};
pub use error::Error;
pub use fit::{SincSquareFit, SincSquareParams};
pub use optics::{Microscope, OpticalParameters};
pub use physics::PhysicsConstants;
pub use radial::RadialProfile;

pub type Result<T> = std::result::Result<T, Error>;
