use crate::{
    detector::DetectorError, display::RenderError, fit::FitError, frequency::GridError,
    optics::OpticsError, radial::RadialError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `frequency` module")]
    Grid(#[from] GridError),
    #[error("Error in the `radial` module")]
    Radial(#[from] RadialError),
    #[error("Error in the `fit` module")]
    Fit(#[from] FitError),
    #[error("Error in the `detector` module")]
    Detector(#[from] DetectorError),
    #[error("Error in the `optics` module")]
    Optics(#[from] OpticsError),
    #[error("Error in the `display` module")]
    Render(#[from] RenderError),
}
