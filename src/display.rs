//! Diagnostic rendering of frequency domain functions
//!
//! Computations never depend on a renderer: it is an optional collaborator
//! that receives radial profiles once a map has been computed.

use crate::radial::{self, RadialError, RadialProfile};
use ndarray::{ArrayBase, Data, Dimension};
use num_complex::Complex64;

#[cfg(feature = "plot")]
mod plot;
#[cfg(feature = "plot")]
pub use plot::PlotRenderer;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to compute the radial profile")]
    Radial(#[from] RadialError),
    #[error("nothing to render")]
    Empty,
    #[error("failed to draw the chart: {0}")]
    Drawing(String),
}
pub type Result<T> = std::result::Result<T, RenderError>;

/// Labelled radial profile
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub profile: RadialProfile,
}
impl Series {
    pub fn new<S: Into<String>>(label: S, profile: RadialProfile) -> Self {
        Self {
            label: label.into(),
            profile,
        }
    }
    /// Radial profile of a real 2D map
    pub fn from_real<S, D>(label: impl Into<String>, map: &ArrayBase<S, D>) -> Result<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Ok(Self::new(label, radial::radial_average(map)?))
    }
    /// Radial profiles of the real and imaginary parts of a complex 2D map
    pub fn from_complex<S, D>(label: impl Into<String>, map: &ArrayBase<S, D>) -> Result<Vec<Self>>
    where
        S: Data<Elem = Complex64>,
        D: Dimension,
    {
        Ok(vec![
            Self::new(label, radial::radial_average(&map.mapv(|z| z.re))?),
            Self::new("imaginary", radial::radial_average(&map.mapv(|z| z.im))?),
        ])
    }
}

/// Chart description
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub description: Option<String>,
}
impl Metadata {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }
    pub fn description<S: Into<String>>(self, description: S) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }
}

/// Radial profiles renderer
pub trait Render {
    fn render(&self, series: &[Series], metadata: &Metadata) -> Result<()>;
}

/// Renders the profiles returned by `series`, logging rather than propagating any failure
///
/// `series` is only called if a renderer is given.
pub fn render_or_warn<F>(renderer: Option<&dyn Render>, series: F, metadata: Metadata)
where
    F: FnOnce() -> Result<Vec<Series>>,
{
    let Some(renderer) = renderer else {
        return;
    };
    if let Err(e) = series().and_then(|series| renderer.render(&series, &metadata)) {
        log::warn!("failed to render {}: {}", metadata.title, e);
    }
}
