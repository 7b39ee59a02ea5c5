//! Detector response functions
//!
//! Empirical detector curves (DQE or MTF versus the fraction of the Nyquist
//! frequency) are fitted with the sinc-squared model and evaluated over a 2D
//! frequency grid.
//!
//! The curves are stored as header-less, comma separated, 2 columns CSV files
//! named `{detector}_{response}_{kV}kV.csv`, e.g. `K2SUMMIT_DQE_300kV.csv`.

use crate::{
    display::{self, Metadata, Render, Series},
    fit::{self, FitError, SincSquareFit, SincSquareParams},
    frequency::{self, GridError},
};
use ndarray::{s, Array2};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};
use strum_macros::{Display, EnumString};

#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("no detector curve found at {0:?}")]
    MissingCurve(PathBuf),
    #[error("failed to read the detector curve")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize the detector curve CSV file")]
    Csv(#[from] csv::Error),
    #[error("the image size must be strictly positive")]
    ImageSize,
    #[error("the binning factor must be strictly positive")]
    Binning,
    #[error("failed to fit the detector curve")]
    Fit(#[from] FitError),
    #[error("failed to build the frequency grid")]
    Grid(#[from] GridError),
}
pub type Result<T> = std::result::Result<T, DetectorError>;

/// Detector response function type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ResponseFunction {
    /// Detective quantum efficiency
    #[strum(serialize = "DQE", ascii_case_insensitive)]
    Dqe,
    /// Modulation transfer function
    #[strum(serialize = "MTF", ascii_case_insensitive)]
    Mtf,
}

/// Detector response samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorCurve {
    /// spatial frequency as a fraction of Nyquist
    pub frequency: Vec<f64>,
    /// response value
    pub response: Vec<f64>,
}
impl DetectorCurve {
    /// Reads a header-less (frequency,response) CSV table
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut this = Self::default();
        for result in rdr.deserialize() {
            let (frequency, response): (f64, f64) = result?;
            this.frequency.push(frequency);
            this.response.push(response);
        }
        Ok(this)
    }
    /// Loads a header-less (frequency,response) CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DetectorError::MissingCurve(path.to_path_buf()));
        }
        log::info!("Loading {:?}...", path);
        Self::from_reader(File::open(path)?)
    }
    pub fn len(&self) -> usize {
        self.frequency.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }
    /// Fits the sinc-squared model to the curve
    pub fn fit(&self) -> Result<SincSquareFit> {
        Ok(fit::fit_sinc_square(&self.frequency, &self.response)?)
    }
}

/// Detector curves storage
pub trait CurveSource {
    /// Returns the curve of a `detector` response function at a given `voltage` [V]
    fn load_curve(
        &self,
        detector: &str,
        response: ResponseFunction,
        voltage: f64,
    ) -> Result<DetectorCurve>;
}

/// Folder of detector curve CSV files
#[derive(Debug, Clone, Default)]
pub struct CurveFolder {
    path: PathBuf,
}
impl CurveFolder {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
    /// Detector curve file name: `{detector}_{response}_{kV}kV.csv`
    pub fn file_name(detector: &str, response: ResponseFunction, voltage: f64) -> String {
        format!("{}_{}_{}kV.csv", detector, response, (voltage * 1e-3) as i64)
    }
    /// Detector curve file path
    pub fn curve_path(&self, detector: &str, response: ResponseFunction, voltage: f64) -> PathBuf {
        self.path.join(Self::file_name(detector, response, voltage))
    }
}
impl CurveSource for CurveFolder {
    fn load_curve(
        &self,
        detector: &str,
        response: ResponseFunction,
        voltage: f64,
    ) -> Result<DetectorCurve> {
        DetectorCurve::from_path(self.curve_path(detector, response, voltage))
    }
}

/// Detector response map builder
pub struct DetectorResponse<'a> {
    detector: String,
    response: ResponseFunction,
    image_size: usize,
    voltage: f64,
    binning: usize,
    renderer: Option<&'a dyn Render>,
}
impl<'a> DetectorResponse<'a> {
    /// Creates a new builder for a `detector` response function over `image_size`x`image_size` images
    ///
    /// The voltage defaults to 300kV and the binning to 1.
    pub fn new<S: Into<String>>(detector: S, response: ResponseFunction, image_size: usize) -> Self {
        Self {
            detector: detector.into(),
            response,
            image_size,
            voltage: 300e3,
            binning: 1,
            renderer: None,
        }
    }
    /// Sets the acceleration voltage [V]
    pub fn voltage(self, voltage: f64) -> Self {
        Self { voltage, ..self }
    }
    /// Sets the oversampling factor
    pub fn binning(self, binning: usize) -> Self {
        Self { binning, ..self }
    }
    /// Renders the radial profile of the response map
    pub fn display(self, renderer: &'a dyn Render) -> Self {
        Self {
            renderer: Some(renderer),
            ..self
        }
    }
    /// Loads, fits and evaluates the detector response function
    pub fn build<C: CurveSource + ?Sized>(&self, source: &C) -> Result<Array2<f64>> {
        log::info!("Determining {} for {}", self.response, self.detector);
        let curve = source.load_curve(&self.detector, self.response, self.voltage)?;
        let fit = curve.fit()?;
        let response_map = evaluate(&fit.params, self.image_size, self.binning)?;
        display::render_or_warn(
            self.renderer,
            || Series::from_real(self.response.to_string(), &response_map).map(|s| vec![s]),
            Metadata::new(self.response.to_string())
                .description(format!("{} @ {}kV", self.detector, self.voltage * 1e-3)),
        );
        Ok(response_map)
    }
}

/// Evaluates the sinc-squared model over a `image_size`x`image_size` frequency grid
///
/// The grid is oversampled `binning` times then cropped back to `image_size`.
pub fn evaluate(params: &SincSquareParams, image_size: usize, binning: usize) -> Result<Array2<f64>> {
    if image_size == 0 {
        return Err(DetectorError::ImageSize);
    }
    if binning == 0 {
        return Err(DetectorError::Binning);
    }
    let sampling_size = image_size * binning;
    // the curve abscissa is already a fraction of Nyquist
    let k = frequency::fourier_array_2d(sampling_size, 1.)?;
    let response_map = k.mapv(|k| params.evaluate(k));
    if binning == 1 {
        return Ok(response_map);
    }
    let cut = (sampling_size - image_size) / 2;
    Ok(response_map
        .slice(s![cut..cut + image_size, cut..cut + image_size])
        .to_owned())
}
