use ndarray::Axis;
use std::{error::Error, io, path::PathBuf};
use structopt::StructOpt;
use tem_optics::{
    display, CurveFolder, DetectorResponse, Metadata, Microscope, OpticalParameters, Render,
    ResponseFunction, Series,
};

#[derive(Debug, StructOpt)]
struct OpticsOpt {
    /// Pixel size [m]
    #[structopt(long, default_value = "1e-10")]
    pixel_size: f64,
    /// Defocus [m]
    #[structopt(short, long, default_value = "3e-6")]
    defocus: f64,
    /// Acceleration voltage [V]
    #[structopt(short, long, default_value = "300e3")]
    voltage: f64,
    /// Amplitude contrast fraction
    #[structopt(long, default_value = "0.1")]
    amplitude_contrast: f64,
    /// Spherical aberration [m]
    #[structopt(long, default_value = "2.7e-3")]
    spherical_aberration: f64,
    /// Gaussian decay width as a fraction of Nyquist, no decay if <= 0
    #[structopt(long, default_value = "0.4")]
    sigma_decay: f64,
}
impl From<&OpticsOpt> for OpticalParameters {
    fn from(opt: &OpticsOpt) -> Self {
        OpticalParameters::new(opt.pixel_size, opt.defocus)
            .voltage(opt.voltage)
            .amplitude_contrast(opt.amplitude_contrast)
            .spherical_aberration(opt.spherical_aberration)
            .sigma_decay(opt.sigma_decay)
    }
}

#[derive(Debug, StructOpt)]
struct ExtendedOpt {
    /// Chromatic aberration [m]
    #[structopt(long, default_value = "2.7e-3")]
    chromatic_aberration: f64,
    /// Energy spread [eV]
    #[structopt(long, default_value = "0.7")]
    energy_spread: f64,
    /// Illumination aperture [rad]
    #[structopt(long, default_value = "0.03e-3")]
    illumination_aperture: f64,
    /// Objective aperture diameter [m]
    #[structopt(long, default_value = "100e-6")]
    objective_diameter: f64,
    /// Focal length [m]
    #[structopt(long, default_value = "4.7e-3")]
    focal_length: f64,
    /// Astigmatism [m]
    #[structopt(long, default_value = "0")]
    astigmatism: f64,
    /// Astigmatism angle [degree]
    #[structopt(long, default_value = "0")]
    astigmatism_angle: f64,
    /// Aperture edge smoothing [pixel]
    #[structopt(long, default_value = "3")]
    aperture_smoothing: f64,
}
impl ExtendedOpt {
    fn apply(&self, params: OpticalParameters) -> OpticalParameters {
        params
            .chromatic_aberration(self.chromatic_aberration)
            .energy_spread(self.energy_spread)
            .illumination_aperture(self.illumination_aperture)
            .objective(self.objective_diameter, self.focal_length)
            .astigmatism(self.astigmatism, self.astigmatism_angle)
            .aperture_smoothing(self.aperture_smoothing)
    }
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Real contrast transfer function after detection
    Ctf {
        /// Image size [pixel]
        #[structopt(short, long, default_value = "128")]
        size: usize,
        /// Computes the CTF of a cubic volume
        #[structopt(long)]
        volume: bool,
        #[structopt(flatten)]
        optics: OpticsOpt,
    },
    /// Phase only complex contrast transfer function
    ComplexCtf {
        /// Image size [pixel]
        #[structopt(short, long, default_value = "128")]
        size: usize,
        #[structopt(flatten)]
        optics: OpticsOpt,
    },
    /// Complex contrast transfer function with astigmatism, envelopes and objective aperture
    ExtendedCtf {
        /// Image size [pixel]
        #[structopt(short, long, default_value = "128")]
        size: usize,
        #[structopt(flatten)]
        optics: OpticsOpt,
        #[structopt(flatten)]
        extended: ExtendedOpt,
    },
    /// Fresnel propagator
    Propagator {
        /// Image size [pixel]
        #[structopt(short, long, default_value = "128")]
        size: usize,
        /// Pixel size [m]
        #[structopt(long, default_value = "1e-10")]
        pixel_size: f64,
        /// Acceleration voltage [V]
        #[structopt(short, long, default_value = "300e3")]
        voltage: f64,
        /// Propagation distance [m]
        #[structopt(long, default_value = "1e-9")]
        distance: f64,
    },
    /// Detector response function fitted from a detector curve
    Detector {
        /// Path to the detector curves folder
        #[structopt(long, parse(from_os_str))]
        path: PathBuf,
        /// Detector name, e.g. K2SUMMIT
        name: String,
        /// Response function: DQE or MTF
        response: ResponseFunction,
        /// Image size [pixel]
        #[structopt(short, long, default_value = "128")]
        size: usize,
        /// Acceleration voltage [V]
        #[structopt(short, long, default_value = "300e3")]
        voltage: f64,
        /// Oversampling factor
        #[structopt(short, long, default_value = "1")]
        binning: usize,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "tem-optics",
    about = "Transmission electron microscope optics radial profiles"
)]
struct Opt {
    /// Radial profile chart file, PNG or SVG
    #[cfg(feature = "plot")]
    #[structopt(long, parse(from_os_str))]
    plot: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Command,
}

/// Writes the radial profiles as CSV to the standard output
fn write_profiles(series: &[Series]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(io::stdout());
    let mut header = vec!["radius".to_string()];
    header.extend(series.iter().map(|s| s.label.clone()));
    wtr.write_record(&header)?;
    if let Some(first) = series.first() {
        for (k, radius) in first.profile.radius.iter().enumerate() {
            let mut record = vec![radius.to_string()];
            record.extend(series.iter().map(|s| {
                s.profile
                    .mean
                    .get(k)
                    .map_or_else(|| "NaN".to_string(), |m| m.to_string())
            }));
            wtr.write_record(&record)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Fresnel propagator radial profiles, a render failure is only logged
fn propagator_profiles(
    microscope: &Microscope,
    renderer: Option<&dyn Render>,
    size: usize,
    pixel_size: f64,
    voltage: f64,
    distance: f64,
) -> Result<Vec<Series>, Box<dyn Error>> {
    let propagator = microscope.fresnel_propagator(size, pixel_size, voltage, distance)?;
    let series = Series::from_complex("propagator", &propagator)?;
    display::render_or_warn(
        renderer,
        || Ok(series.clone()),
        Metadata::new("propagator").description(format!("{:.1}nm", distance * 1e9)),
    );
    Ok(series)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let opt = Opt::from_args();

    #[cfg(feature = "plot")]
    let plot = opt.plot.as_ref().map(tem_optics::display::PlotRenderer::new);
    #[cfg(feature = "plot")]
    let renderer = plot.as_ref().map(|plot| plot as &dyn Render);
    #[cfg(not(feature = "plot"))]
    let renderer: Option<&dyn Render> = None;

    let microscope = match renderer {
        Some(renderer) => Microscope::default().display(renderer),
        None => Microscope::default(),
    };

    let series = match &opt.command {
        Command::Ctf {
            size,
            volume,
            optics,
        } => {
            let shape = if *volume {
                vec![*size; 3]
            } else {
                vec![*size; 2]
            };
            let ctf = microscope.create_ctf(&shape, &optics.into())?;
            if *volume {
                vec![Series::from_real("ctf", &ctf.index_axis(Axis(2), size / 2))?]
            } else {
                vec![Series::from_real("ctf", &ctf)?]
            }
        }
        Command::ComplexCtf { size, optics } => {
            let ctf = microscope.create_simple_complex_ctf(&[*size; 2], &optics.into())?;
            Series::from_complex("ctf", &ctf)?
        }
        Command::ExtendedCtf {
            size,
            optics,
            extended,
        } => {
            let params = extended.apply(optics.into());
            let ctf = microscope.create_complex_ctf(&[*size; 2], &params)?;
            Series::from_complex("ctf", &ctf)?
        }
        Command::Propagator {
            size,
            pixel_size,
            voltage,
            distance,
        } => {
            propagator_profiles(&microscope, renderer, *size, *pixel_size, *voltage, *distance)?
        }
        Command::Detector {
            path,
            name,
            response,
            size,
            voltage,
            binning,
        } => {
            let builder = DetectorResponse::new(name.as_str(), *response, *size)
                .voltage(*voltage)
                .binning(*binning);
            let builder = match renderer {
                Some(renderer) => builder.display(renderer),
                None => builder,
            };
            let response_map = builder.build(&CurveFolder::new(path))?;
            vec![Series::from_real(response.to_string(), &response_map)?]
        }
    };
    write_profiles(&series)
}
