//! Detector curves batch fit
//!
//! Fits the sinc-squared model to every detector curve CSV file of a folder
//! and writes the fitted parameters into a CSV summary.

use anyhow::Context;
use glob::glob;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use tem_optics::{DetectorCurve, SincSquareFit};

#[derive(Debug, StructOpt)]
#[structopt(name = "detector-fit", about = "Sinc-squared fit of detector curves")]
struct Opt {
    /// Path to the detector curves folder
    #[structopt(parse(from_os_str))]
    path: PathBuf,
    /// Summary CSV file
    #[structopt(short, long, default_value = "detector-fit.csv", parse(from_os_str))]
    output: PathBuf,
}

#[derive(Debug, Serialize)]
struct Record {
    curve: String,
    samples: usize,
    amplitude: f64,
    center: f64,
    width: f64,
    offset: f64,
    residual_sum_of_squares: f64,
}
impl Record {
    fn new(path: &Path, samples: usize, fit: SincSquareFit) -> Self {
        let SincSquareFit {
            params,
            residual_sum_of_squares,
        } = fit;
        Self {
            curve: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            samples,
            amplitude: params.amplitude,
            center: params.center,
            width: params.width,
            offset: params.offset,
            residual_sum_of_squares,
        }
    }
}

fn fit(path: &Path) -> anyhow::Result<Record> {
    let curve = DetectorCurve::from_path(path)?;
    let fit = curve
        .fit()
        .with_context(|| format!("failed to fit {:?}", path))?;
    Ok(Record::new(path, curve.len(), fit))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let pattern = opt.path.join("*.csv");
    let files: Vec<PathBuf> = glob(pattern.to_str().context("invalid UTF-8 folder path")?)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|path| *path != opt.output)
        .collect();
    println!("Found {} detector curves", files.len());

    let pb = ProgressBar::new(files.len() as u64);
    let records: Vec<_> = files
        .par_iter()
        .progress_with(pb)
        .map(|path| fit(path))
        .collect();

    let mut wtr = csv::Writer::from_path(&opt.output)?;
    let mut n_failed = 0;
    for record in records {
        match record {
            Ok(record) => wtr.serialize(record)?,
            Err(e) => {
                n_failed += 1;
                log::warn!("{:?}", e);
            }
        }
    }
    wtr.flush()?;
    println!(
        "Fitted {} curves ({} failed), summary written to {:?}",
        files.len() - n_failed,
        n_failed,
        opt.output
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tem_optics::SincSquareParams;

    #[test]
    fn fits_a_curve_file() {
        let params = SincSquareParams::from([1.1, 1.2, 0.8, 0.05]);
        let csv: String = (0..50)
            .map(|i| {
                let x = i as f64 / 49.;
                format!("{},{}\n", x, params.evaluate(x))
            })
            .collect();
        let folder = std::env::temp_dir().join("detector-fit-test");
        fs::create_dir_all(&folder).unwrap();
        let path = folder.join("FALCON_MTF_200kV.csv");
        fs::write(&path, csv).unwrap();

        let record = fit(&path).unwrap();
        assert_eq!(record.curve, "FALCON_MTF_200kV");
        assert_eq!(record.samples, 50);
        assert!((record.amplitude - 1.1).abs() < 1e-3);
        assert!((record.center - 1.2).abs() < 1e-3);
        assert!((record.width.abs() - 0.8).abs() < 1e-3);
        assert!((record.offset - 0.05).abs() < 1e-4);
        assert!(record.residual_sum_of_squares < 1e-12);
    }

    #[test]
    fn missing_curve() {
        assert!(fit(Path::new("no/such/curve.csv")).is_err());
    }
}
