use super::{Metadata, Render, RenderError, Result, Series};
use plotters::{coord::Shift, prelude::*};
use std::path::{Path, PathBuf};

/// Radial profiles line chart written to a PNG or SVG file
///
/// The format follows the file extension, SVG unless it is `png`.
#[derive(Debug, Clone)]
pub struct PlotRenderer {
    path: PathBuf,
    size: (u32, u32),
}
impl PlotRenderer {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            size: (768, 512),
        }
    }
    /// Sets the chart size in pixels
    pub fn size(self, width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..self
        }
    }
}
impl Render for PlotRenderer {
    fn render(&self, series: &[Series], metadata: &Metadata) -> Result<()> {
        if series.iter().all(|s| s.profile.is_empty()) {
            return Err(RenderError::Empty);
        }
        log::info!("making figure: {:?}", self.path);
        match self.path.extension().and_then(|e| e.to_str()) {
            Some("png") => draw(
                BitMapBackend::new(&self.path, self.size).into_drawing_area(),
                series,
                metadata,
            ),
            _ => draw(
                SVGBackend::new(&self.path, self.size).into_drawing_area(),
                series,
                metadata,
            ),
        }
    }
}

fn drawing<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Drawing(e.to_string())
}

fn draw<DB: DrawingBackend>(
    plot: DrawingArea<DB, Shift>,
    series: &[Series],
    metadata: &Metadata,
) -> Result<()> {
    let finite = |x: &f64| x.is_finite();
    let values = || {
        series
            .iter()
            .flat_map(|s| s.profile.mean.iter())
            .cloned()
            .filter(finite)
    };
    let y_min = values().fold(f64::INFINITY, f64::min);
    let y_max = values().fold(f64::NEG_INFINITY, f64::max);
    let x_max = series
        .iter()
        .flat_map(|s| s.profile.radius.iter())
        .cloned()
        .fold(1f64, f64::max);
    let padding = 0.05 * (y_max - y_min).abs().max(1e-3);

    plot.fill(&WHITE).map_err(drawing)?;
    let caption = match &metadata.description {
        Some(description) => format!("{} ({})", metadata.title, description),
        None => metadata.title.clone(),
    };
    let mut chart = ChartBuilder::on(&plot)
        .caption(caption, ("sans-serif", 20))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .margin(10)
        .build_cartesian_2d(0f64..x_max, y_min - padding..y_max + padding)
        .map_err(drawing)?;
    chart
        .configure_mesh()
        .x_desc("Radius [pixel]")
        .y_desc("Radial mean")
        .draw()
        .map_err(drawing)?;

    let mut colors = colorous::TABLEAU10.iter().cycle();
    for s in series {
        let Some(color) = colors.next() else {
            break;
        };
        let rgb = RGBColor(color.r, color.g, color.b);
        chart
            .draw_series(LineSeries::new(
                s.profile.iter().filter(|(_, m)| m.is_finite()),
                &rgb,
            ))
            .map_err(drawing)?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &rgb));
    }
    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(drawing)?;
    plot.present().map_err(drawing)?;
    Ok(())
}
