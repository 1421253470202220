use plotters::coord::ranged1d::SegmentValue;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use thiserror::Error;
use crate::models::prediction::PredictionPoint;
use crate::wbgt_level::Band;

const WIDTH: u32 = 720;
const HEIGHT: u32 = 260;
const MARGIN: i32 = 10;
const LABEL_AREA: i32 = 30;

/// Horizontal gap in pixels on each side of a bar
const BAR_GAP: u32 = 6;

/// Upper end of the value axis, values above are clipped
const AXIS_MAX: f64 = 35.0;

#[derive(Error, Debug)]
#[error("ChartError: {0}")]
pub struct ChartError(pub String);

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self { ChartError(e.to_string()) }
}

pub struct Bar {
    pub label: String,
    pub wbgt: f64,
    pub band: Band,
}

/// Forecast chart, one bar per forecast point colored by its band and a line over the bar tops
pub struct ForecastChart {
    bars: Vec<Bar>,
}

/// Turns YYYYMMDDHH into a short label like 24日15時
fn short_label(time: &str) -> String {
    match (time.get(6..8), time.get(8..10)) {
        (Some(day), Some(hour)) => format!("{}日{}時", day.trim_start_matches('0'), hour.trim_start_matches('0').parse::<u32>().unwrap_or(0)),
        _ => time.to_string(),
    }
}

impl ForecastChart {
    /// Builds a chart, None if there is nothing to draw
    ///
    /// # Arguments
    ///
    /// * 'predictions' - forecast points in time order
    pub fn new(predictions: &[PredictionPoint]) -> Option<ForecastChart> {
        if predictions.is_empty() {
            return None;
        }

        let bars = predictions
            .iter()
            .map(|p| Bar { label: short_label(&p.time), wbgt: p.wbgt, band: Band::classify(p.wbgt) })
            .collect();

        Some(ForecastChart { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Renders the chart as an inline SVG element
    pub fn to_svg(&self) -> Result<String, ChartError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
            let count = self.bars.len() as i32;

            let mut chart = ChartBuilder::on(&root)
                .margin(MARGIN)
                .x_label_area_size(LABEL_AREA)
                .y_label_area_size(LABEL_AREA)
                .build_cartesian_2d((0..count).into_segmented(), 0.0..AXIS_MAX)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(self.bars.len())
                .x_label_formatter(&|v: &SegmentValue<i32>| self.label_at(v))
                .y_desc("WBGT (°C)")
                .light_line_style(BLACK.mix(0.15))
                .draw()?;

            chart.draw_series(self.bars.iter().zip(0..).map(|(bar, i)| {
                let mut rect = Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), bar.wbgt.clamp(0.0, AXIS_MAX))],
                    band_color(bar.band).filled(),
                );
                rect.set_margin(0, 0, BAR_GAP, BAR_GAP);
                rect
            }))?;

            chart.draw_series(LineSeries::new(
                self.bars.iter().zip(0..).map(|(bar, i)| (SegmentValue::CenterOf(i), bar.wbgt.clamp(0.0, AXIS_MAX))),
                BLACK.stroke_width(2),
            ))?;

            root.present()?;
        }

        Ok(svg)
    }

    /// Axis label for a bar, only bar centers are labeled
    fn label_at(&self, value: &SegmentValue<i32>) -> String {
        match value {
            SegmentValue::CenterOf(i) => usize::try_from(*i)
                .ok()
                .and_then(|i| self.bars.get(i))
                .map(|b| b.label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

/// Chart fill for a band, taken from the band's hex color
fn band_color(band: Band) -> RGBColor {
    let hex = band.hex().trim_start_matches('#');
    let channel = |at: usize| hex.get(at..at + 2)
        .and_then(|c| u8::from_str_radix(c, 16).ok())
        .unwrap_or(0);

    RGBColor(channel(0), channel(2), channel(4))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(time: &str, wbgt: f64) -> PredictionPoint {
        PredictionPoint { time: time.to_string(), wbgt }
    }

    #[test]
    fn no_points_no_chart() {
        assert!(ForecastChart::new(&[]).is_none());
    }

    #[test]
    fn bars_are_colored_per_point() {
        let chart = ForecastChart::new(&[point("2024062409", 20.5), point("2024062412", 21.0), point("2024062415", 31.0)]).unwrap();
        let bands: Vec<Band> = chart.bars().iter().map(|b| b.band).collect();

        assert_eq!(bands, vec![Band::Safe, Band::Caution, Band::Extreme]);
        assert_eq!(chart.bars()[0].label, "24日9時");
    }

    #[test]
    fn band_colors_follow_hex() {
        assert_eq!(band_color(Band::Safe), RGBColor(0x21, 0x8c, 0xff));
        assert_eq!(band_color(Band::Extreme), RGBColor(0xff, 0x28, 0x00));
    }

    #[test]
    fn svg_has_bars_in_band_colors_and_line() {
        let chart = ForecastChart::new(&[point("2024062412", 22.0), point("2024062415", 28.5)]).unwrap();
        let svg = chart.to_svg().unwrap().to_lowercase();

        assert!(svg.contains("<svg"));
        assert!(svg.contains("<rect"));
        assert!(svg.contains(Band::Caution.hex()));
        assert!(svg.contains(Band::Danger.hex()));
        assert!(!svg.contains(Band::Extreme.hex()));
        assert!(svg.contains("<polyline"));
    }
}
