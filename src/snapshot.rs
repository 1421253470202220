use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Offset, Utc};
use crate::config::Station;
use crate::errors::NoDataError;
use crate::models::observation::{ActualData, MonitorData};
use crate::models::prediction::{PredictionData, PredictionPoint, PrefectureData};
use crate::models::snapshot::{DataSource, FetchMethod, Snapshot};
use crate::parsers::html_page::ScrapedValue;
use crate::wbgt_level::Band;

/// The site publishes all times in Japan Standard Time
const JST_OFFSET_SECS: i32 = 9 * 3600;

const UNIT: &str = "°C";

pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn now_jst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}

/// Typical WBGT for the season, used when no source could deliver a value
///
/// # Arguments
///
/// * 'month' - month 1-12
pub fn seasonal_default(month: u32) -> f64 {
    match month {
        6..=9   => 28.5,
        4..=5   => 22.0,
        10..=11 => 20.0,
        _       => 15.0,
    }
}

/// The value chosen as current together with where it came from
#[derive(Debug, PartialEq)]
pub struct Current {
    pub wbgt: f64,
    pub source: DataSource,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Everything fetched during one run, a source that failed is kept with available set to false
#[derive(Default)]
pub struct SourceParts {
    pub prediction: PredictionData,
    pub actual: ActualData,
    pub monitor: MonitorData,
    pub prefecture: Option<PrefectureData>,
}

/// Returns the forecast point representing now, i.e. the latest point not in the future.
/// If all points are in the future the first one is used.
///
/// # Arguments
///
/// * 'predictions' - forecast points
/// * 'now' - current time
pub fn current_prediction(predictions: &[PredictionPoint], now: DateTime<FixedOffset>) -> Option<&PredictionPoint> {
    let hour = now.with_timezone(&jst()).format("%Y%m%d%H").to_string();

    predictions
        .iter()
        .filter(|p| p.time <= hour)
        .max_by(|a, b| a.time.cmp(&b.time))
        .or_else(|| predictions.iter().min_by(|a, b| a.time.cmp(&b.time)))
}

/// Selects the current value. Measured monitor values beat estimated actual values which
/// beat forecasts, regardless of which one is more recent.
///
/// # Arguments
///
/// * 'monitor' - monitor (measured) data
/// * 'actual' - actual (estimated) data
/// * 'prediction' - forecast data
/// * 'now' - current time, used to pick the forecast point
pub fn select_current(monitor: &MonitorData, actual: &ActualData, prediction: &PredictionData, now: DateTime<FixedOffset>) -> Option<Current> {
    let observed = [(monitor.latest.as_ref(), DataSource::Monitor), (actual.latest.as_ref(), DataSource::Actual)]
        .into_iter()
        .find_map(|(o, source)| o.and_then(|o| o.wbgt.map(|wbgt| (o, wbgt, source))));

    if let Some((o, wbgt, source)) = observed {
        return Some(Current { wbgt, source, date: Some(o.date.clone()), time: Some(o.time.clone()) });
    }

    current_prediction(&prediction.predictions, now).map(|p| {
        let label = forecast_label_time(&p.time);
        Current {
            wbgt: p.wbgt,
            source: DataSource::Prediction,
            date: label.map(|t| t.format("%Y/%-m/%-d").to_string()),
            time: label.map(|t| t.format("%-H:00").to_string()),
        }
    })
}

/// Parses a YYYYMMDDHH forecast label, written the same way as the observation files
/// write their dates and times
fn forecast_label_time(label: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{}00", label), "%Y%m%d%H%M").ok()
}

/// Combines all sources into a snapshot
///
/// # Arguments
///
/// * 'station' - the station the data is for
/// * 'parts' - fetched and parsed sources
/// * 'now' - time of the run
pub fn build_snapshot(station: &Station, parts: SourceParts, now: DateTime<FixedOffset>) -> Result<Snapshot, NoDataError> {
    let current = select_current(&parts.monitor, &parts.actual, &parts.prediction, now)
        .ok_or_else(|| NoDataError("no WBGT value in monitor, actual or prediction data".to_string()))?;

    Ok(Snapshot {
        location: station.location.clone(),
        point_code: station.point_code.clone(),
        update_time: now,
        fetched_at: now,
        fetch_method: FetchMethod::Direct,
        unit: UNIT.to_string(),
        current_wbgt: Some(current.wbgt),
        data_source: current.source,
        data_date: current.date,
        data_time: current.time,
        level: Some(Band::classify(current.wbgt)),
        prediction: Some(parts.prediction),
        actual: Some(parts.actual),
        monitor: Some(parts.monitor),
        prefecture: parts.prefecture,
        error: false,
        error_message: None,
    })
}

/// Snapshot from a value scraped from the HTML page
///
/// # Arguments
///
/// * 'station' - the station the data is for
/// * 'value' - the scraped value
/// * 'now' - time of the run
pub fn scraped_snapshot(station: &Station, value: ScrapedValue, now: DateTime<FixedOffset>) -> Snapshot {
    let (data_date, data_time) = if value.timestamp_found {
        (Some(value.timestamp.format("%Y/%-m/%-d").to_string()), Some(value.timestamp.format("%-H:%M").to_string()))
    } else {
        (None, None)
    };

    Snapshot {
        location: station.location.clone(),
        point_code: station.point_code.clone(),
        update_time: value.timestamp,
        fetched_at: now,
        fetch_method: FetchMethod::Proxy,
        unit: UNIT.to_string(),
        current_wbgt: Some(value.wbgt),
        data_source: DataSource::Actual,
        data_date,
        data_time,
        level: Some(Band::classify(value.wbgt)),
        prediction: None,
        actual: None,
        monitor: None,
        prefecture: None,
        error: false,
        error_message: None,
    }
}

/// Degraded snapshot written when a run fails, carrying a seasonal default value
///
/// # Arguments
///
/// * 'station' - the station the data is for
/// * 'message' - what went wrong
/// * 'now' - time of the run
pub fn fallback_snapshot(station: &Station, message: &str, now: DateTime<FixedOffset>) -> Snapshot {
    let wbgt = seasonal_default(now.month());

    Snapshot {
        location: station.location.clone(),
        point_code: station.point_code.clone(),
        update_time: now,
        fetched_at: now,
        fetch_method: FetchMethod::Fallback,
        unit: UNIT.to_string(),
        current_wbgt: Some(wbgt),
        data_source: DataSource::Default,
        data_date: None,
        data_time: None,
        level: Some(Band::classify(wbgt)),
        prediction: None,
        actual: None,
        monitor: None,
        prefecture: None,
        error: true,
        error_message: Some(message.to_string()),
    }
}
